use std::sync::Arc;

use crate::model::config::ApiConfig;

/// Supplies the bearer token issued by the identity provider
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A token fixed at startup
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// A token read from an environment variable on every request, so a
/// refreshed token is picked up without restarting
pub struct EnvToken {
    pub var: String,
}

impl TokenSource for EnvToken {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// Token source from config: an explicit `token` wins over `token_env`
pub fn token_source(api: &ApiConfig) -> Arc<dyn TokenSource> {
    match api.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Arc::new(StaticToken(token.to_string())),
        _ => Arc::new(EnvToken {
            var: api.token_env.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_token_wins() {
        let api = ApiConfig {
            token: Some(" abc ".into()),
            ..Default::default()
        };
        assert_eq!(token_source(&api).bearer_token().as_deref(), Some("abc"));
    }

    #[test]
    fn blank_token_falls_back_to_env_var() {
        let api = ApiConfig {
            token: Some("  ".into()),
            token_env: "TASKDESK_TEST_TOKEN_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        assert!(token_source(&api).bearer_token().is_none());
    }
}
