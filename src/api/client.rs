use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::auth::{TokenSource, token_source};
use super::error::{ApiError, ApiResult, error_detail};
use crate::model::config::{ApiConfig, Config, EndpointConfig};

/// Thin JSON-over-HTTP client for the dashboard backend.
///
/// Every request carries the bearer token when one is available. Bodies are
/// returned as raw `serde_json::Value`; typed decoding happens in the
/// resource layer.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    endpoints: EndpointConfig,
    token: Arc<dyn TokenSource>,
}

impl RestClient {
    pub fn new(
        api: &ApiConfig,
        endpoints: EndpointConfig,
        token: Arc<dyn TokenSource>,
    ) -> ApiResult<Self> {
        let base_url = api.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(api.base_url.clone()));
        }

        let mut builder = Client::builder();
        if let Some(secs) = api.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        Ok(RestClient {
            http,
            base_url,
            endpoints,
            token,
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(
            &config.api,
            config.endpoints.clone(),
            token_source(&config.api),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    /// Absolute URL for an endpoint path
    pub fn url(&self, path: &str) -> String {
        let path = path.trim();
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<Value> {
        self.execute(Method::GET, path, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    /// POST without a request body (action endpoints like `/duplicate`)
    pub async fn post_empty(&self, path: &str) -> ApiResult<Value> {
        self.execute(Method::POST, path, &[], None).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.execute(Method::DELETE, path, &[], None).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> ApiResult<Value> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(token) = self.token.bearer_token() {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        tracing::debug!(%method, path, "api request");
        let response = request.send().await.map_err(|e| {
            tracing::error!(%method, path, error = %e, "api request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(%method, path, status = status.as_u16(), "api response");

        match status {
            StatusCode::FORBIDDEN => {
                let detail = error_detail(&text);
                tracing::warn!(%method, path, detail = %detail, "permission denied");
                Err(ApiError::Forbidden(detail))
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(error_detail(&text))),
            s if !s.is_success() => {
                let detail = error_detail(&text);
                tracing::error!(%method, path, status = s.as_u16(), detail = %detail, "api error status");
                Err(ApiError::Status {
                    status: s.as_u16(),
                    detail,
                })
            }
            _ if text.trim().is_empty() => Ok(Value::Null),
            _ => Ok(serde_json::from_str(&text)?),
        }
    }
}

/// Join a collection path and a record id: `/tasks/templates` + `t1`
pub fn member_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection.trim_end_matches('/'), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::StaticToken;

    fn client(base: &str) -> ApiResult<RestClient> {
        let api = ApiConfig {
            base_url: base.to_string(),
            ..Default::default()
        };
        RestClient::new(
            &api,
            EndpointConfig::default(),
            Arc::new(StaticToken("t".into())),
        )
    }

    #[test]
    fn url_joins_without_double_slash() {
        let c = client("https://ops.example.com/api/").unwrap();
        assert_eq!(c.base_url(), "https://ops.example.com/api");
        assert_eq!(c.url("/tasks"), "https://ops.example.com/api/tasks");
        assert_eq!(c.url("tasks"), "https://ops.example.com/api/tasks");
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(matches!(
            client("ops.example.com"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn member_paths() {
        assert_eq!(member_path("/tasks/templates", "t1"), "/tasks/templates/t1");
        assert_eq!(member_path("/employees/", "e1"), "/employees/e1");
    }
}
