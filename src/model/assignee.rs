use serde::{Deserialize, Serialize};

/// Whether an assignee is a staff member or a client account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssigneeKind {
    Employee,
    Client,
}

impl AssigneeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssigneeKind::Employee => "employee",
            AssigneeKind::Client => "client",
        }
    }

    pub fn parse(s: &str) -> Option<AssigneeKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" | "emp" | "e" => Some(AssigneeKind::Employee),
            "client" | "c" => Some(AssigneeKind::Client),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssigneeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An employee or client attached to a template or task.
///
/// Records hold a snapshot of the assignee at attach time; renaming the
/// underlying employee or client does not update existing attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssigneeKind,
    /// Mirror of `id` when `kind` is client (filled by the server)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Mirror of `id` when `kind` is employee (filled by the server)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

impl Assignee {
    pub fn new(kind: AssigneeKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let (client_id, employee_id) = match kind {
            AssigneeKind::Client => (Some(id.clone()), None),
            AssigneeKind::Employee => (None, Some(id.clone())),
        };
        Assignee {
            id,
            name: name.into(),
            kind,
            client_id,
            employee_id,
        }
    }

    pub fn employee(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(AssigneeKind::Employee, id, name)
    }

    pub fn client(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(AssigneeKind::Client, id, name)
    }

    pub fn is_client(&self) -> bool {
        self.kind == AssigneeKind::Client
    }

    /// Display name, falling back to the id when the server sent a blank name
    pub fn display_name(&self) -> &str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() { &self.id } else { trimmed }
    }
}

/// The first client-type assignee in the list, if any
pub fn anchor_client(assignees: &[Assignee]) -> Option<&Assignee> {
    assignees.iter().find(|a| a.is_client())
}

/// Parse a `kind:id:name` triple as used on the command line
/// (e.g. `client:c-104:Acme Corp`). The name may contain colons.
impl std::str::FromStr for Assignee {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let kind = parts.next().unwrap_or_default();
        let id = parts.next().unwrap_or_default().trim();
        let name = parts.next().unwrap_or_default().trim();
        let kind = AssigneeKind::parse(kind)
            .ok_or_else(|| format!("invalid assignee kind '{}' (expected employee or client)", kind))?;
        if id.is_empty() {
            return Err(format!("missing assignee id in '{}' (expected KIND:ID:NAME)", s));
        }
        Ok(Assignee::new(kind, id, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_server_shape() {
        let a: Assignee = serde_json::from_str(
            r#"{"id":"c1","name":"Acme","type":"client","client_id":"c1","employee_id":null}"#,
        )
        .unwrap();
        assert_eq!(a.kind, AssigneeKind::Client);
        assert_eq!(a.client_id.as_deref(), Some("c1"));
        assert!(a.employee_id.is_none());
    }

    #[test]
    fn constructor_mirrors_id_by_kind() {
        let e = Assignee::employee("e7", "Dana Reyes");
        assert_eq!(e.employee_id.as_deref(), Some("e7"));
        assert!(e.client_id.is_none());
        let c = Assignee::client("c1", "Acme");
        assert_eq!(c.client_id.as_deref(), Some("c1"));
    }

    #[test]
    fn parse_cli_triple() {
        let a: Assignee = "client:c-104:Acme: East".parse().unwrap();
        assert_eq!(a.kind, AssigneeKind::Client);
        assert_eq!(a.id, "c-104");
        assert_eq!(a.name, "Acme: East");

        assert!("robot:1:x".parse::<Assignee>().is_err());
        assert!("employee::Dana".parse::<Assignee>().is_err());
    }

    #[test]
    fn anchor_is_first_client() {
        let list = vec![
            Assignee::employee("e1", "Dana"),
            Assignee::client("c1", "Acme"),
            Assignee::client("c2", "Globex"),
        ];
        assert_eq!(anchor_client(&list).map(|a| a.id.as_str()), Some("c1"));
        assert!(anchor_client(&list[..1]).is_none());
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let a = Assignee::client("c9", "  ");
        assert_eq!(a.display_name(), "c9");
    }
}
