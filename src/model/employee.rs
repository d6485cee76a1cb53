use serde::{Deserialize, Serialize};

use super::assignee::Assignee;

/// A staff record from the employee list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// The id assignees carry for this employee: `employee_id`, else the
    /// document id, else the login user id.
    pub fn assignee_id(&self) -> &str {
        self.employee_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or(self.user_id.as_str())
    }

    pub fn to_assignee(&self) -> Assignee {
        Assignee::employee(self.assignee_id(), self.full_name())
    }

    /// Case-insensitive substring match on first name, last name, or email
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        [&self.first_name, &self.last_name, &self.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&q))
    }
}
