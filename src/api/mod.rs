pub mod auth;
pub mod client;
pub mod decode;
pub mod error;
pub mod resources;

use async_trait::async_trait;

use crate::model::record::Record;
use crate::model::{Assignee, Employee, TimeEntryDraft};

pub use auth::{EnvToken, StaticToken, TokenSource, token_source};
pub use client::RestClient;
pub use error::{ApiError, ApiResult};
pub use resources::{TaskResource, TemplateResource};

/// CRUD access to one kind of server record.
///
/// The synchronizer is generic over this trait so templates and tasks share
/// one implementation of fetch/mutate/refetch.
#[async_trait]
pub trait Resource: Send + Sync {
    type Record: Record;

    async fn fetch_all(&self) -> ApiResult<Vec<Self::Record>>;
    async fn create(&self, draft: &Self::Record) -> ApiResult<Self::Record>;
    async fn update(&self, id: &str, record: &Self::Record) -> ApiResult<Self::Record>;
    async fn delete(&self, id: &str) -> ApiResult<()>;

    /// Copy a record. Without a server-side duplicate endpoint this creates
    /// `source` again with its id stripped.
    async fn duplicate(&self, _id: &str, source: &Self::Record) -> ApiResult<Self::Record> {
        self.create(&source.without_id()).await
    }
}

/// The employee/client directory
#[async_trait]
pub trait Directory: Send + Sync {
    /// Server-side partial-text search across employees and clients
    async fn search_assignees(&self, query: &str) -> ApiResult<Vec<Assignee>>;
    async fn list_employees(&self) -> ApiResult<Vec<Employee>>;
}

#[async_trait]
pub trait Timesheet: Send + Sync {
    async fn create_entry(&self, entry: &TimeEntryDraft) -> ApiResult<()>;
}
