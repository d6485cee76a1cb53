use async_trait::async_trait;

use super::client::{RestClient, member_path};
use super::decode::{decode_list, decode_record};
use super::error::ApiResult;
use super::{Directory, Resource, Timesheet};
use crate::model::record::Record;
use crate::model::{Assignee, Employee, Task, TaskFilter, TaskTemplate, TimeEntryDraft};

const TEMPLATE_LIST_KEYS: &[&str] = &["templates", "task_templates"];
const TEMPLATE_KEYS: &[&str] = &["template", "task_template"];
const TASK_LIST_KEYS: &[&str] = &["tasks"];
const TASK_KEYS: &[&str] = &["task"];

/// Task templates at `{task_templates}`
#[derive(Clone)]
pub struct TemplateResource {
    client: RestClient,
}

impl TemplateResource {
    pub fn new(client: RestClient) -> Self {
        TemplateResource { client }
    }

    fn collection(&self) -> &str {
        &self.client.endpoints().task_templates
    }
}

#[async_trait]
impl Resource for TemplateResource {
    type Record = TaskTemplate;

    async fn fetch_all(&self) -> ApiResult<Vec<TaskTemplate>> {
        let value = self.client.get(self.collection(), &[]).await?;
        decode_list(value, TEMPLATE_LIST_KEYS)
    }

    async fn create(&self, draft: &TaskTemplate) -> ApiResult<TaskTemplate> {
        let value = self.client.post(self.collection(), draft).await?;
        decode_record(value, TEMPLATE_KEYS, draft)
    }

    async fn update(&self, id: &str, record: &TaskTemplate) -> ApiResult<TaskTemplate> {
        let value = self
            .client
            .put(&member_path(self.collection(), id), record)
            .await?;
        decode_record(value, TEMPLATE_KEYS, record)
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .delete(&member_path(self.collection(), id))
            .await?;
        Ok(())
    }

    /// Server-side copy via `POST {task_templates}/{id}/duplicate`
    async fn duplicate(&self, id: &str, source: &TaskTemplate) -> ApiResult<TaskTemplate> {
        let path = format!("{}/duplicate", member_path(self.collection(), id));
        let value = self.client.post_empty(&path).await?;
        decode_record(value, TEMPLATE_KEYS, &source.without_id())
    }
}

/// Tasks at `{tasks}`, listed through a server-side filter
#[derive(Clone)]
pub struct TaskResource {
    client: RestClient,
    filter: TaskFilter,
}

impl TaskResource {
    pub fn new(client: RestClient, filter: TaskFilter) -> Self {
        TaskResource { client, filter }
    }

    fn collection(&self) -> &str {
        &self.client.endpoints().tasks
    }
}

#[async_trait]
impl Resource for TaskResource {
    type Record = Task;

    async fn fetch_all(&self) -> ApiResult<Vec<Task>> {
        let query: Vec<(&str, &str)> = self
            .filter
            .query_value()
            .map(|v| vec![("filter_type", v)])
            .unwrap_or_default();
        let value = self.client.get(self.collection(), &query).await?;
        decode_list(value, TASK_LIST_KEYS)
    }

    async fn create(&self, draft: &Task) -> ApiResult<Task> {
        let value = self.client.post(self.collection(), draft).await?;
        decode_record(value, TASK_KEYS, draft)
    }

    async fn update(&self, id: &str, record: &Task) -> ApiResult<Task> {
        let value = self
            .client
            .put(&member_path(self.collection(), id), record)
            .await?;
        decode_record(value, TASK_KEYS, record)
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .delete(&member_path(self.collection(), id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Directory for RestClient {
    async fn search_assignees(&self, query: &str) -> ApiResult<Vec<Assignee>> {
        let path = format!("{}/search_assignees", self.endpoints().tasks.trim_end_matches('/'));
        let value = self.get(&path, &[("query", query)]).await?;
        decode_list(value, &["assignees"])
    }

    async fn list_employees(&self) -> ApiResult<Vec<Employee>> {
        let value = self.get(&self.endpoints().employees, &[]).await?;
        decode_list(value, &["employees"])
    }
}

#[async_trait]
impl Timesheet for RestClient {
    async fn create_entry(&self, entry: &TimeEntryDraft) -> ApiResult<()> {
        self.post(&self.endpoints().timesheet_entries, entry).await?;
        Ok(())
    }
}
