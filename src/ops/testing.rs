//! In-memory stand-ins for the backend seams, shared by the ops tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::{ApiError, ApiResult, Directory, Resource, Timesheet};
use crate::model::record::Record;
use crate::model::{Assignee, Employee, TaskTemplate, TimeEntryDraft};

#[derive(Debug)]
pub struct FakeState<T> {
    pub records: Vec<T>,
    pub next_id: u32,
    pub fetches: usize,
    pub creates: Vec<T>,
    pub updates: Vec<(String, T)>,
    pub deletes: Vec<String>,
    /// Creates whose title is in this set fail with a 500
    pub fail_titles: HashSet<String>,
    /// Updates and deletes on these ids fail with a 403
    pub forbidden_ids: HashSet<String>,
    pub fail_fetch: bool,
}

/// A resource backed by a vector. Clones share state, so a test can keep a
/// handle for inspection after moving one into a synchronizer.
#[derive(Clone)]
pub struct FakeResource<T> {
    pub state: Arc<Mutex<FakeState<T>>>,
}

impl<T: Record> FakeResource<T> {
    pub fn with(records: Vec<T>) -> Self {
        FakeResource {
            state: Arc::new(Mutex::new(FakeState {
                records,
                next_id: 1,
                fetches: 0,
                creates: Vec::new(),
                updates: Vec::new(),
                deletes: Vec::new(),
                fail_titles: HashSet::new(),
                forbidden_ids: HashSet::new(),
                fail_fetch: false,
            })),
        }
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    pub fn fail_create_of(&self, title: &str) {
        self.state.lock().unwrap().fail_titles.insert(title.to_string());
    }

    pub fn forbid(&self, id: &str) {
        self.state.lock().unwrap().forbidden_ids.insert(id.to_string());
    }

    /// Change a stored record behind the client's back (another user's edit)
    pub fn server_edit(&self, id: &str, f: impl FnOnce(&mut T)) {
        let mut state = self.state.lock().unwrap();
        if let Some(rec) = state.records.iter_mut().find(|r| r.id() == Some(id)) {
            f(rec);
        }
    }
}

fn server_error(msg: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        detail: msg.to_string(),
    }
}

#[async_trait]
impl<T: Record> Resource for FakeResource<T> {
    type Record = T;

    async fn fetch_all(&self) -> ApiResult<Vec<T>> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        if state.fail_fetch {
            return Err(server_error("fetch failed"));
        }
        Ok(state.records.clone())
    }

    async fn create(&self, draft: &T) -> ApiResult<T> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(draft.clone());
        if state.fail_titles.contains(draft.title()) {
            return Err(server_error("insert failed"));
        }
        let mut rec = draft.clone();
        rec.set_id(Some(format!("new-{}", state.next_id)));
        state.next_id += 1;
        state.records.push(rec.clone());
        Ok(rec)
    }

    async fn update(&self, id: &str, record: &T) -> ApiResult<T> {
        let mut state = self.state.lock().unwrap();
        if state.forbidden_ids.contains(id) {
            return Err(ApiError::Forbidden("not allowed".into()));
        }
        state.updates.push((id.to_string(), record.clone()));
        let slot = state
            .records
            .iter_mut()
            .find(|r| r.id() == Some(id))
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        let mut stored = record.clone();
        stored.set_id(Some(id.to_string()));
        *slot = stored.clone();
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.forbidden_ids.contains(id) {
            return Err(ApiError::Forbidden("not allowed".into()));
        }
        state.deletes.push(id.to_string());
        let before = state.records.len();
        state.records.retain(|r| r.id() != Some(id));
        if state.records.len() == before {
            return Err(ApiError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeDirectory {
    pub assignees: Vec<Assignee>,
    pub employees: Vec<Employee>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeDirectory {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn search_assignees(&self, query: &str) -> ApiResult<Vec<Assignee>> {
        self.calls.lock().unwrap().push(query.to_string());
        let q = query.to_lowercase();
        Ok(self
            .assignees
            .iter()
            .filter(|a| a.name.to_lowercase().contains(&q))
            .cloned()
            .collect())
    }

    async fn list_employees(&self) -> ApiResult<Vec<Employee>> {
        self.calls.lock().unwrap().push("<employees>".to_string());
        Ok(self.employees.clone())
    }
}

#[derive(Clone, Default)]
pub struct FakeTimesheet {
    pub entries: Arc<Mutex<Vec<TimeEntryDraft>>>,
    pub fail: bool,
}

#[async_trait]
impl Timesheet for FakeTimesheet {
    async fn create_entry(&self, entry: &TimeEntryDraft) -> ApiResult<()> {
        if self.fail {
            return Err(server_error("timesheet unavailable"));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

pub fn template(id: &str, title: &str, assignees: Vec<Assignee>) -> TaskTemplate {
    TaskTemplate {
        id: Some(id.to_string()),
        title: title.to_string(),
        description: format!("{} description", title),
        job_type: "editing".to_string(),
        assignees,
        ..Default::default()
    }
}
