use crate::api::{ApiError, ApiResult, Resource};
use crate::model::record::{Activatable, Record};

/// Error type for synchronized record operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{kind} not found: {id}")]
    NotLoaded { kind: &'static str, id: String },
    #[error("{kind} has no id")]
    MissingId { kind: &'static str },
}

impl SyncError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, SyncError::Api(e) if e.is_permission_denied())
    }
}

/// Local mirror of one server collection.
///
/// The server is the source of truth: every successful mutation is followed
/// by a full refetch, and the mutation's own response is never merged into
/// the mirror. A failed mutation leaves the mirror untouched.
pub struct Synchronizer<R: Resource> {
    resource: R,
    records: Vec<R::Record>,
    loaded: bool,
}

// A copy shares the resource handle but owns its mirror, so a request can
// run against it and hand it back.
impl<R: Resource + Clone> Clone for Synchronizer<R> {
    fn clone(&self) -> Self {
        Synchronizer {
            resource: self.resource.clone(),
            records: self.records.clone(),
            loaded: self.loaded,
        }
    }
}

impl<R: Resource> Synchronizer<R> {
    pub fn new(resource: R) -> Self {
        Synchronizer {
            resource,
            records: Vec::new(),
            loaded: false,
        }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn records(&self) -> &[R::Record] {
        &self.records
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Fill the mirror without a fetch, for board tests
    #[cfg(test)]
    pub(crate) fn seed(&mut self, records: Vec<R::Record>) {
        self.records = records;
        self.loaded = true;
    }

    pub fn find(&self, id: &str) -> Option<&R::Record> {
        self.records.iter().find(|r| r.id() == Some(id))
    }

    /// Look up a mirrored record, failing when it is not present
    pub fn get(&self, id: &str) -> Result<&R::Record, SyncError> {
        self.find(id).ok_or_else(|| SyncError::NotLoaded {
            kind: R::Record::KIND,
            id: id.to_string(),
        })
    }

    /// Replace the mirror with the server's current collection
    pub async fn refresh(&mut self) -> Result<&[R::Record], SyncError> {
        let kind = R::Record::KIND;
        let records = self.resource.fetch_all().await.map_err(|e| {
            tracing::error!(kind, error = %e, "fetch failed");
            SyncError::from(e)
        })?;
        tracing::debug!(kind, count = records.len(), "records refreshed");
        self.records = records;
        self.loaded = true;
        Ok(&self.records)
    }

    pub async fn create(&mut self, draft: &R::Record) -> Result<R::Record, SyncError> {
        let result = self.resource.create(draft).await;
        self.settle("create", draft.title(), result).await
    }

    pub async fn update(&mut self, id: &str, record: &R::Record) -> Result<R::Record, SyncError> {
        let result = self.resource.update(id, record).await;
        self.settle("update", id, result).await
    }

    /// Apply `edit` to the mirrored copy of `id` and send the full result
    pub async fn update_with(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut R::Record),
    ) -> Result<R::Record, SyncError> {
        let mut record = self.get(id)?.clone();
        edit(&mut record);
        self.update(id, &record).await
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), SyncError> {
        let result = self.resource.delete(id).await;
        self.settle("delete", id, result).await
    }

    pub async fn duplicate(&mut self, id: &str) -> Result<R::Record, SyncError> {
        let source = self.get(id)?.clone();
        let result = self.resource.duplicate(id, &source).await;
        self.settle("duplicate", id, result).await
    }

    /// Refetch after a successful mutation; pass failures through as-is
    async fn settle<T>(
        &mut self,
        action: &'static str,
        target: &str,
        result: ApiResult<T>,
    ) -> Result<T, SyncError> {
        let kind = R::Record::KIND;
        match result {
            Ok(value) => {
                tracing::debug!(kind, action, target, "mutation accepted");
                self.refresh().await?;
                Ok(value)
            }
            Err(e) => {
                if e.is_permission_denied() {
                    tracing::warn!(kind, action, target, "mutation refused");
                } else {
                    tracing::error!(kind, action, target, error = %e, "mutation failed");
                }
                Err(e.into())
            }
        }
    }
}

impl<R> Synchronizer<R>
where
    R: Resource,
    R::Record: Activatable,
{
    /// Flip `is_active`, resending the full record with nothing else changed
    pub async fn toggle_active(&mut self, id: &str) -> Result<R::Record, SyncError> {
        let mut record = self.get(id)?.clone();
        let active = !record.is_active();
        record.set_active(active);
        tracing::debug!(kind = R::Record::KIND, id, active, "toggling active");
        self.update(id, &record).await
    }
}
