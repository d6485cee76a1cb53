use futures_util::future::join_all;

use super::grouping::group_members;
use super::sync::{SyncError, Synchronizer};
use crate::api::{ApiError, Resource};
use crate::model::record::Record;
use crate::model::{Assignee, TaskTemplate};

/// Result for one item of a batch
#[derive(Debug)]
pub struct ItemOutcome<T> {
    /// Title of the record the item acted on
    pub label: String,
    pub result: Result<T, ApiError>,
}

/// Per-item results of a concurrent batch, plus the follow-up refresh.
///
/// Items are reported in submission order regardless of completion order.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub outcomes: Vec<ItemOutcome<T>>,
    /// Set when the single refresh after the batch failed
    pub refresh_error: Option<SyncError>,
}

impl<T> BatchReport<T> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|v| (o.label.as_str(), v)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ApiError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.label.as_str(), e)))
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Every item succeeded (an empty batch counts as success)
    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn any_permission_denied(&self) -> bool {
        self.failures().any(|(_, e)| e.is_permission_denied())
    }
}

impl<R: Resource> Synchronizer<R> {
    /// Create all drafts concurrently, then refresh once
    pub async fn create_batch(&mut self, drafts: Vec<R::Record>) -> BatchReport<R::Record> {
        let resource = self.resource();
        let outcomes = join_all(drafts.iter().map(|draft| async move {
            ItemOutcome {
                label: draft.title().to_string(),
                result: resource.create(draft).await,
            }
        }))
        .await;
        self.finish_batch("create", outcomes).await
    }

    /// Delete the given records concurrently, then refresh once
    pub async fn delete_batch(&mut self, targets: Vec<R::Record>) -> BatchReport<()> {
        let resource = self.resource();
        let outcomes = join_all(targets.iter().map(|record| async move {
            let label = record.title().to_string();
            let result = match record.id() {
                Some(id) => resource.delete(id).await,
                None => Err(ApiError::NotFound(format!("{} has no id", label))),
            };
            ItemOutcome { label, result }
        }))
        .await;
        self.finish_batch("delete", outcomes).await
    }

    async fn finish_batch<T>(
        &mut self,
        action: &'static str,
        outcomes: Vec<ItemOutcome<T>>,
    ) -> BatchReport<T> {
        let kind = R::Record::KIND;
        for outcome in &outcomes {
            if let Err(e) = &outcome.result {
                tracing::error!(kind, action, item = %outcome.label, error = %e, "batch item failed");
            }
        }
        let mut report = BatchReport {
            outcomes,
            refresh_error: None,
        };
        tracing::info!(
            kind,
            action,
            total = report.len(),
            failed = report.failure_count(),
            "batch finished"
        );
        if let Err(e) = self.refresh().await {
            report.refresh_error = Some(e);
        }
        report
    }
}

/// Drafts that copy `sources` to `target`: each keeps its fields and its
/// employee assignees, drops its clients, and gains `target` once.
pub fn plan_copy(sources: &[&TaskTemplate], target: &Assignee) -> Vec<TaskTemplate> {
    sources
        .iter()
        .map(|source| {
            let mut draft = source.without_id();
            draft.assignees.retain(|a| !a.is_client());
            draft.assignees.push(target.clone());
            draft
        })
        .collect()
}

/// Copy every template in group `key` to the `target` client
pub async fn copy_group<R>(
    sync: &mut Synchronizer<R>,
    key: &str,
    target: &Assignee,
) -> BatchReport<TaskTemplate>
where
    R: Resource<Record = TaskTemplate>,
{
    let drafts = plan_copy(&group_members(sync.records(), key), target);
    tracing::debug!(group = key, target = %target.id, count = drafts.len(), "copying group");
    sync.create_batch(drafts).await
}

/// Delete every template in group `key`
pub async fn delete_group<R>(sync: &mut Synchronizer<R>, key: &str) -> BatchReport<()>
where
    R: Resource<Record = TaskTemplate>,
{
    let targets: Vec<TaskTemplate> = group_members(sync.records(), key)
        .into_iter()
        .cloned()
        .collect();
    tracing::debug!(group = key, count = targets.len(), "deleting group");
    sync.delete_batch(targets).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::grouping::{UNASSIGNED, group_templates};
    use crate::ops::testing::{FakeResource, template};
    use pretty_assertions::assert_eq;

    fn acme() -> Assignee {
        Assignee::client("c1", "Acme")
    }

    fn globex() -> Assignee {
        Assignee::client("c2", "Globex")
    }

    fn board() -> FakeResource<TaskTemplate> {
        let ann = Assignee::employee("e1", "Ann Lee");
        FakeResource::with(vec![
            template("t1", "Weekly report", vec![ann.clone(), acme()]),
            template("t2", "Invoice run", vec![acme(), globex()]),
            template("t3", "Standup", vec![ann]),
        ])
    }

    #[test]
    fn plan_copy_swaps_clients_and_keeps_employees() {
        let t = template(
            "t1",
            "Weekly report",
            vec![acme(), Assignee::employee("e1", "Ann Lee"), globex()],
        );
        let target = Assignee::client("c9", "Initech");
        let drafts = plan_copy(&[&t], &target);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, None);
        assert_eq!(drafts[0].title, "Weekly report");
        assert_eq!(
            drafts[0].assignees,
            vec![Assignee::employee("e1", "Ann Lee"), target]
        );
    }

    #[tokio::test]
    async fn copy_group_creates_under_target() {
        let fake = board();
        let mut sync = Synchronizer::new(fake.clone());
        sync.refresh().await.unwrap();

        let target = Assignee::client("c9", "Initech");
        let report = copy_group(&mut sync, "Acme", &target).await;
        assert_eq!(report.success_count(), 2);
        assert!(report.all_succeeded());
        assert!(report.refresh_error.is_none());

        // One refresh for the whole batch
        assert_eq!(fake.fetches(), 2);
        let groups = group_templates(sync.records());
        assert_eq!(groups["Initech"].len(), 2);
        assert_eq!(groups["Acme"].len(), 2);
    }

    #[tokio::test]
    async fn partial_failure_is_reported_per_item() {
        let fake = board();
        fake.fail_create_of("Invoice run");
        let mut sync = Synchronizer::new(fake.clone());
        sync.refresh().await.unwrap();

        let report = copy_group(&mut sync, "Acme", &globex()).await;
        assert_eq!(report.len(), 2);
        assert_eq!(report.success_count(), 1);
        let failed: Vec<&str> = report.failures().map(|(label, _)| label).collect();
        assert_eq!(failed, vec!["Invoice run"]);
        assert_eq!(fake.fetches(), 2);
        assert_eq!(sync.records().len(), 4);
    }

    #[tokio::test]
    async fn delete_group_removes_members_only() {
        let fake = board();
        fake.forbid("t2");
        let mut sync = Synchronizer::new(fake.clone());
        sync.refresh().await.unwrap();

        let report = delete_group(&mut sync, "Acme").await;
        assert_eq!(report.success_count(), 1);
        assert!(report.any_permission_denied());

        let ids: Vec<&str> = sync.records().iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(ids, vec!["t2", "t3"]);
    }

    #[tokio::test]
    async fn missing_group_is_an_empty_batch() {
        let fake = board();
        let mut sync = Synchronizer::new(fake.clone());
        sync.refresh().await.unwrap();

        let report = delete_group(&mut sync, "Nobody").await;
        assert!(report.is_empty());
        assert!(report.all_succeeded());
        assert_eq!(group_templates(sync.records())[UNASSIGNED].len(), 1);
    }
}
