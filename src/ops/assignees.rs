use std::time::{Duration, Instant};

use crate::api::{ApiResult, Directory};
use crate::model::{Assignee, Employee};

/// Minimum query length before a search runs.
///
/// Below the threshold a search yields an empty result without touching the
/// directory. Each call site carries its own threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchGate {
    pub min_len: usize,
}

impl SearchGate {
    pub fn new(min_len: usize) -> Self {
        SearchGate { min_len }
    }

    pub fn admits(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.min_len
    }
}

/// Server-side assignee search behind a length gate
pub async fn search_assignees<D: Directory + ?Sized>(
    directory: &D,
    query: &str,
    gate: SearchGate,
) -> ApiResult<Vec<Assignee>> {
    let query = query.trim();
    if !gate.admits(query) {
        tracing::trace!(query, min_len = gate.min_len, "search below threshold");
        return Ok(Vec::new());
    }
    let hits = directory.search_assignees(query).await?;
    tracing::debug!(query, hits = hits.len(), "assignee search");
    Ok(hits)
}

/// Local filter over an already-fetched employee list
pub fn filter_employees<'a>(
    employees: &'a [Employee],
    query: &str,
    gate: SearchGate,
) -> Vec<&'a Employee> {
    let query = query.trim();
    if !gate.admits(query) {
        return Vec::new();
    }
    employees.iter().filter(|e| e.matches(query)).collect()
}

/// The assignees picked in a form, with set semantics keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssigneeSelection {
    items: Vec<Assignee>,
}

impl AssigneeSelection {
    /// Build from a record's list, dropping repeated ids (first one wins)
    pub fn from_slice(assignees: &[Assignee]) -> Self {
        let mut selection = AssigneeSelection::default();
        for a in assignees {
            selection.select(a.clone());
        }
        selection
    }

    /// Add an assignee. Returns false, leaving the selection unchanged, when
    /// the id is already present.
    pub fn select(&mut self, assignee: Assignee) -> bool {
        if self.contains(&assignee.id) {
            return false;
        }
        self.items.push(assignee);
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|a| a.id != id);
        self.items.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|a| a.id == id)
    }

    pub fn items(&self) -> &[Assignee] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Assignee> {
        self.items
    }
}

/// Debounce and staleness tracking for an as-you-type search box.
///
/// Input resets the idle timer; a query is issued once the input has been
/// quiet for the delay, and a response is accepted only if it answers the
/// text currently in the box.
#[derive(Debug, Clone)]
pub struct SearchDebounce {
    delay: Duration,
    input: String,
    changed_at: Option<Instant>,
    issued: Option<String>,
}

impl SearchDebounce {
    pub fn new(delay: Duration) -> Self {
        SearchDebounce {
            delay,
            input: String::new(),
            changed_at: None,
            issued: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn on_input(&mut self, text: &str, now: Instant) {
        if self.input != text {
            self.input = text.to_string();
            self.changed_at = Some(now);
        }
    }

    /// The query to send now, if the input has settled and was not sent yet
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let changed = self.changed_at?;
        if now.duration_since(changed) < self.delay {
            return None;
        }
        if self.issued.as_deref() == Some(self.input.as_str()) {
            return None;
        }
        self.issued = Some(self.input.clone());
        Some(self.input.clone())
    }

    /// Whether a response for `query` still matches the box
    pub fn accepts(&self, query: &str) -> bool {
        self.input.trim() == query.trim()
    }

    pub fn reset(&mut self) {
        self.input.clear();
        self.changed_at = None;
        self.issued = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::FakeDirectory;

    fn directory() -> FakeDirectory {
        FakeDirectory {
            assignees: vec![
                Assignee::employee("e1", "Dana Reyes"),
                Assignee::client("c1", "Danube Freight"),
                Assignee::client("c2", "Acme"),
            ],
            ..Default::default()
        }
    }

    fn employee(first: &str, last: &str, email: &str) -> Employee {
        Employee {
            id: Some(format!("{}-id", first)),
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn short_query_never_reaches_directory() {
        let dir = directory();
        let hits = search_assignees(&dir, "d", SearchGate::new(2)).await.unwrap();
        assert!(hits.is_empty());
        let hits = search_assignees(&dir, "  ", SearchGate::new(2)).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(dir.call_count(), 0);
    }

    #[tokio::test]
    async fn admitted_query_searches_once() {
        let dir = directory();
        let hits = search_assignees(&dir, "dan", SearchGate::new(2)).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "c1"]);
        assert_eq!(dir.call_count(), 1);
    }

    #[test]
    fn employee_filter_with_zero_threshold() {
        let staff = vec![
            employee("Dana", "Reyes", "dana@studio.io"),
            employee("Lee", "Park", "lpark@studio.io"),
        ];
        assert_eq!(filter_employees(&staff, "", SearchGate::new(0)).len(), 2);
        let hits = filter_employees(&staff, "PARK", SearchGate::new(0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first_name, "Lee");
        assert!(filter_employees(&staff, "p", SearchGate::new(2)).is_empty());
    }

    #[test]
    fn selection_has_set_semantics() {
        let mut sel = AssigneeSelection::default();
        assert!(sel.select(Assignee::employee("e1", "Dana Reyes")));
        assert!(!sel.select(Assignee::employee("e1", "Dana R.")));
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.items()[0].name, "Dana Reyes");

        assert!(sel.select(Assignee::client("c1", "Acme")));
        assert!(sel.remove("e1"));
        assert!(!sel.remove("e1"));
        assert_eq!(sel.into_vec(), vec![Assignee::client("c1", "Acme")]);
    }

    #[test]
    fn selection_from_slice_drops_repeats() {
        let sel = AssigneeSelection::from_slice(&[
            Assignee::client("c1", "Acme"),
            Assignee::client("c1", "Acme again"),
        ]);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn debounce_issues_after_quiet_period() {
        let start = Instant::now();
        let mut d = SearchDebounce::new(Duration::from_millis(300));
        d.on_input("da", start);
        assert_eq!(d.poll(start + Duration::from_millis(100)), None);
        d.on_input("dan", start + Duration::from_millis(200));
        assert_eq!(d.poll(start + Duration::from_millis(400)), None);
        assert_eq!(
            d.poll(start + Duration::from_millis(500)),
            Some("dan".to_string())
        );
        // Already issued
        assert_eq!(d.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn stale_responses_are_rejected() {
        let start = Instant::now();
        let mut d = SearchDebounce::new(Duration::from_millis(300));
        d.on_input("dan", start);
        assert!(d.accepts("dan"));
        d.on_input("dana", start + Duration::from_millis(10));
        assert!(!d.accepts("dan"));
        assert!(d.accepts("dana"));
    }
}
