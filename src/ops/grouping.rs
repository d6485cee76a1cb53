use std::borrow::Cow;
use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{Assignee, TaskTemplate};

/// Group key for templates with no client assignee
pub const UNASSIGNED: &str = "unassigned";

/// The group key a client heads: its display name, or the name with the
/// client id attached when the name would read as [`UNASSIGNED`].
pub fn client_key(client: &Assignee) -> Cow<'_, str> {
    let name = client.display_name();
    if name.eq_ignore_ascii_case(UNASSIGNED) {
        Cow::Owned(format!("{} ({})", name, client.id))
    } else {
        Cow::Borrowed(name)
    }
}

/// The key of the template's first client assignee, or [`UNASSIGNED`]
pub fn group_key(template: &TaskTemplate) -> Cow<'_, str> {
    template
        .anchor_client()
        .map(client_key)
        .unwrap_or(Cow::Borrowed(UNASSIGNED))
}

/// Partition templates by client, keeping first-appearance order for both
/// groups and members. Every template lands in exactly one group.
pub fn group_templates(templates: &[TaskTemplate]) -> IndexMap<String, Vec<&TaskTemplate>> {
    let mut groups: IndexMap<String, Vec<&TaskTemplate>> = IndexMap::new();
    for template in templates {
        groups
            .entry(group_key(template).into_owned())
            .or_default()
            .push(template);
    }
    groups
}

/// Members of one group, in list order
pub fn group_members<'a>(templates: &'a [TaskTemplate], key: &str) -> Vec<&'a TaskTemplate> {
    templates.iter().filter(|t| group_key(t) == key).collect()
}

/// A group as shown on the board
#[derive(Debug)]
pub struct TemplateGroup<'a> {
    pub key: String,
    pub templates: Vec<&'a TaskTemplate>,
    pub expanded: bool,
}

impl TemplateGroup<'_> {
    pub fn active_count(&self) -> usize {
        self.templates.iter().filter(|t| t.is_active).count()
    }
}

/// Group templates and attach expansion state, registering any new keys
pub fn build_groups<'a>(
    templates: &'a [TaskTemplate],
    expand: &mut ExpandState,
) -> Vec<TemplateGroup<'a>> {
    let groups = group_templates(templates);
    expand.sync_keys(groups.keys().map(String::as_str));
    groups
        .into_iter()
        .map(|(key, templates)| {
            let expanded = expand.is_expanded(&key);
            TemplateGroup {
                key,
                templates,
                expanded,
            }
        })
        .collect()
}

/// Expanded/collapsed flag per group key.
///
/// Keys are only ever added, so a group that disappears after a refetch and
/// later comes back keeps the state the user left it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandState {
    flags: BTreeMap<String, bool>,
}

impl ExpandState {
    /// Register keys not seen before as collapsed
    pub fn sync_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            if !self.flags.contains_key(key) {
                self.flags.insert(key.to_string(), false);
            }
        }
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn set(&mut self, key: &str, expanded: bool) {
        self.flags.insert(key.to_string(), expanded);
    }

    /// Flip one group, returning the new state
    pub fn toggle(&mut self, key: &str) -> bool {
        let next = !self.is_expanded(key);
        self.set(key, next);
        next
    }

    pub fn set_all(&mut self, expanded: bool) {
        for flag in self.flags.values_mut() {
            *flag = expanded;
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
