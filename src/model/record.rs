use serde::Serialize;
use serde::de::DeserializeOwned;

use super::assignee::Assignee;

/// A server-owned record mirrored by the client (templates and tasks)
pub trait Record: Clone + std::fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Singular noun used in logs and messages ("template", "task")
    const KIND: &'static str;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: Option<String>);
    fn title(&self) -> &str;
    fn assignees(&self) -> &[Assignee];
    fn assignees_mut(&mut self) -> &mut Vec<Assignee>;

    /// A copy with the server id stripped, ready to be created again
    fn without_id(&self) -> Self {
        let mut copy = self.clone();
        copy.set_id(None);
        copy
    }
}

/// Records carrying an `is_active` switch
pub trait Activatable: Record {
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}
