pub mod assignees;
pub mod bulk;
pub mod completion;
pub mod form;
pub mod grouping;
pub mod schedule;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;
