pub mod assignee;
pub mod config;
pub mod employee;
pub mod record;
pub mod task;
pub mod template;
pub mod timesheet;

pub use assignee::*;
pub use config::*;
pub use employee::*;
pub use record::*;
pub use task::*;
pub use template::*;
pub use timesheet::*;
