pub mod core;
pub mod field;
pub mod issue;
pub mod user;
pub mod worklog;
