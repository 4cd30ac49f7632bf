//! Lookups feeding the save form and the person selector.
//!
//! Their results are informational, the session turns a failure into a warning and an
//! empty list.
pub mod issue;
pub mod user;
