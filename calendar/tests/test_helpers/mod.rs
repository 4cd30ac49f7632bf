pub mod common;
pub mod fake_jira;
pub mod scripted_view;
