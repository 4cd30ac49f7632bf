//! Weekly calendar of Jira worklogs.
//!
//! The worklogs of one person are projected onto a week of calendar blocks. Edits happen on a
//! single draft, which is written back to Jira when saved. Drawing the calendar is left to an
//! implementation of [`view::CalendarView`], everything else flows through a
//! [`session::Session`].
//!
//! ```rust,ignore
//! let config = worklog_calendar::config::load()?;
//! let mut session = Session::from_config(&config)?;
//! session.select_current_user().await?;
//! session.run(&mut my_view).await;
//! ```
pub mod cache;
pub mod config;
pub mod date;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod interaction;
pub mod projection;
pub mod schema;
pub mod service;
pub mod session;
pub mod types;
pub mod view;

pub use error::CalendarError;
pub use session::Session;
