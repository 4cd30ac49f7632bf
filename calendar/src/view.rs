//! The contract between the session and whatever draws the calendar.
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use jira::models::core::IssueKey;
use jira::models::issue::IssueSummary;
use std::fmt::{self, Display, Formatter};

use crate::date::VisibleRange;
use crate::draft::DraftMode;
use crate::interaction::Interaction;
use crate::types::CalendarBlock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message shown to the user next to the calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.level, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub timezone: Tz,
    pub range: VisibleRange,
    pub grid_minutes: u32,
    pub slot_min_time: NaiveTime,
    pub slot_max_time: NaiveTime,
    pub notices: Vec<Notice>,
}

/// Everything the save form needs to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    pub mode: DraftMode,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: Tz,
    /// Fixed when editing an existing entry
    pub issue_key: Option<IssueKey>,
    /// Issues the worklog may be added to, narrowed by the selected parent
    pub candidate_issues: Vec<IssueSummary>,
    /// Open epics to choose a parent from
    pub parents: Vec<IssueSummary>,
    pub selected_parent: Option<IssueKey>,
    pub comment: String,
    pub duration_minutes: i64,
}

/// What the user typed into the save form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub issue_key: Option<String>,
    pub comment: String,
    /// Local wall clock time in the timezone of the form
    pub start_override: Option<NaiveDateTime>,
    pub duration_minutes: Option<i64>,
}

/// The calendar as seen from the session
pub trait CalendarView {
    /// Draws the blocks and waits for the next interaction. `None` ends the session.
    fn render(&mut self, blocks: &[CalendarBlock], options: &ViewOptions) -> Option<Interaction>;

    fn prompt_fields(&mut self, schema: &FormSchema) -> FormValues;
}
