use chrono::{DateTime, Duration, Utc};
use jira::models::core::IssueKey;
use jira::models::user::User;
use jira::models::worklog::Worklog;
use std::fmt::{self, Display, Formatter};

/// Shortest duration a worklog is displayed and saved with
pub const MIN_DURATION_SECONDS: i64 = 60;

/// Identity of a committed worklog entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorklogRef {
    pub issue_key: IssueKey,
    pub worklog_id: String,
}

impl WorklogRef {
    /// Identifier of the calendar block displaying this entry
    #[must_use]
    pub fn block_id(&self) -> String {
        format!("{}::{}", self.issue_key, self.worklog_id)
    }
}

impl Display for WorklogRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.issue_key, self.worklog_id)
    }
}

/// A worklog entry as it is stored in Jira
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorklogEntry {
    pub issue_key: IssueKey,
    pub worklog_id: String,
    pub author_id: String,
    pub started: DateTime<Utc>,
    pub duration_seconds: i64,
    pub comment: String,
}

impl WorklogEntry {
    #[must_use]
    pub fn from_worklog(issue_key: &IssueKey, worklog: &Worklog) -> Self {
        WorklogEntry {
            issue_key: issue_key.clone(),
            worklog_id: worklog.id.clone(),
            author_id: worklog.author.account_id.clone(),
            started: worklog.started,
            duration_seconds: worklog.time_spent_seconds,
            comment: worklog.comment_text(),
        }
    }

    #[must_use]
    pub fn reference(&self) -> WorklogRef {
        WorklogRef {
            issue_key: self.issue_key.clone(),
            worklog_id: self.worklog_id.clone(),
        }
    }

    /// Entries shorter than a minute are stretched to one minute
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.started + Duration::seconds(self.duration_seconds.max(MIN_DURATION_SECONDS))
    }
}

/// A worklog entry together with the summary of its issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedWorklog {
    pub entry: WorklogEntry,
    pub summary: String,
}

impl CommittedWorklog {
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} · {}", self.entry.issue_key, self.summary)
    }
}

/// Something drawn in the time grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarBlock {
    pub block_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_editable: bool,
    pub is_draft: bool,
    pub source: Option<WorklogRef>,
}

/// The person whose worklogs are displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub account_id: String,
    pub display_name: String,
}

impl From<User> for Person {
    fn from(user: User) -> Self {
        Person {
            account_id: user.account_id,
            display_name: user.display_name,
        }
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.display_name.is_empty() {
            f.write_str(&self.account_id)
        } else {
            f.write_str(&self.display_name)
        }
    }
}
