//! The Jira operations the calendar depends upon.
//!
//! [`jira::Jira`] is the production implementation. Every call is a single awaited request
//! (or a sequence of page requests), there are no retries.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jira::jql::Jql;
use jira::models::core::IssueKey;
use jira::models::field::Field;
use jira::models::issue::IssueSummary;
use jira::models::user::User;
use jira::models::worklog::{Worklog, WorklogPatch};
use jira::{Jira, JiraError};

#[async_trait]
pub trait WorklogGateway: Send + Sync {
    /// The user owning the credentials
    ///
    /// # Errors
    /// Any remote failure
    async fn current_user(&self) -> Result<User, JiraError>;

    /// # Errors
    /// Any remote failure
    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<User>, JiraError>;

    /// Fallback of [`WorklogGateway::search_users`] for users lacking the browse permission
    ///
    /// # Errors
    /// Any remote failure
    async fn pick_users(&self, query: &str, max_results: u32) -> Result<Vec<User>, JiraError>;

    /// # Errors
    /// Any remote failure, no partial results are returned
    async fn search_issues(
        &self,
        jql: &Jql,
        fields: &[&str],
        max_results: u32,
    ) -> Result<Vec<IssueSummary>, JiraError>;

    /// Every worklog entry of the issue, all pages collected
    ///
    /// # Errors
    /// Any remote failure
    async fn list_worklogs(&self, issue_key: &IssueKey) -> Result<Vec<Worklog>, JiraError>;

    /// # Errors
    /// Any remote failure
    async fn add_worklog(
        &self,
        issue_key: &IssueKey,
        started: DateTime<Utc>,
        time_spent_seconds: i64,
        comment: &str,
    ) -> Result<Worklog, JiraError>;

    /// # Errors
    /// Any remote failure, or an empty patch
    async fn update_worklog(
        &self,
        issue_key: &IssueKey,
        worklog_id: &str,
        patch: &WorklogPatch,
    ) -> Result<Worklog, JiraError>;

    /// # Errors
    /// Any remote failure
    async fn fields(&self) -> Result<Vec<Field>, JiraError>;
}

#[async_trait]
impl WorklogGateway for Jira {
    async fn current_user(&self) -> Result<User, JiraError> {
        self.get_current_user().await
    }

    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<User>, JiraError> {
        Jira::search_users(self, query, max_results).await
    }

    async fn pick_users(&self, query: &str, max_results: u32) -> Result<Vec<User>, JiraError> {
        Jira::pick_users(self, query, max_results).await
    }

    async fn search_issues(
        &self,
        jql: &Jql,
        fields: &[&str],
        max_results: u32,
    ) -> Result<Vec<IssueSummary>, JiraError> {
        Jira::search_issues(self, jql, fields, max_results).await
    }

    async fn list_worklogs(&self, issue_key: &IssueKey) -> Result<Vec<Worklog>, JiraError> {
        self.get_worklogs_for_issue(issue_key).await
    }

    async fn add_worklog(
        &self,
        issue_key: &IssueKey,
        started: DateTime<Utc>,
        time_spent_seconds: i64,
        comment: &str,
    ) -> Result<Worklog, JiraError> {
        Jira::add_worklog(self, issue_key, started, time_spent_seconds, comment).await
    }

    async fn update_worklog(
        &self,
        issue_key: &IssueKey,
        worklog_id: &str,
        patch: &WorklogPatch,
    ) -> Result<Worklog, JiraError> {
        Jira::update_worklog(self, issue_key, worklog_id, patch).await
    }

    async fn fields(&self) -> Result<Vec<Field>, JiraError> {
        self.get_fields().await
    }
}
