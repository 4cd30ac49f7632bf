//! Client for the parts of the Jira Cloud REST api (v3) a worklog calendar needs: people,
//! issue searches, worklogs of an issue and the field catalog.
//!
//! Writes never notify watchers.
use std::fmt::{self, Debug, Display, Formatter};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, Method, RequestBuilder,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use url::{ParseError, Url};

use jql::Jql;
use models::{
    core::IssueKey,
    field::Field,
    issue::{IssueSummary, SearchRequest, SearchResults},
    user::{User, UserPickerResults},
    worklog::{NewWorklog, Worklog, WorklogPatch, WorklogUpdate, WorklogsPage},
};

pub mod builder;
pub mod config;
pub mod date;
pub mod jql;
pub mod models;

pub use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, JiraError>;

/// Longest part of a response body kept in an error message
pub const MAX_ERROR_BODY_CHARS: usize = 500;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of a request which did not produce a successful HTTP response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Http(StatusCode),
    Timeout,
    Transport,
}

impl Display for RemoteStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RemoteStatus::Http(code) => write!(f, "{code}"),
            RemoteStatus::Timeout => f.write_str("timeout"),
            RemoteStatus::Transport => f.write_str("transport"),
        }
    }
}

#[derive(Debug, Error)]
pub enum JiraError {
    /// Any unsuccessful exchange with Jira. `body` holds the (truncated) diagnostic from Jira.
    #[error("Jira request failed ({status}): {body}")]
    Remote { status: RemoteStatus, body: String },
    #[error("Parameter '{0}' must contain a value")]
    RequiredParameter(String),
    #[error("Could not serialize/deserialize: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid Jira URL: {0}")]
    UrlParse(#[from] ParseError),
}

impl JiraError {
    /// Creates a [`JiraError::Remote`] holding at most [`MAX_ERROR_BODY_CHARS`] of `body`
    #[must_use]
    pub fn remote(status: RemoteStatus, body: &str) -> Self {
        JiraError::Remote {
            status,
            body: truncate_body(body),
        }
    }

    /// The HTTP status code, if Jira responded at all
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            JiraError::Remote {
                status: RemoteStatus::Http(code),
                ..
            } => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            JiraError::Remote {
                status: RemoteStatus::Timeout,
                ..
            }
        )
    }
}

impl From<reqwest::Error> for JiraError {
    fn from(error: reqwest::Error) -> JiraError {
        let status = if error.is_timeout() {
            RemoteStatus::Timeout
        } else if let Some(code) = error.status() {
            RemoteStatus::Http(code)
        } else {
            RemoteStatus::Transport
        };
        JiraError::remote(status, &error.to_string())
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        body.to_string()
    } else {
        let mut truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        truncated.push('…');
        truncated
    }
}

#[derive(Clone)]
pub enum Credentials {
    Anonymous,
    Basic(String, String),
    Bearer(String),
}

impl Credentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::Anonymous => request,
            Credentials::Basic(ref user, ref pass) => {
                request.basic_auth(user.to_owned(), Some(pass.to_owned()))
            }
            Credentials::Bearer(ref token) => request.bearer_auth(token.to_owned()),
        }
    }
}

// Never print the secrets
impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Basic(user, _) => write!(f, "Basic({user}, ***)"),
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Jira {
    host: Url,
    api: String,
    credentials: Credentials,
    read_timeout: Duration,
    search_timeout: Duration,
    pub client: Client,
}

impl Jira {
    /// Creates a client for the Jira instance at `host` with the default timeouts.
    ///
    /// # Errors
    /// Returns an error if `host` is not a valid URL
    pub fn new<H>(host: H, credentials: Credentials) -> Result<Jira>
    where
        H: Into<String>,
    {
        let host = Url::parse(&host.into())?;

        Ok(Jira {
            host,
            api: format!("rest/api/{}", builder::DEFAULT_API_VERSION),
            credentials,
            read_timeout: DEFAULT_READ_TIMEOUT,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            client: Client::new(),
        })
    }

    async fn request<D, S>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&S>,
        timeout: Duration,
    ) -> Result<D>
    where
        D: DeserializeOwned,
        S: Serialize + ?Sized,
    {
        let url = self.host.join(&format!("{}{endpoint}", self.api))?;

        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(timeout);

        request = self.credentials.apply(request);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }
        debug!("request '{:?}'", request);

        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("status {:?} body '{:?}'", status, body);
        if !status.is_success() {
            return Err(JiraError::remote(RemoteStatus::Http(status), &body));
        }
        let data = if body.is_empty() { "null" } else { &body };
        Ok(serde_json::from_str::<D>(data)?)
    }

    #[allow(clippy::missing_errors_doc)]
    pub async fn get<D>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<D>
    where
        D: DeserializeOwned,
    {
        self.request::<D, ()>(Method::GET, endpoint, query, None, self.read_timeout)
            .await
    }

    async fn post<D, S>(&self, endpoint: &str, query: &[(&str, String)], body: &S, timeout: Duration) -> Result<D>
    where
        D: DeserializeOwned,
        S: Serialize,
    {
        self.request::<D, S>(Method::POST, endpoint, query, Some(body), timeout)
            .await
    }

    async fn put<D, S>(&self, endpoint: &str, query: &[(&str, String)], body: &S) -> Result<D>
    where
        D: DeserializeOwned,
        S: Serialize,
    {
        self.request::<D, S>(Method::PUT, endpoint, query, Some(body), self.read_timeout)
            .await
    }

    /// Writes must never trigger notification e-mails, a drag in the calendar would
    /// otherwise spam the watchers of the issue.
    fn silent_write() -> [(&'static str, String); 1] {
        [("notifyUsers", "false".to_string())]
    }

    /// Retrieves the user owning the credentials
    #[allow(clippy::missing_errors_doc)]
    pub async fn get_current_user(&self) -> Result<User> {
        self.get::<User>("/myself", &[]).await
    }

    /// Finds users by partial name or e-mail address
    #[allow(clippy::missing_errors_doc)]
    pub async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<User>> {
        self.get::<Vec<User>>(
            "/users/search",
            &[
                ("query", query.to_string()),
                ("maxResults", max_results.to_string()),
            ],
        )
        .await
    }

    /// Same purpose as [`Jira::search_users`], but available to users lacking the
    /// "browse users" permission
    #[allow(clippy::missing_errors_doc)]
    pub async fn pick_users(&self, query: &str, max_results: u32) -> Result<Vec<User>> {
        let picked = self
            .get::<UserPickerResults>(
                "/user/picker",
                &[
                    ("query", query.to_string()),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;
        Ok(picked.users)
    }

    /// Executes a JQL search. A failure yields no partial results.
    #[allow(clippy::missing_errors_doc)]
    pub async fn search_issues(
        &self,
        jql: &Jql,
        fields: &[&str],
        max_results: u32,
    ) -> Result<Vec<IssueSummary>> {
        let request = SearchRequest {
            jql: jql.to_string(),
            max_results,
            fields: fields.iter().map(ToString::to_string).collect(),
        };
        debug!("Searching for issues with '{jql}'");
        let results = self
            .post::<SearchResults, SearchRequest>("/search", &[], &request, self.search_timeout)
            .await?;
        Ok(results.issues)
    }

    /// Retrieves every worklog entry of an issue, page by page.
    ///
    /// Stops when the number of entries collected reaches the total reported by Jira, or
    /// when Jira returns an empty page, whichever comes first.
    #[allow(clippy::missing_errors_doc)]
    pub async fn get_worklogs_for_issue(&self, issue_key: &IssueKey) -> Result<Vec<Worklog>> {
        let resource = format!("/issue/{issue_key}/worklog");
        let mut worklogs: Vec<Worklog> = Vec::new();
        let mut start_at = 0;

        debug!("Retrieving worklogs for {issue_key}");
        loop {
            let page = self
                .get::<WorklogsPage>(&resource, &[("startAt", start_at.to_string())])
                .await?;
            let received = page.worklogs.len();
            worklogs.extend(page.worklogs);
            if worklogs.len() >= page.total || received == 0 {
                break;
            }
            start_at += received;
        }
        debug!("Issue {issue_key} has {} worklog entries", worklogs.len());
        Ok(worklogs)
    }

    /// Adds a worklog entry. An empty comment is not sent at all.
    #[allow(clippy::missing_errors_doc)]
    pub async fn add_worklog(
        &self,
        issue_key: &IssueKey,
        started: DateTime<Utc>,
        time_spent_seconds: i64,
        comment: &str,
    ) -> Result<Worklog> {
        let entry = NewWorklog::new(started, time_spent_seconds, comment);
        let url = format!("/issue/{issue_key}/worklog");
        self.post::<Worklog, NewWorklog>(&url, &Self::silent_write(), &entry, self.read_timeout)
            .await
    }

    /// Updates the supplied fields of an existing worklog entry in a single request
    #[allow(clippy::missing_errors_doc)]
    pub async fn update_worklog(
        &self,
        issue_key: &IssueKey,
        worklog_id: &str,
        patch: &WorklogPatch,
    ) -> Result<Worklog> {
        if worklog_id.is_empty() {
            return Err(JiraError::RequiredParameter("worklog_id".to_string()));
        }
        if patch.is_empty() {
            return Err(JiraError::RequiredParameter("worklog patch".to_string()));
        }
        let url = format!("/issue/{issue_key}/worklog/{worklog_id}");
        self.put::<Worklog, WorklogUpdate>(&url, &Self::silent_write(), &WorklogUpdate::from(patch))
            .await
    }

    /// Retrieves the catalog of system and custom fields
    #[allow(clippy::missing_errors_doc)]
    pub async fn get_fields(&self) -> Result<Vec<Field>> {
        self.get::<Vec<Field>>("/field", &[]).await
    }
}
