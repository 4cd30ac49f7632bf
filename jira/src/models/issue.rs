use super::core::{Fields, IssueKey};
use serde::{Deserialize, Serialize};

/// Body of a `POST /search` request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub jql: String,
    pub max_results: u32,
    pub fields: Vec<String>,
}

/// Holds the response from Jira when performing JQL queries
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    #[serde(default)]
    pub start_at: Option<u32>,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub issues: Vec<IssueSummary>,
}

/// An issue as returned by a JQL search, restricted to the fields we asked for
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueSummary {
    pub id: String,
    pub key: IssueKey,
    #[serde(default)]
    pub fields: Fields,
}

impl IssueSummary {
    /// The summary text, falling back to the issue key when Jira left it out
    #[must_use]
    pub fn summary(&self) -> &str {
        if self.fields.summary.is_empty() {
            self.key.as_str()
        } else {
            &self.fields.summary
        }
    }
}
