use super::core::Author;
use crate::date;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogsPage {
    #[serde(default)]
    pub start_at: usize,
    #[serde(default)]
    pub max_results: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub worklogs: Vec<Worklog>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Worklog {
    pub id: String,
    pub author: Author,
    #[serde(with = "date::wire")]
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub time_spent_seconds: i64,
    #[serde(default)]
    pub issue_id: String,
    #[serde(default)]
    pub comment: Option<WorklogComment>,
}

impl Worklog {
    /// The comment as plain text, empty when there is none
    #[must_use]
    pub fn comment_text(&self) -> String {
        self.comment
            .as_ref()
            .map(WorklogComment::plain_text)
            .unwrap_or_default()
    }
}

/// API v2 returns comments as plain strings, API v3 as Atlassian Document Format
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WorklogComment {
    Plain(String),
    Document(AdfNode),
}

impl WorklogComment {
    #[must_use]
    pub fn plain_text(&self) -> String {
        match self {
            WorklogComment::Plain(text) => text.clone(),
            WorklogComment::Document(doc) => doc.plain_text(),
        }
    }
}

/// A node of an Atlassian Document Format tree. Only the parts needed to
/// write a single paragraph and to read text back are modelled.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdfNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<AdfNode>,
}

impl AdfNode {
    /// Wraps `text` into a document holding one paragraph.
    /// Returns `None` for empty text, as Jira treats an empty document differently from
    /// an absent comment.
    #[must_use]
    pub fn paragraph_document(text: &str) -> Option<AdfNode> {
        if text.is_empty() {
            return None;
        }
        let text_node = AdfNode {
            kind: "text".to_string(),
            version: None,
            text: Some(text.to_string()),
            content: vec![],
        };
        let paragraph = AdfNode {
            kind: "paragraph".to_string(),
            version: None,
            text: None,
            content: vec![text_node],
        };
        Some(AdfNode {
            kind: "doc".to_string(),
            version: Some(1),
            text: None,
            content: vec![paragraph],
        })
    }

    #[must_use]
    pub fn plain_text(&self) -> String {
        match self.kind.as_str() {
            "text" => self.text.clone().unwrap_or_default(),
            "hardBreak" => "\n".to_string(),
            "doc" => self
                .content
                .iter()
                .map(AdfNode::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
            _ => self.content.iter().map(AdfNode::plain_text).collect(),
        }
    }
}

/// Body of `POST /issue/{key}/worklog`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorklog {
    #[serde(with = "date::wire")]
    pub started: DateTime<Utc>,
    pub time_spent_seconds: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<AdfNode>,
}

impl NewWorklog {
    #[must_use]
    pub fn new(started: DateTime<Utc>, time_spent_seconds: i64, comment: &str) -> Self {
        NewWorklog {
            started,
            time_spent_seconds,
            comment: AdfNode::paragraph_document(comment),
        }
    }
}

/// Partial update of an existing worklog, only the `Some` fields are sent to Jira
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorklogPatch {
    pub started: Option<DateTime<Utc>>,
    pub time_spent_seconds: Option<i64>,
    pub comment: Option<String>,
}

impl WorklogPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.started.is_none() && self.time_spent_seconds.is_none() && self.comment.is_none()
    }
}

/// Body of `PUT /issue/{key}/worklog/{id}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<AdfNode>,
}

impl From<&WorklogPatch> for WorklogUpdate {
    fn from(patch: &WorklogPatch) -> Self {
        WorklogUpdate {
            started: patch.started.map(date::to_wire),
            time_spent_seconds: patch.time_spent_seconds,
            comment: patch
                .comment
                .as_deref()
                .and_then(AdfNode::paragraph_document),
        }
    }
}
