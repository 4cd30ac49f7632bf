// calendar/tests/test_helpers/fake_jira.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jira::jql::Jql;
use jira::models::core::{Author, Fields, IssueKey, ParentRef};
use jira::models::field::{Field, FieldSchema};
use jira::models::issue::IssueSummary;
use jira::models::user::User;
use jira::models::worklog::{Worklog, WorklogComment, WorklogPatch};
use jira::{JiraError, RemoteStatus, StatusCode};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use worklog_calendar::date::to_wire;
use worklog_calendar::gateway::WorklogGateway;
use worklog_calendar::schema::EPIC_LINK_MARKER;

pub const ME: &str = "557058:me";
pub const MY_NAME: &str = "Ann Example";

/// Every request the calendar made, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CurrentUser,
    SearchUsers(String),
    PickUsers(String),
    SearchIssues(String),
    ListWorklogs(String),
    AddWorklog {
        issue_key: String,
        started: String,
        seconds: i64,
        comment: String,
    },
    UpdateWorklog {
        issue_key: String,
        worklog_id: String,
        patch: WorklogPatch,
    },
    Fields,
}

struct FakeIssue {
    summary: IssueSummary,
    assignee: Option<String>,
    epic: bool,
}

#[derive(Default)]
struct State {
    issues: Vec<FakeIssue>,
    worklogs: BTreeMap<String, Vec<Worklog>>,
    fields: Vec<Field>,
    users: Vec<User>,
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
    failing_jql: Vec<String>,
    next_id: u64,
}

/// Jira kept in memory. Searches are answered by looking for the clauses the calendar sends.
pub struct FakeJira {
    state: Mutex<State>,
}

impl Default for FakeJira {
    fn default() -> Self {
        FakeJira::new()
    }
}

impl FakeJira {
    pub fn new() -> Self {
        FakeJira {
            state: Mutex::new(State {
                next_id: 10_000,
                ..State::default()
            }),
        }
    }

    pub fn with_issue(self, key: &str, summary: &str) -> Self {
        self.add_issue(key, summary, None, Some(ME), false)
    }

    pub fn with_epic(self, key: &str, summary: &str) -> Self {
        self.add_issue(key, summary, None, None, true)
    }

    pub fn with_child(self, key: &str, summary: &str, parent: &str) -> Self {
        self.add_issue(key, summary, Some(parent), None, false)
    }

    pub fn with_worklog(
        self,
        key: &str,
        id: &str,
        author: &str,
        started: DateTime<Utc>,
        seconds: i64,
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .worklogs
                .entry(key.to_string())
                .or_default()
                .push(worklog(id, author, started, seconds, ""));
        }
        self
    }

    pub fn with_epic_link_field(self, id: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.fields.push(Field {
                id: "summary".to_string(),
                name: "Summary".to_string(),
                custom: false,
                schema: None,
            });
            state.fields.push(Field {
                id: id.to_string(),
                name: "Epic Link".to_string(),
                custom: true,
                schema: Some(FieldSchema {
                    kind: Some("any".to_string()),
                    custom: Some(EPIC_LINK_MARKER.to_string()),
                    custom_id: None,
                }),
            });
        }
        self
    }

    pub fn with_user(self, account_id: &str, display_name: &str) -> Self {
        self.state.lock().unwrap().users.push(user(account_id, display_name));
        self
    }

    /// Makes the named operation fail with a 400 response until [`FakeJira::heal`] is called
    pub fn fail(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    /// Makes every search containing `fragment` fail
    pub fn fail_jql(&self, fragment: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_jql
            .push(fragment.to_string());
    }

    pub fn heal(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing.clear();
        state.failing_jql.clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::AddWorklog { .. } | Call::UpdateWorklog { .. }))
            .collect()
    }

    pub fn searches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SearchIssues(jql) => Some(jql),
                _ => None,
            })
            .collect()
    }

    pub fn worklogs_of(&self, key: &str) -> Vec<Worklog> {
        self.state
            .lock()
            .unwrap()
            .worklogs
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn add_issue(
        self,
        key: &str,
        summary: &str,
        parent: Option<&str>,
        assignee: Option<&str>,
        epic: bool,
    ) -> Self {
        let issue = IssueSummary {
            id: key.to_string(),
            key: IssueKey::parse(key).unwrap(),
            fields: Fields {
                summary: summary.to_string(),
                parent: parent.map(|p| ParentRef {
                    key: IssueKey::parse(p).unwrap(),
                }),
            },
        };
        self.state.lock().unwrap().issues.push(FakeIssue {
            summary: issue,
            assignee: assignee.map(ToString::to_string),
            epic,
        });
        self
    }

    /// Records the call and fails it if asked to
    fn enter(&self, operation: &'static str, call: Call) -> Result<(), JiraError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(JiraError::remote(
                RemoteStatus::Http(StatusCode::BAD_REQUEST),
                &format!(r#"{{"errorMessages":["{operation} is broken"]}}"#),
            ));
        }
        Ok(())
    }
}

fn user(account_id: &str, display_name: &str) -> User {
    User {
        account_id: account_id.to_string(),
        display_name: display_name.to_string(),
        email_address: None,
        time_zone: None,
        active: true,
    }
}

fn worklog(id: &str, author: &str, started: DateTime<Utc>, seconds: i64, comment: &str) -> Worklog {
    Worklog {
        id: id.to_string(),
        author: Author {
            account_id: author.to_string(),
            email_address: None,
            display_name: String::new(),
        },
        started,
        time_spent_seconds: seconds,
        issue_id: String::new(),
        comment: (!comment.is_empty()).then(|| WorklogComment::Plain(comment.to_string())),
    }
}

/// The value of the first `field = "value"` clause in `jql`
fn value_of(jql: &str, field: &str) -> Option<String> {
    let start = jql.find(&format!("{field} = \""))? + field.len() + 4;
    let rest = &jql[start..];
    rest.find('"').map(|end| rest[..end].to_string())
}

#[async_trait]
impl WorklogGateway for FakeJira {
    async fn current_user(&self) -> Result<User, JiraError> {
        self.enter("current_user", Call::CurrentUser)?;
        Ok(user(ME, MY_NAME))
    }

    async fn search_users(&self, query: &str, _max_results: u32) -> Result<Vec<User>, JiraError> {
        self.enter("search_users", Call::SearchUsers(query.to_string()))?;
        let state = self.state.lock().unwrap();
        let query = query.to_lowercase();
        Ok(state
            .users
            .iter()
            .filter(|u| u.display_name.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn pick_users(&self, query: &str, max_results: u32) -> Result<Vec<User>, JiraError> {
        self.enter("pick_users", Call::PickUsers(query.to_string()))?;
        let state = self.state.lock().unwrap();
        let query = query.to_lowercase();
        Ok(state
            .users
            .iter()
            .filter(|u| u.display_name.to_lowercase().contains(&query))
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn search_issues(
        &self,
        jql: &Jql,
        _fields: &[&str],
        _max_results: u32,
    ) -> Result<Vec<IssueSummary>, JiraError> {
        let jql = jql.as_str();
        self.enter("search_issues", Call::SearchIssues(jql.to_string()))?;
        let state = self.state.lock().unwrap();
        if let Some(fragment) = state.failing_jql.iter().find(|f| jql.contains(f.as_str())) {
            return Err(JiraError::remote(
                RemoteStatus::Http(StatusCode::BAD_REQUEST),
                &format!(r#"{{"errorMessages":["Field '{fragment}' does not exist"]}}"#),
            ));
        }

        let matching: Vec<IssueSummary> = if let Some(author) = value_of(jql, "worklogAuthor") {
            state
                .issues
                .iter()
                .filter(|i| {
                    state
                        .worklogs
                        .get(i.summary.key.as_str())
                        .is_some_and(|wls| wls.iter().any(|wl| wl.author.account_id == author))
                })
                .map(|i| i.summary.clone())
                .collect()
        } else if let Some(assignee) = value_of(jql, "assignee") {
            state
                .issues
                .iter()
                .filter(|i| i.assignee.as_deref() == Some(assignee.as_str()))
                .map(|i| i.summary.clone())
                .collect()
        } else if jql.contains(r#"issuetype = "Epic""#) {
            state
                .issues
                .iter()
                .filter(|i| i.epic)
                .map(|i| i.summary.clone())
                .collect()
        } else {
            // Children of an epic, whatever field is used to refer to it
            let parent = ["parent", "cf[10014]", "\"Epic Link\""]
                .iter()
                .find_map(|field| value_of(jql, field));
            state
                .issues
                .iter()
                .filter(|i| {
                    i.summary.fields.parent.as_ref().map(|p| p.key.to_string()) == parent
                })
                .map(|i| i.summary.clone())
                .collect()
        };
        Ok(matching)
    }

    async fn list_worklogs(&self, issue_key: &IssueKey) -> Result<Vec<Worklog>, JiraError> {
        self.enter("list_worklogs", Call::ListWorklogs(issue_key.to_string()))?;
        Ok(self.worklogs_of(issue_key.as_str()))
    }

    async fn add_worklog(
        &self,
        issue_key: &IssueKey,
        started: DateTime<Utc>,
        time_spent_seconds: i64,
        comment: &str,
    ) -> Result<Worklog, JiraError> {
        self.enter(
            "add_worklog",
            Call::AddWorklog {
                issue_key: issue_key.to_string(),
                started: to_wire(started),
                seconds: time_spent_seconds,
                comment: comment.to_string(),
            },
        )?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let added = worklog(
            &state.next_id.to_string(),
            ME,
            started,
            time_spent_seconds,
            comment,
        );
        state
            .worklogs
            .entry(issue_key.to_string())
            .or_default()
            .push(added.clone());
        Ok(added)
    }

    async fn update_worklog(
        &self,
        issue_key: &IssueKey,
        worklog_id: &str,
        patch: &WorklogPatch,
    ) -> Result<Worklog, JiraError> {
        self.enter(
            "update_worklog",
            Call::UpdateWorklog {
                issue_key: issue_key.to_string(),
                worklog_id: worklog_id.to_string(),
                patch: patch.clone(),
            },
        )?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .worklogs
            .get_mut(issue_key.as_str())
            .and_then(|wls| wls.iter_mut().find(|wl| wl.id == worklog_id))
            .ok_or_else(|| {
                JiraError::remote(RemoteStatus::Http(StatusCode::NOT_FOUND), "Worklog not found")
            })?;
        if let Some(started) = patch.started {
            existing.started = started;
        }
        if let Some(seconds) = patch.time_spent_seconds {
            existing.time_spent_seconds = seconds;
        }
        if let Some(comment) = &patch.comment {
            existing.comment = Some(WorklogComment::Plain(comment.clone()));
        }
        Ok(existing.clone())
    }

    async fn fields(&self) -> Result<Vec<Field>, JiraError> {
        self.enter("fields", Call::Fields)?;
        Ok(self.state.lock().unwrap().fields.clone())
    }
}
