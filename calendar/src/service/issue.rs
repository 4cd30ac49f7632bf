use crate::cache::{CacheKey, Clock, TtlCache};
use crate::gateway::WorklogGateway;
use crate::schema::{parent_link_strategies, ParentFieldResolver};
use crate::types::Person;
use jira::jql::{Direction, Jql, JqlBuilder, JqlField};
use jira::models::core::IssueKey;
use jira::models::issue::IssueSummary;
use jira::JiraError;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

pub const ISSUES_ENDPOINT: &str = "issues";
pub const MAX_ISSUES: u32 = 100;

const ISSUE_FIELDS: [&str; 2] = ["summary", "parent"];

/// Searches the issues a worklog may be added to
#[allow(clippy::module_name_repetitions)]
pub struct IssueService {
    gateway: Arc<dyn WorklogGateway>,
    cache: TtlCache<Vec<IssueSummary>>,
    resolver: ParentFieldResolver,
}

#[allow(clippy::module_name_repetitions)]
impl IssueService {
    pub fn new(
        gateway: Arc<dyn WorklogGateway>,
        issues_ttl: Duration,
        schema_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            cache: TtlCache::new(issues_ttl, Arc::clone(&clock)),
            resolver: ParentFieldResolver::new(schema_ttl, clock),
        }
    }

    /// Unresolved issues assigned to `person`, most recently updated first
    ///
    /// # Errors
    /// Any remote failure
    pub async fn assigned_to(&mut self, person: &Person) -> Result<Vec<IssueSummary>, JiraError> {
        let jql = open_issues().eq(JqlField::named("assignee"), &person.account_id);
        self.search_cached("assignee", &person.account_id, &Self::ordered(jql))
            .await
    }

    /// Unresolved epics, offered as parents narrowing the candidate issues
    ///
    /// # Errors
    /// Any remote failure
    pub async fn epics(&mut self) -> Result<Vec<IssueSummary>, JiraError> {
        let jql = open_issues().eq(JqlField::named("issuetype"), "Epic");
        self.search_cached("epics", "", &Self::ordered(jql)).await
    }

    /// Unresolved children of `parent`.
    ///
    /// How children refer to their epic depends on the project type, hence the clause
    /// strategies are tried in order. The first one Jira accepts wins, even if it yields
    /// no issues.
    ///
    /// # Errors
    /// The failure of the last strategy, if every strategy failed
    pub async fn children_of(&mut self, parent: &IssueKey) -> Result<Vec<IssueSummary>, JiraError> {
        let key = CacheKey::new(ISSUES_ENDPOINT, ["children".to_string(), parent.to_string()]);
        if let Some(issues) = self.cache.get(&key) {
            return Ok(issues);
        }

        let resolved = self.resolver.resolve(self.gateway.as_ref()).await;
        let mut last_failure = None;
        for field in parent_link_strategies(&resolved) {
            let jql = Self::ordered(open_issues().eq(field.clone(), parent.as_str()));
            match self
                .gateway
                .search_issues(&jql, &ISSUE_FIELDS, MAX_ISSUES)
                .await
            {
                Ok(issues) => {
                    debug!("Children of {parent} found through {field}");
                    self.cache.insert(key, issues.clone());
                    return Ok(issues);
                }
                Err(e) => {
                    warn!("Searching children of {parent} through {field} failed: {e}");
                    last_failure = Some(e);
                }
            }
        }
        match last_failure {
            Some(e) => Err(e),
            None => Ok(vec![]),
        }
    }

    /// The children of the selected parent, otherwise the issues assigned to `person`
    ///
    /// # Errors
    /// Any remote failure
    pub async fn candidates(
        &mut self,
        person: &Person,
        parent: Option<&IssueKey>,
    ) -> Result<Vec<IssueSummary>, JiraError> {
        match parent {
            Some(parent) => self.children_of(parent).await,
            None => self.assigned_to(person).await,
        }
    }

    fn ordered(builder: JqlBuilder) -> Jql {
        builder
            .order_by(JqlField::named("updated"), Direction::Descending)
            .build()
    }

    async fn search_cached(
        &mut self,
        kind: &str,
        param: &str,
        jql: &Jql,
    ) -> Result<Vec<IssueSummary>, JiraError> {
        let key = CacheKey::new(ISSUES_ENDPOINT, [kind.to_string(), param.to_string()]);
        if let Some(issues) = self.cache.get(&key) {
            return Ok(issues);
        }
        let issues = self
            .gateway
            .search_issues(jql, &ISSUE_FIELDS, MAX_ISSUES)
            .await?;
        self.cache.insert(key, issues.clone());
        Ok(issues)
    }
}

fn open_issues() -> JqlBuilder {
    JqlBuilder::new().is_empty(JqlField::named("resolution"))
}
