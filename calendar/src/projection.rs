//! Turns the worklogs of a person within the visible week into calendar blocks.
//!
//! Jira can only filter issues on the date of their worklogs, so the search is coarse and the
//! entries of every matching issue are filtered here on author and exact instant.
use std::sync::Arc;
use std::time::Duration;

use jira::jql::{Direction, Jql, JqlBuilder, JqlField};
use jira::JiraError;
use log::debug;

use crate::cache::{CacheKey, Clock, TtlCache};
use crate::date::VisibleRange;
use crate::draft::Draft;
use crate::gateway::WorklogGateway;
use crate::types::{CalendarBlock, CommittedWorklog, Person, WorklogEntry};

/// Cache endpoint of the projected worklogs, invalidated by every successful write
pub const WORKLOGS_ENDPOINT: &str = "worklogs";
/// Upper bound of issues searched for worklogs in one week
pub const MAX_WORKLOG_ISSUES: u32 = 300;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Issues having a worklog by `person` on the (widened) dates of `range`
#[must_use]
pub fn worklog_query(person: &Person, range: &VisibleRange) -> Jql {
    let (first, last) = range.query_dates();
    JqlBuilder::new()
        .eq(JqlField::named("worklogAuthor"), &person.account_id)
        .ge(
            JqlField::named("worklogDate"),
            &first.format(DATE_FORMAT).to_string(),
        )
        .le(
            JqlField::named("worklogDate"),
            &last.format(DATE_FORMAT).to_string(),
        )
        .order_by(JqlField::named("updated"), Direction::Descending)
        .build()
}

/// Retrieves the worklogs of `person` starting within `range`.
///
/// Issues are visited one after another.
///
/// # Errors
/// The first remote failure aborts the projection
pub async fn fetch_committed(
    gateway: &dyn WorklogGateway,
    person: &Person,
    range: &VisibleRange,
) -> Result<Vec<CommittedWorklog>, JiraError> {
    let jql = worklog_query(person, range);
    let issues = gateway
        .search_issues(&jql, &["summary"], MAX_WORKLOG_ISSUES)
        .await?;
    debug!("{} issues have worklogs by {person}", issues.len());

    let mut committed = Vec::new();
    for issue in &issues {
        let worklogs = gateway.list_worklogs(&issue.key).await?;
        committed.extend(
            worklogs
                .iter()
                .filter(|wl| wl.author.account_id == person.account_id)
                .filter(|wl| range.contains(wl.started))
                .map(|wl| CommittedWorklog {
                    entry: WorklogEntry::from_worklog(&issue.key, wl),
                    summary: issue.summary().to_string(),
                }),
        );
    }
    debug!("{} worklogs of {person} within the week", committed.len());
    Ok(committed)
}

/// Committed entries are never editable. A live draft adds exactly one editable block.
#[must_use]
pub fn build_blocks(committed: &[CommittedWorklog], draft: Option<&Draft>) -> Vec<CalendarBlock> {
    committed
        .iter()
        .map(|c| CalendarBlock {
            block_id: c.entry.reference().block_id(),
            title: c.title(),
            start: c.entry.started,
            end: c.entry.end(),
            is_editable: false,
            is_draft: false,
            source: Some(c.entry.reference()),
        })
        .chain(draft.map(Draft::block))
        .collect()
}

/// Fetches the committed worklogs and appends the draft, uncached.
///
/// # Errors
/// See [`fetch_committed`]
pub async fn project_week(
    gateway: &dyn WorklogGateway,
    person: &Person,
    range: &VisibleRange,
    draft: Option<&Draft>,
) -> Result<Vec<CalendarBlock>, JiraError> {
    let committed = fetch_committed(gateway, person, range).await?;
    Ok(build_blocks(&committed, draft))
}

/// Remembers the committed worklogs of a week for the worklogs time to live
pub struct Projection {
    cache: TtlCache<Vec<CommittedWorklog>>,
}

impl Projection {
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Projection {
            cache: TtlCache::new(ttl, clock),
        }
    }

    /// # Errors
    /// See [`fetch_committed`], failures are not cached
    pub async fn committed(
        &mut self,
        gateway: &dyn WorklogGateway,
        person: &Person,
        range: &VisibleRange,
    ) -> Result<Vec<CommittedWorklog>, JiraError> {
        let key = CacheKey::new(
            WORKLOGS_ENDPOINT,
            [
                person.account_id.clone(),
                range.start.to_rfc3339(),
                range.end.to_rfc3339(),
            ],
        );
        if let Some(committed) = self.cache.get(&key) {
            debug!("Worklogs of {person} served from cache");
            return Ok(committed);
        }
        let committed = fetch_committed(gateway, person, range).await?;
        self.cache.insert(key, committed.clone());
        Ok(committed)
    }

    /// Must be called after every successful write, so the next projection shows it
    pub fn invalidate(&mut self) {
        self.cache.invalidate_endpoint(WORKLOGS_ENDPOINT);
    }
}
