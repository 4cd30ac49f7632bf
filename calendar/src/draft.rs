//! The single in-progress edit of the calendar.
//!
//! [`DraftMachine`] owns at most one [`Draft`] and moves it through the states `Absent`,
//! `New` and `Editing`. It never talks to Jira: saving yields the list of [`RemoteCall`]s to
//! issue, and the draft is only dropped once the caller reports success through
//! [`DraftMachine::complete_save`]. Until then the saved values are held apart from the
//! draft, so a failed save leaves the draft untouched and the retry starts from what was typed.
use chrono::{DateTime, Duration, Utc};
use jira::models::core::IssueKey;
use jira::models::worklog::WorklogPatch;
use log::{debug, info};

use crate::date::{round_to_grid, DEFAULT_GRID_MINUTES};
use crate::error::CalendarError;
use crate::types::{CalendarBlock, WorklogEntry, WorklogRef, MIN_DURATION_SECONDS};

/// Block id of the draft in the calendar
pub const DRAFT_BLOCK_ID: &str = "draft";
/// A click in an empty slot creates a draft of this length
pub const NEW_DRAFT_SECONDS: i64 = 3600;

const NEW_DRAFT_TITLE: &str = "New worklog";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    New,
    Edit,
}

/// Values of an existing entry when the edit started, used to tell what changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub start: DateTime<Utc>,
    pub duration_seconds: i64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub mode: DraftMode,
    pub target: Option<WorklogRef>,
    pub issue_key: Option<IssueKey>,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub comment: String,
    pub selected_parent: Option<IssueKey>,
    pub baseline: Option<Baseline>,
}

impl Draft {
    fn new_at(start: DateTime<Utc>) -> Self {
        Draft {
            mode: DraftMode::New,
            target: None,
            issue_key: None,
            title: NEW_DRAFT_TITLE.to_string(),
            start,
            end: start + Duration::seconds(NEW_DRAFT_SECONDS),
            comment: String::new(),
            selected_parent: None,
            baseline: None,
        }
    }

    fn editing(entry: &WorklogEntry, title: String) -> Self {
        Draft {
            mode: DraftMode::Edit,
            target: Some(entry.reference()),
            issue_key: Some(entry.issue_key.clone()),
            title,
            start: entry.started,
            end: entry.end(),
            comment: entry.comment.clone(),
            selected_parent: None,
            baseline: Some(Baseline {
                start: entry.started,
                duration_seconds: entry.duration_seconds.max(MIN_DURATION_SECONDS),
                comment: entry.comment.clone(),
            }),
        }
    }

    #[must_use]
    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    /// The block drawn for this draft, always editable
    #[must_use]
    pub fn block(&self) -> CalendarBlock {
        CalendarBlock {
            block_id: DRAFT_BLOCK_ID.to_string(),
            title: self.title.clone(),
            start: self.start,
            end: self.end,
            is_editable: true,
            is_draft: true,
            source: self.target.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Absent,
    New,
    Editing,
}

/// What the user asked to save, already converted to UTC
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveRequest {
    pub issue_key: Option<String>,
    pub comment: String,
    pub start: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEvent {
    SlotClicked(DateTime<Utc>),
    OpenExisting {
        entry: WorklogEntry,
        title: String,
    },
    Reshape {
        block_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    SelectParent(Option<IssueKey>),
    Save(SaveRequest),
    Cancel,
}

/// A write to be issued against Jira
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Add {
        issue_key: IssueKey,
        started: DateTime<Utc>,
        duration_seconds: i64,
        comment: String,
    },
    Update {
        issue_key: IssueKey,
        worklog_id: String,
        patch: WorklogPatch,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoDraft,
    /// Committed entries can only be changed through a draft
    CommittedBlock,
}

/// Outcome of a [`DraftEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A new draft replaced whatever draft existed before
    Started { discarded: Option<Draft> },
    Reshaped,
    ParentSelected,
    Rejected(Rejection),
    SaveRequested(Vec<RemoteCall>),
    Cancelled(Option<Draft>),
}

#[derive(Debug)]
pub struct DraftMachine {
    grid_minutes: u32,
    current: Option<Draft>,
    /// The draft as last submitted, waiting for its remote calls to succeed
    pending: Option<Draft>,
}

impl Default for DraftMachine {
    fn default() -> Self {
        DraftMachine::new(DEFAULT_GRID_MINUTES)
    }
}

impl DraftMachine {
    #[must_use]
    pub fn new(grid_minutes: u32) -> Self {
        DraftMachine {
            grid_minutes,
            current: None,
            pending: None,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Draft> {
        self.current.as_ref()
    }

    /// What a save form should show: the last submitted values if a save is outstanding,
    /// otherwise the draft itself
    #[must_use]
    pub fn prefill(&self) -> Option<&Draft> {
        self.pending.as_ref().or(self.current.as_ref())
    }

    #[must_use]
    pub fn state(&self) -> DraftState {
        match self.current.as_ref().map(|d| d.mode) {
            None => DraftState::Absent,
            Some(DraftMode::New) => DraftState::New,
            Some(DraftMode::Edit) => DraftState::Editing,
        }
    }

    /// Applies one event to the draft.
    ///
    /// # Errors
    /// Returns [`CalendarError::Validation`] if a save request is incomplete, in which case
    /// the draft is left as it was
    pub fn apply(&mut self, event: DraftEvent) -> Result<Step, CalendarError> {
        match event {
            DraftEvent::SlotClicked(instant) => {
                let start = round_to_grid(instant, self.grid_minutes);
                debug!("New draft at {start}");
                Ok(self.start(Draft::new_at(start)))
            }
            DraftEvent::OpenExisting { entry, title } => {
                debug!("Editing {}", entry.reference());
                Ok(self.start(Draft::editing(&entry, title)))
            }
            DraftEvent::Reshape {
                block_id,
                start,
                end,
            } => Ok(self.reshape(&block_id, start, end)),
            DraftEvent::SelectParent(parent) => {
                if self.current.is_none() {
                    return Ok(Step::Rejected(Rejection::NoDraft));
                }
                for draft in self.drafts_mut() {
                    draft.selected_parent = parent.clone();
                }
                Ok(Step::ParentSelected)
            }
            DraftEvent::Save(request) => self.save(request).map(Step::SaveRequested),
            DraftEvent::Cancel => {
                self.pending = None;
                Ok(Step::Cancelled(self.current.take()))
            }
        }
    }

    /// Drops the draft once its remote calls have succeeded, returning it as it was saved
    pub fn complete_save(&mut self) -> Option<Draft> {
        let current = self.current.take();
        let saved = self.pending.take().or(current);
        if let Some(draft) = &saved {
            info!("Draft '{}' saved", draft.title);
        }
        saved
    }

    fn drafts_mut(&mut self) -> impl Iterator<Item = &mut Draft> {
        self.current.iter_mut().chain(self.pending.iter_mut())
    }

    fn start(&mut self, draft: Draft) -> Step {
        self.pending = None;
        let discarded = self.current.replace(draft);
        if let Some(d) = &discarded {
            info!("Unsaved draft '{}' discarded", d.title);
        }
        Step::Started { discarded }
    }

    fn reshape(&mut self, block_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Step {
        if block_id != DRAFT_BLOCK_ID {
            debug!("Refusing to reshape committed block {block_id}");
            return Step::Rejected(Rejection::CommittedBlock);
        }
        if self.current.is_none() {
            return Step::Rejected(Rejection::NoDraft);
        }
        let start = round_to_grid(start, self.grid_minutes);
        let end = round_to_grid(end, self.grid_minutes);
        let end = end.max(start + Duration::seconds(MIN_DURATION_SECONDS));
        for draft in self.drafts_mut() {
            draft.start = start;
            draft.end = end;
        }
        Step::Reshaped
    }

    fn save(&mut self, request: SaveRequest) -> Result<Vec<RemoteCall>, CalendarError> {
        let Some(draft) = self.current.as_ref() else {
            return Err(CalendarError::validation("there is no draft to save"));
        };

        let start = request.start.unwrap_or(draft.start);
        let duration = request
            .duration_seconds
            .unwrap_or_else(|| (draft.end - start).num_seconds());
        if duration <= 0 {
            return Err(CalendarError::validation("the selection has no length"));
        }
        let duration = duration.max(MIN_DURATION_SECONDS);
        let end = Duration::try_seconds(duration)
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| CalendarError::validation(format!("a duration of {duration}s is too long")))?;

        let mut saved = draft.clone();
        saved.start = start;
        saved.end = end;
        saved.comment.clone_from(&request.comment);

        let calls = match saved.mode {
            DraftMode::New => {
                let issue_key = match request.issue_key.as_deref().map(str::trim) {
                    Some(key) if !key.is_empty() => IssueKey::parse(key)
                        .map_err(|e| CalendarError::validation(e.to_string()))?,
                    _ => saved
                        .issue_key
                        .clone()
                        .ok_or_else(|| CalendarError::validation("an issue key is required"))?,
                };
                saved.issue_key = Some(issue_key.clone());
                vec![RemoteCall::Add {
                    issue_key,
                    started: start,
                    duration_seconds: duration,
                    comment: request.comment,
                }]
            }
            DraftMode::Edit => {
                let (Some(target), Some(baseline)) = (&saved.target, &saved.baseline) else {
                    return Err(CalendarError::validation("the edited entry is unknown"));
                };
                let patch = WorklogPatch {
                    started: (start != baseline.start).then_some(start),
                    time_spent_seconds: (duration != baseline.duration_seconds).then_some(duration),
                    comment: (!request.comment.is_empty() && request.comment != baseline.comment)
                        .then_some(request.comment),
                };
                if patch.is_empty() {
                    debug!("Nothing has changed in {target}");
                    vec![]
                } else {
                    vec![RemoteCall::Update {
                        issue_key: target.issue_key.clone(),
                        worklog_id: target.worklog_id.clone(),
                        patch,
                    }]
                }
            }
        };

        self.pending = Some(saved);
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn entry() -> WorklogEntry {
        WorklogEntry {
            issue_key: IssueKey::parse("ABC-7").unwrap(),
            worklog_id: "100".to_string(),
            author_id: "me".to_string(),
            started: at(13, 0),
            duration_seconds: 1800,
            comment: "review".to_string(),
        }
    }

    fn reshape(start: DateTime<Utc>, end: DateTime<Utc>) -> DraftEvent {
        DraftEvent::Reshape {
            block_id: DRAFT_BLOCK_ID.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_click_creates_one_hour_draft() {
        let mut machine = DraftMachine::default();
        let step = machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        assert_eq!(step, Step::Started { discarded: None });
        let draft = machine.current().unwrap();
        assert_eq!(draft.mode, DraftMode::New);
        assert_eq!((draft.start, draft.end), (at(9, 0), at(10, 0)));
        assert_eq!(machine.state(), DraftState::New);
    }

    #[test]
    fn test_click_is_snapped_to_grid() {
        let mut machine = DraftMachine::default();
        let click = Utc.with_ymd_and_hms(2025, 3, 10, 9, 3, 27).unwrap();
        machine.apply(DraftEvent::SlotClicked(click)).unwrap();
        assert_eq!(machine.current().unwrap().start, at(9, 0));
    }

    #[test]
    fn test_new_draft_discards_previous_observably() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        let step = machine
            .apply(DraftEvent::OpenExisting {
                entry: entry(),
                title: "ABC-7 · Review".to_string(),
            })
            .unwrap();
        let Step::Started {
            discarded: Some(previous),
        } = step
        else {
            panic!("Expected the first draft to be discarded");
        };
        assert_eq!(previous.start, at(9, 0));
        assert_eq!(machine.state(), DraftState::Editing);
    }

    #[test]
    fn test_reshape_updates_times_and_keeps_mode() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        assert_eq!(machine.apply(reshape(at(9, 5), at(10, 20))).unwrap(), Step::Reshaped);
        let draft = machine.current().unwrap();
        assert_eq!((draft.start, draft.end), (at(9, 5), at(10, 20)));
        assert_eq!(draft.mode, DraftMode::New);
    }

    #[test]
    fn test_reshape_enforces_one_minute_floor() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        machine.apply(reshape(at(9, 30), at(9, 30))).unwrap();
        assert_eq!(machine.current().unwrap().duration_seconds(), 60);
    }

    #[test]
    fn test_reshape_of_committed_block_is_rejected() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        let before = machine.current().cloned();
        let step = machine
            .apply(DraftEvent::Reshape {
                block_id: "ABC-7::100".to_string(),
                start: at(11, 0),
                end: at(12, 0),
            })
            .unwrap();
        assert_eq!(step, Step::Rejected(Rejection::CommittedBlock));
        assert_eq!(machine.current().cloned(), before);
    }

    #[test]
    fn test_reshape_without_draft_is_rejected() {
        let mut machine = DraftMachine::default();
        let step = machine.apply(reshape(at(9, 0), at(10, 0))).unwrap();
        assert_eq!(step, Step::Rejected(Rejection::NoDraft));
    }

    #[test]
    fn test_save_new_draft_requests_one_add() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        machine.apply(reshape(at(9, 5), at(10, 20))).unwrap();
        let step = machine
            .apply(DraftEvent::Save(SaveRequest {
                issue_key: Some("abc-123".to_string()),
                comment: "test".to_string(),
                ..SaveRequest::default()
            }))
            .unwrap();
        assert_eq!(
            step,
            Step::SaveRequested(vec![RemoteCall::Add {
                issue_key: IssueKey::parse("ABC-123").unwrap(),
                started: at(9, 5),
                duration_seconds: 4500,
                comment: "test".to_string(),
            }])
        );
        // Kept until the write has succeeded
        assert_eq!(machine.state(), DraftState::New);
        assert!(machine.complete_save().is_some());
        assert_eq!(machine.state(), DraftState::Absent);
    }

    #[test]
    fn test_save_without_issue_key_is_invalid() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        let result = machine.apply(DraftEvent::Save(SaveRequest {
            issue_key: Some("  ".to_string()),
            ..SaveRequest::default()
        }));
        assert!(matches!(result, Err(CalendarError::Validation(_))));
        assert_eq!(machine.state(), DraftState::New);
    }

    #[test]
    fn test_save_without_draft_is_invalid() {
        let mut machine = DraftMachine::default();
        let result = machine.apply(DraftEvent::Save(SaveRequest::default()));
        assert!(matches!(result, Err(CalendarError::Validation(_))));
    }

    #[test]
    fn test_zero_length_selection_is_invalid() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        let result = machine.apply(DraftEvent::Save(SaveRequest {
            issue_key: Some("ABC-1".to_string()),
            duration_seconds: Some(0),
            ..SaveRequest::default()
        }));
        assert!(matches!(result, Err(CalendarError::Validation(_))));
    }

    #[test]
    fn test_edit_sends_only_changed_fields_in_one_update() {
        let mut machine = DraftMachine::default();
        machine
            .apply(DraftEvent::OpenExisting {
                entry: entry(),
                title: "ABC-7 · Review".to_string(),
            })
            .unwrap();
        machine.apply(reshape(at(14, 0), at(15, 0))).unwrap();
        let step = machine
            .apply(DraftEvent::Save(SaveRequest {
                comment: "review".to_string(),
                ..SaveRequest::default()
            }))
            .unwrap();
        assert_eq!(
            step,
            Step::SaveRequested(vec![RemoteCall::Update {
                issue_key: IssueKey::parse("ABC-7").unwrap(),
                worklog_id: "100".to_string(),
                patch: WorklogPatch {
                    started: Some(at(14, 0)),
                    time_spent_seconds: Some(3600),
                    comment: None,
                },
            }])
        );
    }

    #[test]
    fn test_unchanged_edit_requests_nothing() {
        let mut machine = DraftMachine::default();
        machine
            .apply(DraftEvent::OpenExisting {
                entry: entry(),
                title: "ABC-7 · Review".to_string(),
            })
            .unwrap();
        let step = machine
            .apply(DraftEvent::Save(SaveRequest {
                comment: "review".to_string(),
                ..SaveRequest::default()
            }))
            .unwrap();
        assert_eq!(step, Step::SaveRequested(vec![]));
    }

    #[test]
    fn test_parent_selection_is_not_a_transition() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        let epic = IssueKey::parse("ABC-1").unwrap();
        let step = machine
            .apply(DraftEvent::SelectParent(Some(epic.clone())))
            .unwrap();
        assert_eq!(step, Step::ParentSelected);
        machine.apply(DraftEvent::SelectParent(None)).unwrap();
        machine.apply(DraftEvent::SelectParent(Some(epic.clone()))).unwrap();
        let draft = machine.current().unwrap();
        assert_eq!(draft.selected_parent, Some(epic));
        assert_eq!(machine.state(), DraftState::New);
    }

    #[test]
    fn test_cancel_returns_the_draft() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        let Step::Cancelled(Some(draft)) = machine.apply(DraftEvent::Cancel).unwrap() else {
            panic!("Expected the draft to be cancelled");
        };
        assert_eq!(draft.start, at(9, 0));
        assert_eq!(machine.state(), DraftState::Absent);
    }

    #[test]
    fn test_oversized_duration_is_invalid() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        let before = machine.current().cloned();
        let result = machine.apply(DraftEvent::Save(SaveRequest {
            issue_key: Some("ABC-123".to_string()),
            duration_seconds: Some(i64::MAX),
            ..SaveRequest::default()
        }));
        assert!(matches!(result, Err(CalendarError::Validation(_))));
        assert_eq!(machine.current().cloned(), before);
        assert_eq!(machine.prefill().cloned(), before);
    }

    #[test]
    fn test_submitted_values_stay_apart_until_saved() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        machine
            .apply(DraftEvent::Save(SaveRequest {
                issue_key: Some("ABC-123".to_string()),
                comment: "first try".to_string(),
                start: Some(at(8, 0)),
                duration_seconds: Some(1800),
            }))
            .unwrap();

        let draft = machine.current().unwrap();
        assert_eq!((draft.start, draft.end), (at(9, 0), at(10, 0)));
        assert_eq!(draft.comment, "");
        assert_eq!(draft.issue_key, None);

        let prefill = machine.prefill().unwrap();
        assert_eq!((prefill.start, prefill.end), (at(8, 0), at(8, 30)));
        assert_eq!(prefill.comment, "first try");

        let saved = machine.complete_save().unwrap();
        assert_eq!(saved.issue_key, Some(IssueKey::parse("ABC-123").unwrap()));
        assert_eq!(saved.duration_seconds(), 1800);
        assert!(machine.prefill().is_none());
    }

    #[test]
    fn test_reshape_after_submit_moves_the_prefill_too() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        machine
            .apply(DraftEvent::Save(SaveRequest {
                issue_key: Some("ABC-123".to_string()),
                comment: "first try".to_string(),
                ..SaveRequest::default()
            }))
            .unwrap();
        machine.apply(reshape(at(11, 0), at(11, 45))).unwrap();

        let prefill = machine.prefill().unwrap();
        assert_eq!((prefill.start, prefill.end), (at(11, 0), at(11, 45)));
        assert_eq!(prefill.comment, "first try");
        assert_eq!(machine.current().unwrap().start, at(11, 0));
    }

    #[test]
    fn test_new_draft_forgets_the_submitted_values() {
        let mut machine = DraftMachine::default();
        machine.apply(DraftEvent::SlotClicked(at(9, 0))).unwrap();
        machine
            .apply(DraftEvent::Save(SaveRequest {
                issue_key: Some("ABC-123".to_string()),
                comment: "first try".to_string(),
                ..SaveRequest::default()
            }))
            .unwrap();
        machine.apply(DraftEvent::SlotClicked(at(14, 0))).unwrap();
        assert_eq!(machine.prefill().unwrap().comment, "");
    }
}
