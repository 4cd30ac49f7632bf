//! One interactive calendar session.
//!
//! [`Session`] holds everything that lives as long as the user keeps the calendar open: the
//! selected person and time zone, the visible week, the draft and the caches. Interactions
//! are handled one at a time, each remote call awaited before the next one is issued.
use std::sync::Arc;

use chrono_tz::Tz;
use jira::models::core::IssueKey;
use jira::models::issue::IssueSummary;
use jira::Jira;
use log::{debug, error, info, warn};

use crate::cache::{Clock, SystemClock};
use crate::config::{AppConfiguration, CalendarConfig};
use crate::date::{human_duration, localize, VisibleRange};
use crate::draft::{
    Draft, DraftEvent, DraftMachine, DraftState, RemoteCall, SaveRequest, Step, DRAFT_BLOCK_ID,
};
use crate::error::CalendarError;
use crate::gateway::WorklogGateway;
use crate::interaction::{Deduplicator, Interaction, Navigation};
use crate::projection::{build_blocks, Projection};
use crate::service::issue::IssueService;
use crate::service::user::UserService;
use crate::types::{CalendarBlock, CommittedWorklog, Person};
use crate::view::{CalendarView, FormSchema, FormValues, Notice, ViewOptions};

pub struct Session {
    gateway: Arc<dyn WorklogGateway>,
    settings: CalendarConfig,
    timezone: Tz,
    person: Option<Person>,
    range: VisibleRange,
    drafts: DraftMachine,
    dedup: Deduplicator,
    projection: Projection,
    issues: IssueService,
    users: UserService,
    clock: Arc<dyn Clock>,
    committed: Vec<CommittedWorklog>,
    notices: Vec<Notice>,
}

impl Session {
    /// Creates a session showing the current week in the configured time zone.
    ///
    /// # Errors
    /// Returns [`CalendarError::UnknownTimeZone`] if the configured time zone is unknown
    pub fn new(
        gateway: Arc<dyn WorklogGateway>,
        config: &AppConfiguration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CalendarError> {
        let timezone = config.calendar.timezone()?;
        let range = VisibleRange::week_containing(clock.now(), &timezone);
        let cache = &config.cache;
        Ok(Session {
            issues: IssueService::new(
                Arc::clone(&gateway),
                cache.issues_ttl(),
                cache.schema_ttl(),
                Arc::clone(&clock),
            ),
            users: UserService::new(Arc::clone(&gateway), cache.users_ttl(), Arc::clone(&clock)),
            projection: Projection::new(cache.worklogs_ttl(), Arc::clone(&clock)),
            drafts: DraftMachine::new(config.calendar.grid_minutes),
            dedup: Deduplicator::new(),
            settings: config.calendar.clone(),
            gateway,
            timezone,
            person: None,
            range,
            clock,
            committed: Vec::new(),
            notices: Vec::new(),
        })
    }

    /// A session talking to the Jira instance of the configuration
    ///
    /// # Errors
    /// Fails if the Jira settings are incomplete or invalid, or the time zone is unknown
    pub fn from_config(config: &AppConfiguration) -> Result<Self, CalendarError> {
        let jira = Jira::builder().from_config(&config.jira).build()?;
        Session::new(Arc::new(jira), config, Arc::new(SystemClock))
    }

    pub fn select_person(&mut self, person: Person) {
        if self.person.as_ref() != Some(&person) {
            info!("Showing worklogs of {person}");
            self.person = Some(person);
            self.committed.clear();
            self.dedup.reset();
        }
    }

    /// Selects the owner of the credentials
    ///
    /// # Errors
    /// Any remote failure
    pub async fn select_current_user(&mut self) -> Result<Person, CalendarError> {
        let person = self.users.current_person().await?;
        self.select_person(person.clone());
        Ok(person)
    }

    /// People matching `query`. A failure is reported as a warning and yields nobody.
    pub async fn search_people(&mut self, query: &str) -> Vec<Person> {
        match self.users.find_people(query).await {
            Ok(people) => people,
            Err(e) => {
                self.warn(format!("Unable to search for people: {e}"));
                vec![]
            }
        }
    }

    /// Keeps showing the same local week in the new time zone
    pub fn select_timezone(&mut self, timezone: Tz) {
        let first_day = self.range.first_day(&self.timezone);
        self.timezone = timezone;
        self.range = VisibleRange::week_of(first_day, &timezone);
    }

    pub fn navigate(&mut self, navigation: Navigation) {
        let tz = &self.timezone;
        self.range = match navigation {
            Navigation::Previous => self.range.previous(tz),
            Navigation::Next => self.range.next(tz),
            Navigation::Today => VisibleRange::week_containing(self.clock.now(), tz),
            Navigation::JumpTo(date) => VisibleRange::week_of(date, tz),
        };
        debug!("Visible range is now {} - {}", self.range.start, self.range.end);
    }

    /// The blocks of the visible week. Failing to load the worklogs leaves only the draft
    /// and a warning.
    pub async fn project(&mut self) -> Vec<CalendarBlock> {
        self.committed = match self.person.clone() {
            None => vec![],
            Some(person) => {
                let result = self
                    .projection
                    .committed(self.gateway.as_ref(), &person, &self.range)
                    .await;
                result.unwrap_or_else(|e| {
                    self.warn(format!("Unable to load the worklogs: {e}"));
                    vec![]
                })
            }
        };
        build_blocks(&self.committed, self.drafts.current())
    }

    /// Options for the next render, the pending notices are handed over
    pub fn view_options(&mut self) -> ViewOptions {
        ViewOptions {
            timezone: self.timezone,
            range: self.range,
            grid_minutes: self.settings.grid_minutes,
            slot_min_time: self.settings.slot_min_time,
            slot_max_time: self.settings.slot_max_time,
            notices: self.take_notices(),
        }
    }

    /// Everything the save form of the current draft displays. After a failed save the
    /// values submitted last are shown again.
    ///
    /// # Errors
    /// Returns [`CalendarError::Validation`] if there is no draft
    pub async fn form_schema(&mut self) -> Result<FormSchema, CalendarError> {
        let draft = self
            .drafts
            .prefill()
            .cloned()
            .ok_or_else(|| CalendarError::validation("there is no draft to save"))?;

        let candidate_issues = match self.person.clone() {
            Some(person) => {
                let result = self
                    .issues
                    .candidates(&person, draft.selected_parent.as_ref())
                    .await;
                self.or_warn(result, "Unable to load the issues")
            }
            None => vec![],
        };
        let result = self.issues.epics().await;
        let parents = self.or_warn(result, "Unable to load the epics");

        Ok(FormSchema {
            mode: draft.mode,
            start: draft.start,
            end: draft.end,
            timezone: self.timezone,
            issue_key: draft.issue_key.clone(),
            candidate_issues,
            parents,
            selected_parent: draft.selected_parent.clone(),
            comment: draft.comment.clone(),
            duration_minutes: draft.duration_seconds() / 60,
        })
    }

    /// Processes one interaction to completion.
    ///
    /// Returns the step taken by the draft, if the interaction concerned the draft.
    ///
    /// # Errors
    /// Validation and save failures. The session stays usable, a failed save keeps the draft.
    pub async fn handle(
        &mut self,
        interaction: Interaction,
        view: &mut dyn CalendarView,
    ) -> Result<Option<Step>, CalendarError> {
        let Some(interaction) = self.dedup.admit(interaction) else {
            return Ok(None);
        };

        match interaction {
            Interaction::SlotClicked(instant) => {
                self.drafts.apply(DraftEvent::SlotClicked(instant)).map(Some)
            }
            Interaction::BlockClicked(block_id) => {
                if block_id == DRAFT_BLOCK_ID {
                    return Ok(None);
                }
                let committed = self
                    .committed
                    .iter()
                    .find(|c| c.entry.reference().block_id() == block_id)
                    .cloned()
                    .ok_or(CalendarError::UnknownBlock(block_id))?;
                self.drafts
                    .apply(DraftEvent::OpenExisting {
                        title: committed.title(),
                        entry: committed.entry,
                    })
                    .map(Some)
            }
            Interaction::BlockChanged {
                block_id,
                start,
                end,
            } => self
                .drafts
                .apply(DraftEvent::Reshape {
                    block_id,
                    start,
                    end,
                })
                .map(Some),
            Interaction::ParentSelected(parent) => {
                let parent = parent.as_deref().and_then(|p| IssueKey::parse(p).ok());
                self.drafts.apply(DraftEvent::SelectParent(parent)).map(Some)
            }
            Interaction::Submit => {
                let schema = self.form_schema().await?;
                let values = view.prompt_fields(&schema);
                self.save(values).await.map(Some)
            }
            Interaction::Cancel => self.drafts.apply(DraftEvent::Cancel).map(Some),
            Interaction::Navigate(navigation) => {
                self.navigate(navigation);
                Ok(None)
            }
        }
    }

    /// Writes the draft to Jira.
    ///
    /// On success the draft is dropped and the cached worklogs are invalidated, so the next
    /// projection shows the write.
    ///
    /// # Errors
    /// [`CalendarError::Validation`] if the values are incomplete, [`CalendarError::Remote`]
    /// if Jira refused the write. The draft is kept in both cases.
    pub async fn save(&mut self, values: FormValues) -> Result<Step, CalendarError> {
        let start = values
            .start_override
            .map(|wall_clock| localize(wall_clock, &self.timezone))
            .transpose()?;
        let duration_seconds = values
            .duration_minutes
            .map(|minutes| {
                minutes.checked_mul(60).ok_or_else(|| {
                    CalendarError::validation(format!("{minutes} minutes is too long"))
                })
            })
            .transpose()?;
        let request = SaveRequest {
            issue_key: values.issue_key,
            comment: values.comment,
            start,
            duration_seconds,
        };

        let step = self.drafts.apply(DraftEvent::Save(request))?;
        let Step::SaveRequested(calls) = &step else {
            return Ok(step);
        };

        let mut written = 0;
        for call in calls {
            if let Err(e) = self.execute(call).await {
                error!("Saving the draft failed: {e}");
                if written > 0 {
                    self.projection.invalidate();
                }
                return Err(e.into());
            }
            written += 1;
        }

        if written > 0 {
            self.projection.invalidate();
        }
        if let Some(saved) = self.drafts.complete_save() {
            self.notices.push(Self::saved_notice(&saved, written));
        }
        Ok(step)
    }

    /// Renders and handles interactions until the view ends the session.
    /// Errors are shown to the user, none of them ends the session.
    pub async fn run(&mut self, view: &mut dyn CalendarView) {
        loop {
            let blocks = self.project().await;
            let options = self.view_options();
            let Some(interaction) = view.render(&blocks, &options) else {
                info!("Calendar closed");
                break;
            };
            if let Err(e) = self.handle(interaction, view).await {
                warn!("{e}");
                self.notices.push(Notice::error(e.to_string()));
            }
        }
    }

    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.drafts.current()
    }

    #[must_use]
    pub fn draft_state(&self) -> DraftState {
        self.drafts.state()
    }

    #[must_use]
    pub fn range(&self) -> VisibleRange {
        self.range
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    #[must_use]
    pub fn person(&self) -> Option<&Person> {
        self.person.as_ref()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    async fn execute(&self, call: &RemoteCall) -> Result<(), jira::JiraError> {
        match call {
            RemoteCall::Add {
                issue_key,
                started,
                duration_seconds,
                comment,
            } => {
                let worklog = self
                    .gateway
                    .add_worklog(issue_key, *started, *duration_seconds, comment)
                    .await?;
                info!("Added worklog {} to {issue_key}", worklog.id);
            }
            RemoteCall::Update {
                issue_key,
                worklog_id,
                patch,
            } => {
                self.gateway
                    .update_worklog(issue_key, worklog_id, patch)
                    .await?;
                info!("Updated worklog {worklog_id} of {issue_key}");
            }
        }
        Ok(())
    }

    fn saved_notice(saved: &Draft, written: usize) -> Notice {
        if written == 0 {
            return Notice::info("Nothing has changed");
        }
        let issue = saved
            .issue_key
            .as_ref()
            .map_or_else(String::new, ToString::to_string);
        Notice::info(format!(
            "Saved {} on {issue}",
            human_duration(saved.duration_seconds())
        ))
    }

    fn or_warn(
        &mut self,
        result: Result<Vec<IssueSummary>, jira::JiraError>,
        context: &str,
    ) -> Vec<IssueSummary> {
        result.unwrap_or_else(|e| {
            self.warn(format!("{context}: {e}"));
            vec![]
        })
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.notices.push(Notice::warning(message));
    }
}
