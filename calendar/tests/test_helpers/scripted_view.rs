// calendar/tests/test_helpers/scripted_view.rs

use std::collections::VecDeque;
use worklog_calendar::interaction::Interaction;
use worklog_calendar::types::CalendarBlock;
use worklog_calendar::view::{CalendarView, FormSchema, FormValues, ViewOptions};

/// Plays back a list of interactions and form entries, remembering what it was shown
#[derive(Default)]
pub struct ScriptedView {
    interactions: VecDeque<Interaction>,
    forms: VecDeque<FormValues>,
    pub rendered: Vec<(Vec<CalendarBlock>, ViewOptions)>,
    pub prompted: Vec<FormSchema>,
}

impl ScriptedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, interaction: Interaction) -> Self {
        self.interactions.push_back(interaction);
        self
    }

    pub fn with_form(mut self, values: FormValues) -> Self {
        self.forms.push_back(values);
        self
    }

    pub fn last_blocks(&self) -> &[CalendarBlock] {
        self.rendered
            .last()
            .map(|(blocks, _)| blocks.as_slice())
            .unwrap_or_default()
    }
}

impl CalendarView for ScriptedView {
    fn render(&mut self, blocks: &[CalendarBlock], options: &ViewOptions) -> Option<Interaction> {
        self.rendered.push((blocks.to_vec(), options.clone()));
        self.interactions.pop_front()
    }

    fn prompt_fields(&mut self, schema: &FormSchema) -> FormValues {
        self.prompted.push(schema.clone());
        self.forms.pop_front().unwrap_or_default()
    }
}
