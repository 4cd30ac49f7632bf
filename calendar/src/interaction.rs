use chrono::{DateTime, NaiveDate, Utc};
use log::debug;

/// Movement of the visible week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
    Today,
    JumpTo(NaiveDate),
}

/// Events emitted by the calendar view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    SlotClicked(DateTime<Utc>),
    BlockClicked(String),
    BlockChanged {
        block_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Issue key of the epic narrowing the candidate issues, `None` to clear it
    ParentSelected(Option<String>),
    Submit,
    Cancel,
    Navigate(Navigation),
}

/// Drops a pointer event identical to the last one admitted of the same kind. The view may
/// deliver pointer events twice.
///
/// Slot clicks, block clicks and block changes are remembered separately, so a replay is
/// recognised even when an event of another kind arrived in between.
#[derive(Debug, Default)]
pub struct Deduplicator {
    slot_clicked: Option<Interaction>,
    block_clicked: Option<Interaction>,
    block_changed: Option<Interaction>,
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the event unless it is a replay
    pub fn admit(&mut self, interaction: Interaction) -> Option<Interaction> {
        let Some(last) = self.last_of_kind(&interaction) else {
            return Some(interaction);
        };
        if last.as_ref() == Some(&interaction) {
            debug!("Dropping replayed {interaction:?}");
            return None;
        }
        *last = Some(interaction.clone());
        Some(interaction)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn last_of_kind(&mut self, interaction: &Interaction) -> Option<&mut Option<Interaction>> {
        match interaction {
            Interaction::SlotClicked(_) => Some(&mut self.slot_clicked),
            Interaction::BlockClicked(_) => Some(&mut self.block_clicked),
            Interaction::BlockChanged { .. } => Some(&mut self.block_changed),
            _ => None,
        }
    }
}
