//! Calendar arithmetic: the snapping grid, local wall clock conversion and the visible week.
//!
//! All instants are kept in UTC. A time zone only enters when a local date or
//! wall clock time has to be interpreted.
use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::CalendarError;

pub use jira::date::{parse_flexible, to_wire, TimestampError};

/// Pointer positions are snapped down to this many minutes unless configured otherwise
pub const DEFAULT_GRID_MINUTES: u32 = 5;

/// Truncates `instant` down to the nearest multiple of `minutes`, clearing seconds and
/// sub-seconds. A grid of zero minutes is treated as one minute.
///
/// The grid is computed on minutes since the epoch, which equals the local grid in every
/// time zone whose offset is a whole multiple of the grid.
#[must_use]
pub fn round_to_grid(instant: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    let step = i64::from(minutes.max(1)) * 60;
    let seconds = instant.timestamp();
    let floored = seconds - seconds.rem_euclid(step);
    DateTime::from_timestamp(floored, 0).unwrap_or(instant)
}

/// Interprets a wall clock time entered by the user in the time zone `tz`.
///
/// In the autumn fold the earlier of the two instants is chosen.
///
/// # Errors
/// Returns [`CalendarError::Validation`] if the time does not exist, i.e. it falls into the
/// gap of a spring forward transition
pub fn localize(wall_clock: NaiveDateTime, tz: &Tz) -> Result<DateTime<Utc>, CalendarError> {
    match tz.from_local_datetime(&wall_clock) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(CalendarError::validation(format!(
            "{wall_clock} does not exist in {tz}"
        ))),
    }
}

/// Formats a number of seconds as `1h 15m`, `2h` or `45m`
#[must_use]
pub fn human_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    match (hours, minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// First instant of `date` in `tz`. Some zones skip midnight when entering summer time, the
/// first existing hour is used then.
fn start_of_day(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    (0..=3)
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|wall_clock| tz.from_local_datetime(&wall_clock).earliest())
        .map_or_else(
            || date.and_time(chrono::NaiveTime::MIN).and_utc(),
            |dt| dt.with_timezone(&Utc),
        )
}

/// The week shown in the calendar, from local Monday 00:00 up to the following Monday 00:00
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl VisibleRange {
    /// The week holding `instant`, as seen from `tz`
    #[must_use]
    pub fn week_containing(instant: DateTime<Utc>, tz: &Tz) -> Self {
        Self::week_of(instant.with_timezone(tz).date_naive(), tz)
    }

    /// The week holding the local `date`
    #[must_use]
    pub fn week_of(date: NaiveDate, tz: &Tz) -> Self {
        let monday = date
            .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
            .unwrap_or(date);
        let next_monday = monday.checked_add_days(Days::new(7)).unwrap_or(monday);
        VisibleRange {
            start: start_of_day(monday, tz),
            end: start_of_day(next_monday, tz),
        }
    }

    #[must_use]
    pub fn previous(&self, tz: &Tz) -> Self {
        let monday = self.first_day(tz);
        Self::week_of(monday.checked_sub_days(Days::new(7)).unwrap_or(monday), tz)
    }

    #[must_use]
    pub fn next(&self, tz: &Tz) -> Self {
        let monday = self.first_day(tz);
        Self::week_of(monday.checked_add_days(Days::new(7)).unwrap_or(monday), tz)
    }

    /// Inclusive at both ends
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Local date of the Monday starting this week
    #[must_use]
    pub fn first_day(&self, tz: &Tz) -> NaiveDate {
        self.start.with_timezone(tz).date_naive()
    }

    /// The UTC dates used in `worklogDate` clauses. Jira compares the dates in the time zone
    /// of the requesting user, so the range is widened by a day on each side and the exact
    /// filtering is left to the caller.
    #[must_use]
    pub fn query_dates(&self) -> (NaiveDate, NaiveDate) {
        let first = self.start.date_naive();
        let last = self.end.date_naive();
        (
            first.checked_sub_days(Days::new(1)).unwrap_or(first),
            last.checked_add_days(Days::new(1)).unwrap_or(last),
        )
    }
}
