// calendar/tests/test_helpers/common.rs

use super::fake_jira::{FakeJira, ME, MY_NAME};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use worklog_calendar::cache::Clock;
use worklog_calendar::config::AppConfiguration;
use worklog_calendar::types::Person;
use worklog_calendar::Session;

/// A clock which only moves when told to
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        FixedClock {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// An instant on Monday 2025-03-10, UTC
pub fn monday(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
}

pub fn me() -> Person {
    Person {
        account_id: ME.to_string(),
        display_name: MY_NAME.to_string(),
    }
}

/// A session on the week of 2025-03-10 in UTC, showing the worklogs of [`me`]
pub fn session_for(jira: &Arc<FakeJira>) -> (Session, Arc<FixedClock>) {
    let _ = env_logger::builder().is_test(true).try_init();

    let clock = Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2025, 3, 12, 12, 0, 0).unwrap()));
    let mut session = Session::new(
        Arc::clone(jira) as Arc<dyn worklog_calendar::gateway::WorklogGateway>,
        &AppConfiguration::default(),
        Arc::clone(&clock) as Arc<dyn Clock>,
    )
    .expect("The default configuration is valid");
    session.select_person(me());
    (session, clock)
}
