use crate::cache::{CacheKey, Clock, TtlCache};
use crate::gateway::WorklogGateway;
use crate::types::Person;
use jira::JiraError;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

pub const USERS_ENDPOINT: &str = "users";
pub const MAX_USERS: u32 = 20;

/// Finds the people whose worklogs may be displayed
#[allow(clippy::module_name_repetitions)]
pub struct UserService {
    gateway: Arc<dyn WorklogGateway>,
    cache: TtlCache<Vec<Person>>,
}

#[allow(clippy::module_name_repetitions)]
impl UserService {
    pub fn new(gateway: Arc<dyn WorklogGateway>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            cache: TtlCache::new(ttl, clock),
        }
    }

    /// Active users matching `query` by name or e-mail address.
    ///
    /// Searching users requires the "browse users" permission. Without it the user picker is
    /// tried, and as a last resort the current user is returned, so one can always see
    /// one's own worklogs.
    ///
    /// # Errors
    /// The failure of the last lookup, if every lookup failed
    pub async fn find_people(&mut self, query: &str) -> Result<Vec<Person>, JiraError> {
        let key = CacheKey::new(USERS_ENDPOINT, [query.trim().to_lowercase()]);
        if let Some(people) = self.cache.get(&key) {
            return Ok(people);
        }

        let users = match self.gateway.search_users(query, MAX_USERS).await {
            Ok(users) => users,
            Err(e) => {
                warn!("User search failed, trying the user picker: {e}");
                match self.gateway.pick_users(query, MAX_USERS).await {
                    Ok(users) => users,
                    Err(e) => {
                        warn!("User picker failed, falling back to the current user: {e}");
                        vec![self.gateway.current_user().await?]
                    }
                }
            }
        };

        let people: Vec<Person> = users
            .into_iter()
            .filter(|u| u.active)
            .map(Person::from)
            .collect();
        debug!("{} people match '{query}'", people.len());
        self.cache.insert(key, people.clone());
        Ok(people)
    }

    /// The owner of the credentials
    ///
    /// # Errors
    /// Any remote failure
    pub async fn current_person(&self) -> Result<Person, JiraError> {
        Ok(Person::from(self.gateway.current_user().await?))
    }
}
