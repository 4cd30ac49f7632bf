//! Discovers how the epic link of an issue is referenced in JQL.
//!
//! Company managed projects link issues to epics through the "Epic Link" custom field, whose
//! id differs between Jira sites and whose name depends on the language of the user. Team
//! managed projects use the `parent` field. The catalog of fields tells us the id.
use std::sync::Arc;
use std::time::Duration;

use jira::jql::JqlField;
use jira::models::field::Field;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::cache::{CacheKey, Clock, TtlCache};
use crate::error::CalendarError;
use crate::gateway::WorklogGateway;

/// Schema marker of the epic link custom field
pub const EPIC_LINK_MARKER: &str = "com.pyxis.greenhopper.jira:gh-epic-link";
/// Used whenever the field catalog does not tell us better
pub const EPIC_LINK_FALLBACK: &str = "Epic Link";
pub const PARENT_FIELD: &str = "parent";

const FIELD_ENDPOINT: &str = "field";

lazy_static! {
    static ref CUSTOM_FIELD_ID: Regex = Regex::new(r"^customfield_(\d+)$").unwrap();
}

/// Picks the epic link field from the catalog. Falls back to `"Epic Link"` if no field carries
/// the epic link marker.
#[must_use]
pub fn token_from_catalog(fields: &[Field]) -> JqlField {
    let Some(field) = fields.iter().find(|f| f.has_custom_marker(EPIC_LINK_MARKER)) else {
        let failure = CalendarError::SchemaResolution(format!(
            "no field carries the marker {EPIC_LINK_MARKER}"
        ));
        warn!("{failure}, using \"{EPIC_LINK_FALLBACK}\"");
        return JqlField::named(EPIC_LINK_FALLBACK);
    };

    let numeric_id = CUSTOM_FIELD_ID
        .captures(&field.id)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok());
    match numeric_id {
        Some(id) => JqlField::custom_id(id),
        None => JqlField::named(&field.name),
    }
}

/// The ways of saying "is a child of" in JQL, in the order they should be tried.
/// Duplicates are removed, the resolved token may well be the fallback.
#[must_use]
pub fn parent_link_strategies(resolved: &JqlField) -> Vec<JqlField> {
    let mut strategies = vec![JqlField::named(PARENT_FIELD)];
    for candidate in [resolved.clone(), JqlField::named(EPIC_LINK_FALLBACK)] {
        if !strategies.contains(&candidate) {
            strategies.push(candidate);
        }
    }
    strategies
}

/// Resolves the epic link field once and remembers it for the schema time to live
pub struct ParentFieldResolver {
    cache: TtlCache<JqlField>,
}

impl ParentFieldResolver {
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        ParentFieldResolver {
            cache: TtlCache::new(ttl, clock),
        }
    }

    /// Never fails. A failing catalog request is logged and the fallback is returned, without
    /// caching it, so the next call tries again.
    pub async fn resolve(&mut self, gateway: &dyn WorklogGateway) -> JqlField {
        let key = CacheKey::new(FIELD_ENDPOINT, Vec::<String>::new());
        if let Some(token) = self.cache.get(&key) {
            return token;
        }

        match gateway.fields().await {
            Ok(fields) => {
                let token = token_from_catalog(&fields);
                debug!("Epic link field resolved to {token}");
                self.cache.insert(key, token.clone());
                token
            }
            Err(e) => {
                let failure = CalendarError::SchemaResolution(e.to_string());
                warn!("{failure}, using \"{EPIC_LINK_FALLBACK}\"");
                JqlField::named(EPIC_LINK_FALLBACK)
            }
        }
    }
}
