use std::{
    cmp::Ordering,
    fmt::{self, Formatter},
};

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize,
};

use crate::JiraError;

/// Who wrote a worklog
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Hash, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub account_id: String,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name: String,
}

/// The subset of issue fields we ask Jira for
#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Fields {
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
}

/// Reference to the parent (epic) of an issue, as embedded in the `parent` field
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ParentRef {
    pub key: IssueKey,
}

/// Key of an issue, e.g. `ABC-123`. Always held in upper case.
#[derive(Debug, Serialize, Eq, PartialEq, Hash, Clone)]
pub struct IssueKey {
    #[serde(rename = "key")]
    value: String,
}

impl IssueKey {
    /// Creates an issue key from user supplied text, which is trimmed and upper-cased.
    ///
    /// # Errors
    /// Returns [`JiraError::RequiredParameter`] if the supplied value is blank
    pub fn parse(input: &str) -> Result<Self, JiraError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(JiraError::RequiredParameter("issue key".to_string()));
        }
        Ok(IssueKey {
            value: trimmed.to_uppercase(),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl TryFrom<&str> for IssueKey {
    type Error = JiraError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        IssueKey::parse(value)
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Ord for IssueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl PartialOrd for IssueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Jira sends the key either as a bare string or as an object holding a `key` field
impl<'de> Deserialize<'de> for IssueKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IssueKeyVisitor;

        impl<'de> Visitor<'de> for IssueKeyVisitor {
            type Value = IssueKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or a map with a key field")
            }

            fn visit_str<E>(self, value: &str) -> Result<IssueKey, E>
            where
                E: de::Error,
            {
                IssueKey::parse(value).map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
            }

            fn visit_map<M>(self, mut map: M) -> Result<IssueKey, M::Error>
            where
                M: de::MapAccess<'de>,
            {
                let mut value: Option<String> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "key" {
                        if value.is_some() {
                            return Err(de::Error::duplicate_field("key"));
                        }
                        value = Some(map.next_value()?);
                    } else {
                        let _: de::IgnoredAny = map.next_value()?;
                    }
                }
                let value = value.ok_or_else(|| de::Error::missing_field("key"))?;
                self.visit_str(&value)
            }
        }

        deserializer.deserialize_any(IssueKeyVisitor)
    }
}
