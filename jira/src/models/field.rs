use serde::{Deserialize, Serialize};

/// An entry of the field catalog returned by `GET /field`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub schema: Option<FieldSchema>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Plugin marker of a custom field, for instance `com.pyxis.greenhopper.jira:gh-epic-link`
    #[serde(default)]
    pub custom: Option<String>,
    #[serde(default)]
    pub custom_id: Option<u64>,
}

impl Field {
    /// Does the schema of this field carry the supplied custom field marker?
    #[must_use]
    pub fn has_custom_marker(&self, marker: &str) -> bool {
        self.schema
            .as_ref()
            .and_then(|s| s.custom.as_deref())
            .is_some_and(|custom| custom == marker)
    }
}
