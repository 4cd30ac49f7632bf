use serde::{Deserialize, Serialize};

/// A Jira user, as returned by `/myself`, `/users/search` and `/user/picker`.
///
/// The picker only supplies the account id and the display name, hence the optional fields.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub account_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Response of `GET /user/picker`
#[derive(Debug, Deserialize)]
pub struct UserPickerResults {
    #[serde(default)]
    pub users: Vec<User>,
}
