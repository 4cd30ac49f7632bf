use serde::{Deserialize, Serialize};

/// The `[jira]` section of the application configuration
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct JiraClientConfiguration {
    /// URL of the Jira instance, e.g. `https://your-domain.atlassian.net`
    pub url: String,
    /// E-mail address of the Jira Cloud account
    pub user: String,
    /// Jira API token
    pub token: String,
}

impl Default for JiraClientConfiguration {
    fn default() -> Self {
        JiraClientConfiguration {
            url: "https://your-domain.atlassian.net".into(),
            user: String::new(),
            token: "<your secret jira token goes here>".into(),
        }
    }
}

impl JiraClientConfiguration {
    /// Does the token look like a valid Jira Security token?
    #[must_use]
    pub fn has_valid_jira_token(&self) -> bool {
        !(self.token.trim().is_empty()
            || self.token == JiraClientConfiguration::default().token
            || self.token.contains("secret"))
    }

    /// Are all the parameters needed to talk to Jira present?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.url.trim().is_empty() && !self.user.trim().is_empty() && self.has_valid_jira_token()
    }
}
