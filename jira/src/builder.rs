//! Step by step construction of a [`Jira`] client.
//!
//! ```rust,ignore
//! let jira = Jira::builder()
//!     .host("https://norn.atlassian.net")
//!     .basic_auth("me@norn.com", "api-token")
//!     .search_timeout(90)
//!     .build()?;
//! ```
use crate::config::JiraClientConfiguration;
use crate::{Credentials, Jira, DEFAULT_READ_TIMEOUT, DEFAULT_SEARCH_TIMEOUT};
use log::debug;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum JiraBuilderError {
    #[error("No Jira host given, set it in the configuration file or in {0}")]
    MissingHost(&'static str),

    #[error("No Jira credentials given, set them in the configuration file or in {0} and {1}")]
    MissingCredentials(&'static str, &'static str),

    #[error("Jira host is not a valid URL: {0}")]
    InvalidHost(#[from] url::ParseError),

    #[error("Unable to create the http client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("A timeout of zero seconds is not allowed")]
    InvalidTimeout,
}

/// Environment variables which may override the `[jira]` section of the configuration
pub struct JiraEnvVars;

impl JiraEnvVars {
    pub const HOST: &'static str = "JIRA_BASE_URL";
    pub const USER: &'static str = "JIRA_EMAIL";
    pub const TOKEN: &'static str = "JIRA_API_TOKEN";
}

pub const DEFAULT_API_VERSION: &str = "3";

#[derive(Default)]
pub struct JiraBuilder {
    host: Option<String>,
    api_version: Option<String>,
    credentials: Option<Credentials>,
    read_timeout: Option<Duration>,
    search_timeout: Option<Duration>,
}

impl JiraBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Any URL on the Jira site, only its origin is kept
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// REST api version, `3` unless given
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// E-mail address and api token
    #[must_use]
    pub fn basic_auth(self, user: impl Into<String>, token: impl Into<String>) -> Self {
        self.credentials(Credentials::Basic(user.into(), token.into()))
    }

    /// Personal access token
    #[must_use]
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.credentials(Credentials::Bearer(token.into()))
    }

    /// Applies to reads and writes, 30 seconds unless given
    #[must_use]
    pub fn read_timeout(mut self, seconds: u64) -> Self {
        self.read_timeout = Some(Duration::from_secs(seconds));
        self
    }

    /// Applies to JQL searches, 60 seconds unless given
    #[must_use]
    pub fn search_timeout(mut self, seconds: u64) -> Self {
        self.search_timeout = Some(Duration::from_secs(seconds));
        self
    }

    /// Host and basic credentials from the `[jira]` section. Blank values and the placeholder
    /// token count as missing.
    #[must_use]
    pub fn from_config(mut self, cfg: &JiraClientConfiguration) -> Self {
        if !cfg.url.trim().is_empty() {
            self = self.host(cfg.url.trim());
        }
        if !cfg.user.trim().is_empty() && cfg.has_valid_jira_token() {
            self = self.basic_auth(cfg.user.clone(), cfg.token.clone());
        }
        self
    }

    /// # Errors
    /// Fails when host or credentials are missing, when a timeout is zero or when the host
    /// can not be parsed
    pub fn build(self) -> Result<Jira, JiraBuilderError> {
        let host = self
            .host
            .ok_or(JiraBuilderError::MissingHost(JiraEnvVars::HOST))?;
        let credentials = self.credentials.ok_or(JiraBuilderError::MissingCredentials(
            JiraEnvVars::USER,
            JiraEnvVars::TOKEN,
        ))?;

        let read_timeout = self.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT);
        let search_timeout = self.search_timeout.unwrap_or(DEFAULT_SEARCH_TIMEOUT);
        if read_timeout.is_zero() || search_timeout.is_zero() {
            return Err(JiraBuilderError::InvalidTimeout);
        }

        // People tend to paste the URL of a browser tab or of the REST api
        let origin = Url::parse(&host)?.origin().ascii_serialization();
        let host = Url::parse(&origin)?;

        let jira = Jira {
            host,
            api: format!(
                "rest/api/{}",
                self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
            ),
            credentials,
            read_timeout,
            search_timeout,
            client: Client::builder().build()?,
        };
        debug!("Jira client for {}", jira.host);
        Ok(jira)
    }
}

impl Jira {
    #[must_use]
    pub fn builder() -> JiraBuilder {
        JiraBuilder::new()
    }
}
