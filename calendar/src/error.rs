use std::{io, path::PathBuf};

use jira::builder::JiraBuilderError;
use jira::JiraError;
use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Unable to load the application configuration file {path:?}")]
    ApplicationConfig { path: PathBuf, source: io::Error },
    #[error("Unable to parse contents of {path:?}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Unable to determine the directory holding the configuration file")]
    ConfigDirectory,
    #[error("Unknown time zone '{0}'")]
    UnknownTimeZone(String),
    #[error("Unable to set up the Jira client: {0}")]
    ClientInit(#[from] JiraBuilderError),
    /// Any failed exchange with Jira, the message includes the diagnostic returned by Jira
    #[error("{0}")]
    Remote(#[from] JiraError),
    /// Bad or missing user input, detected before Jira is contacted
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Unable to resolve the parent link field: {0}")]
    SchemaResolution(String),
    #[error("No calendar block with id '{0}'")]
    UnknownBlock(String),
    #[error("No person has been selected")]
    NoPersonSelected,
}

impl CalendarError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        CalendarError::Validation(msg.into())
    }
}
