use crate::error::CalendarError;
use anyhow::Result;
use chrono::NaiveTime;
use chrono_tz::Tz;
use directories::ProjectDirs;
use jira::builder::JiraEnvVars;
use jira::config::JiraClientConfiguration;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration struct
/// Holds the data we need to connect to Jira and to lay out the calendar
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct AppConfiguration {
    /// Holds the URL and credentials of the Jira instance we are running against.
    pub jira: JiraClientConfiguration,

    /// Older configuration files have no `calendar` section, the defaults are used then
    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// Holds the `[calendar]` section of the Toml file
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct CalendarConfig {
    /// IANA name of the time zone the calendar is displayed in
    pub timezone: String,
    /// Pointer positions are snapped down to this many minutes
    pub grid_minutes: u32,
    /// First hour shown in the time grid
    pub slot_min_time: NaiveTime,
    /// Last hour shown in the time grid
    pub slot_max_time: NaiveTime,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            timezone: "UTC".to_string(),
            grid_minutes: crate::date::DEFAULT_GRID_MINUTES,
            slot_min_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default(),
            slot_max_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
        }
    }
}

impl CalendarConfig {
    /// # Errors
    /// Returns [`CalendarError::UnknownTimeZone`] if the name is not an IANA time zone
    pub fn timezone(&self) -> Result<Tz, CalendarError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| CalendarError::UnknownTimeZone(self.timezone.clone()))
    }
}

/// Holds the `[cache]` section, time to live of the cached Jira reads
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub worklogs_ttl_secs: u64,
    pub issues_ttl_secs: u64,
    pub users_ttl_secs: u64,
    pub schema_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            worklogs_ttl_secs: 60,
            issues_ttl_secs: 60,
            users_ttl_secs: 300,
            schema_ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn worklogs_ttl(&self) -> Duration {
        Duration::from_secs(self.worklogs_ttl_secs)
    }

    #[must_use]
    pub fn issues_ttl(&self) -> Duration {
        Duration::from_secs(self.issues_ttl_secs)
    }

    #[must_use]
    pub fn users_ttl(&self) -> Duration {
        Duration::from_secs(self.users_ttl_secs)
    }

    #[must_use]
    pub fn schema_ttl(&self) -> Duration {
        Duration::from_secs(self.schema_ttl_secs)
    }
}

/// Filename holding the application configuration parameters
///
/// # Errors
/// Fails if the home directory of the user can not be determined
pub fn configuration_file() -> Result<PathBuf, CalendarError> {
    Ok(project_dirs()?.preference_dir().join("config.toml"))
}

/// Loads the configuration file, letting the `JIRA_*` environment variables
/// override the `[jira]` section.
///
/// # Errors
/// Fails if the file can not be read or parsed
pub fn load() -> Result<AppConfiguration, CalendarError> {
    let config_path = configuration_file()?;
    let mut app_config = read(&config_path)?;
    apply_env_overrides(&mut app_config, |name| std::env::var(name).ok());
    Ok(app_config)
}

#[allow(clippy::missing_errors_doc)]
pub fn save(cfg: &AppConfiguration) -> Result<()> {
    create_configuration_file(cfg, &configuration_file()?)
}

#[allow(clippy::missing_errors_doc)]
pub fn application_config_to_string(cfg: &AppConfiguration) -> Result<String> {
    Ok(toml::to_string::<AppConfiguration>(cfg)?)
}

fn project_dirs() -> Result<ProjectDirs, CalendarError> {
    ProjectDirs::from("com", "norn", "worklog-calendar").ok_or(CalendarError::ConfigDirectory)
}

/// Replaces the Jira parameters with those found in the environment
fn apply_env_overrides<F>(cfg: &mut AppConfiguration, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(JiraEnvVars::HOST) {
        debug!("Jira url taken from {}", JiraEnvVars::HOST);
        cfg.jira.url = url;
    }
    if let Some(user) = lookup(JiraEnvVars::USER) {
        debug!("Jira user taken from {}", JiraEnvVars::USER);
        cfg.jira.user = user;
    }
    if let Some(token) = lookup(JiraEnvVars::TOKEN) {
        debug!("Jira token taken from {}", JiraEnvVars::TOKEN);
        cfg.jira.token = token;
    }
}

/// Reads the `Application` configuration struct from the supplied TOML file
fn read(path: &Path) -> Result<AppConfiguration, CalendarError> {
    let mut file = File::open(path).map_err(|source| CalendarError::ApplicationConfig {
        path: path.into(),
        source,
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|source| CalendarError::ApplicationConfig {
            path: path.into(),
            source,
        })?;
    toml::from_str::<AppConfiguration>(&contents).map_err(|source| CalendarError::TomlParse {
        path: path.into(),
        source,
    })
}

fn create_configuration_file(cfg: &AppConfiguration, path: &Path) -> Result<()> {
    if let Some(directory) = path.parent() {
        if !directory.try_exists()? {
            fs::create_dir_all(directory)?;
        }
    }

    let mut file = File::create(path)?;
    let toml = application_config_to_string(cfg)?;
    file.write_all(toml.as_bytes())?;

    Ok(())
}
