use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::lifecycle::UnknownVariant;

/// Default CDP request timeout for a single DevTools command.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadlessMode {
    /// Chrome's unified headless implementation (`--headless=new`).
    #[default]
    New,
    /// The old headless shell.
    Legacy,
    /// Show a browser window.
    Off,
}

impl FromStr for HeadlessMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" | "true" => Ok(HeadlessMode::New),
            "legacy" | "old" => Ok(HeadlessMode::Legacy),
            "off" | "false" | "headful" => Ok(HeadlessMode::Off),
            _ => Err(UnknownVariant {
                kind: "headless mode",
                value: s.to_string(),
                expected: "new, legacy, off",
            }),
        }
    }
}

/// Caller overrides for launching the browser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchOptions {
    /// Browser binary to run instead of the discovered one.
    pub executable_path: Option<PathBuf>,
    /// Replaces the default argument list.
    pub args: Option<Vec<String>>,
    /// `off` opens a visible window.
    pub headless: Option<HeadlessMode>,
    /// Accept invalid or self-signed certificates.
    pub ignore_https_errors: Option<bool>,
    /// Profile directory; a temporary one is used when unset.
    pub user_data_dir: Option<PathBuf>,
    /// Limit for each DevTools protocol request.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

/// Resolved browser launch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSettings {
    /// `None` lets the launcher look for an installed browser.
    pub executable_path: Option<PathBuf>,
    pub args: Vec<String>,
    pub headless: HeadlessMode,
    pub ignore_https_errors: bool,
    pub user_data_dir: Option<PathBuf>,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            executable_path: None,
            args: vec!["--no-sandbox".to_string()],
            headless: HeadlessMode::New,
            ignore_https_errors: true,
            user_data_dir: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl LaunchSettings {
    pub fn with_overrides(mut self, overrides: &LaunchOptions) -> Self {
        if overrides.executable_path.is_some() {
            self.executable_path = overrides.executable_path.clone();
        }
        if let Some(args) = &overrides.args {
            self.args = args.clone();
        }
        if let Some(headless) = overrides.headless {
            self.headless = headless;
        }
        if let Some(ignore) = overrides.ignore_https_errors {
            self.ignore_https_errors = ignore;
        }
        if overrides.user_data_dir.is_some() {
            self.user_data_dir = overrides.user_data_dir.clone();
        }
        if let Some(timeout) = overrides.request_timeout {
            self.request_timeout = timeout;
        }
        self
    }
}
