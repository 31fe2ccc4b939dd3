use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{
    EmulationMedia, HeadlessMode, LaunchSettings, PaperFormat, PdfHeight, WaitUntil,
    DEFAULT_REQUEST_TIMEOUT,
};
use crate::{Html2PdfError, Result};

/// Defaults applied to every render; loaded from TOML or built in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub page: PageConfig,
    pub pdf: PdfConfig,
    pub browser: BrowserConfig,
    pub timeouts: Timeouts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PageConfig {
    /// Page width; the fallback for both the viewport and the PDF width.
    pub width: u32,
    pub viewport_height: u32,
    pub emulation_media: EmulationMedia,
    pub wait_until: Vec<WaitUntil>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            viewport_height: 720,
            emulation_media: EmulationMedia::Screen,
            wait_until: vec![WaitUntil::NetworkIdle0],
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PdfConfig {
    /// Falls back to `page.width` when unset.
    pub width: Option<u32>,
    pub height: PdfHeight,
    /// Extra pixels appended to a measured body height.
    pub padding: u32,
    pub format: Option<PaperFormat>,
    pub print_background: bool,
    pub file_name: PathBuf,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: PdfHeight::BodyHeight,
            padding: 100,
            format: None,
            print_background: true,
            file_name: PathBuf::from("website.pdf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    pub headless: HeadlessMode,
    pub ignore_https_errors: bool,
    pub user_data_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        let launch = LaunchSettings::default();
        Self {
            executable: launch.executable_path,
            args: launch.args,
            headless: launch.headless,
            ignore_https_errors: launch.ignore_https_errors,
            user_data_dir: launch.user_data_dir,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Bound on navigation/content loading; zero disables it.
    #[serde(with = "humantime_serde")]
    pub navigation: Duration,
    /// Bound on a whole render, launch to close; zero disables it.
    #[serde(with = "humantime_serde")]
    pub render: Duration,
    /// Bound on each DevTools command.
    #[serde(with = "humantime_serde")]
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            render: Duration::from_secs(120),
            request: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    /// Load from an explicit path, else the central config file, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::central_config_path().filter(|p| p.is_file()),
        };
        match path {
            Some(p) => Self::from_file(&p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Html2PdfError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
            .map_err(|e| Html2PdfError::Config(format!("{} ({})", e, path.display())))
    }

    pub fn from_toml_str(raw: &str) -> std::result::Result<Self, String> {
        toml::from_str(raw).map_err(|e| format!("TOML parse error: {e}"))
    }

    /// `$XDG_CONFIG_HOME/html2pdf/config.toml`, falling back to `~/.config`.
    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME")
                    .filter(|v| !v.is_empty())
                    .map(|home| PathBuf::from(home).join(".config"))
            })?;
        Some(base.join("html2pdf").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.page.width == 0 {
            return Err(Html2PdfError::Config("page.width must be positive".into()));
        }
        if self.page.viewport_height == 0 {
            return Err(Html2PdfError::Config(
                "page.viewport-height must be positive".into(),
            ));
        }
        if self.page.wait_until.is_empty() {
            return Err(Html2PdfError::Config(
                "page.wait-until needs at least one condition".into(),
            ));
        }
        if self.pdf.width == Some(0) {
            return Err(Html2PdfError::Config("pdf.width must be positive".into()));
        }
        if self.pdf.height == PdfHeight::Pixels(0) {
            return Err(Html2PdfError::Config("pdf.height must be positive".into()));
        }
        if self.pdf.file_name.as_os_str().is_empty() {
            return Err(Html2PdfError::Config("pdf.file-name must not be empty".into()));
        }
        Ok(())
    }

    /// Launch settings described by the `[browser]` and `[timeouts]` tables.
    pub fn launch_settings(&self) -> LaunchSettings {
        LaunchSettings {
            executable_path: self.browser.executable.clone(),
            args: self.browser.args.clone(),
            headless: self.browser.headless,
            ignore_https_errors: self.browser.ignore_https_errors,
            user_data_dir: self.browser.user_data_dir.clone(),
            request_timeout: self.timeouts.request,
        }
    }
}
