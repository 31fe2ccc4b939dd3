//! Page lifecycle vocabulary: wait conditions, media emulation and the
//! navigation/content-loading settings built from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Unknown {kind} '{value}'; expected one of: {expected}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Heuristic deciding when a page counts as loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WaitUntil {
    /// The `load` event fired.
    Load,
    /// The `DOMContentLoaded` event fired.
    DomContentLoaded,
    /// No network requests in flight for [`NETWORK_IDLE_WINDOW`].
    NetworkIdle0,
    /// At most two network requests in flight for [`NETWORK_IDLE_WINDOW`].
    NetworkIdle2,
}

/// Quiet period required before a network-idle condition is met.
pub const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle0 => "networkidle0",
            WaitUntil::NetworkIdle2 => "networkidle2",
        }
    }

    /// In-flight request budget for network-idle conditions.
    pub fn max_inflight(&self) -> Option<usize> {
        match self {
            WaitUntil::NetworkIdle0 => Some(0),
            WaitUntil::NetworkIdle2 => Some(2),
            WaitUntil::Load | WaitUntil::DomContentLoaded => None,
        }
    }

    /// Parse a comma separated list, e.g. `load,networkidle2`.
    pub fn parse_list(value: &str) -> Result<Vec<WaitUntil>, UnknownVariant> {
        value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for WaitUntil {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "load" => Ok(WaitUntil::Load),
            "domcontentloaded" => Ok(WaitUntil::DomContentLoaded),
            "networkidle0" => Ok(WaitUntil::NetworkIdle0),
            "networkidle2" => Ok(WaitUntil::NetworkIdle2),
            _ => Err(UnknownVariant {
                kind: "wait condition",
                value: s.to_string(),
                expected: "load, domcontentloaded, networkidle0, networkidle2",
            }),
        }
    }
}

impl TryFrom<String> for WaitUntil {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WaitUntil> for String {
    fn from(value: WaitUntil) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which CSS media rules apply while rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmulationMedia {
    #[default]
    Screen,
    Print,
}

impl EmulationMedia {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmulationMedia::Screen => "screen",
            EmulationMedia::Print => "print",
        }
    }
}

impl FromStr for EmulationMedia {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "screen" => Ok(EmulationMedia::Screen),
            "print" => Ok(EmulationMedia::Print),
            _ => Err(UnknownVariant {
                kind: "media type",
                value: s.to_string(),
                expected: "screen, print",
            }),
        }
    }
}

impl fmt::Display for EmulationMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Referrer policy sent with the top-level navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferrerPolicy {
    NoReferrer,
    NoReferrerWhenDowngrade,
    Origin,
    OriginWhenCrossOrigin,
    SameOrigin,
    StrictOrigin,
    StrictOriginWhenCrossOrigin,
    UnsafeUrl,
}

impl FromStr for ReferrerPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "noreferrer" => Ok(ReferrerPolicy::NoReferrer),
            "noreferrerwhendowngrade" => Ok(ReferrerPolicy::NoReferrerWhenDowngrade),
            "origin" => Ok(ReferrerPolicy::Origin),
            "originwhencrossorigin" => Ok(ReferrerPolicy::OriginWhenCrossOrigin),
            "sameorigin" => Ok(ReferrerPolicy::SameOrigin),
            "strictorigin" => Ok(ReferrerPolicy::StrictOrigin),
            "strictoriginwhencrossorigin" => Ok(ReferrerPolicy::StrictOriginWhenCrossOrigin),
            "unsafeurl" => Ok(ReferrerPolicy::UnsafeUrl),
            _ => Err(UnknownVariant {
                kind: "referrer policy",
                value: s.to_string(),
                expected: "no-referrer, no-referrer-when-downgrade, origin, origin-when-cross-origin, same-origin, strict-origin, strict-origin-when-cross-origin, unsafe-url",
            }),
        }
    }
}

/// Caller overrides for URL navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationOptions {
    pub wait_until: Option<Vec<WaitUntil>>,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub referer: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
}

/// Caller overrides for loading literal HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentOptions {
    pub wait_until: Option<Vec<WaitUntil>>,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// Resolved settings for loading literal HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    pub wait_until: Vec<WaitUntil>,
    /// `Duration::ZERO` disables the limit.
    pub timeout: Duration,
}

/// Resolved settings for navigating to a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationSettings {
    pub load: LoadSettings,
    pub referer: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
}

impl LoadSettings {
    pub fn new(wait_until: Vec<WaitUntil>, timeout: Duration) -> Self {
        Self {
            wait_until,
            timeout,
        }
    }

    pub fn with_overrides(mut self, overrides: &ContentOptions) -> Self {
        if let Some(wait_until) = overrides.wait_until.as_ref().filter(|w| !w.is_empty()) {
            self.wait_until = wait_until.clone();
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        self
    }

    /// Strictest network budget among the wait conditions, if any asks for idle.
    pub fn network_idle_budget(&self) -> Option<usize> {
        self.wait_until.iter().filter_map(WaitUntil::max_inflight).min()
    }
}

impl NavigationSettings {
    pub fn new(load: LoadSettings) -> Self {
        Self {
            load,
            referer: None,
            referrer_policy: None,
        }
    }

    pub fn with_overrides(mut self, overrides: &NavigationOptions) -> Self {
        self.load = self.load.with_overrides(&ContentOptions {
            wait_until: overrides.wait_until.clone(),
            timeout: overrides.timeout,
        });
        if overrides.referer.is_some() {
            self.referer = overrides.referer.clone();
        }
        if overrides.referrer_policy.is_some() {
            self.referrer_policy = overrides.referrer_policy;
        }
        self
    }
}
