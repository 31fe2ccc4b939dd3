use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{Host, Url};

/// What the browser should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Url(Url),
    Html(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Url,
    Html,
}

impl ContentSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            ContentSource::Url(_) => SourceKind::Url,
            ContentSource::Html(_) => SourceKind::Html,
        }
    }

    /// Short human description: the URL, or the markup size.
    pub fn describe(&self) -> String {
        match self {
            ContentSource::Url(url) => url.to_string(),
            ContentSource::Html(html) => format!("inline HTML ({} bytes)", html.len()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("a Url or Html is required")]
    Missing,
    #[error("Both a Url and Html were provided; pass exactly one content source")]
    Conflicting,
    #[error("URL is invalid: '{value}' ({message})")]
    InvalidUrl { value: String, message: String },
}

/// Pick the single content source out of the caller's URL and HTML inputs.
pub fn resolve_source(
    url: Option<&str>,
    html: Option<&str>,
) -> Result<ContentSource, SourceError> {
    let url = url.map(str::trim).filter(|u| !u.is_empty());
    let html = html.filter(|h| !h.trim().is_empty());

    match (url, html) {
        (None, None) => Err(SourceError::Missing),
        (Some(_), Some(_)) => Err(SourceError::Conflicting),
        (Some(url), None) => normalize_url(url).map(ContentSource::Url),
        (None, Some(html)) => Ok(ContentSource::Html(html.to_string())),
    }
}

/// Turn `example.com/path` into `https://example.com/path` and reject anything
/// that is not an absolute http(s) URL with a plausible host.
pub fn normalize_url(raw: &str) -> Result<Url, SourceError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw.trim_start_matches('/'))
    };

    let invalid = |message: String| SourceError::InvalidUrl {
        value: raw.to_string(),
        message,
    };

    let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "unsupported scheme '{}', expected http or https",
            url.scheme()
        )));
    }

    match url.host() {
        None => Err(invalid("missing host".to_string())),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => Ok(url),
        Some(Host::Domain(domain)) => {
            if domain.parse::<IpAddr>().is_ok() || is_plausible_domain(domain) {
                Ok(url)
            } else {
                Err(invalid(format!("host '{domain}' has no top-level domain")))
            }
        }
    }
}

fn is_plausible_domain(domain: &str) -> bool {
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let domain = domain.trim_end_matches('.');
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return false;
    }
    let tld = labels[labels.len() - 1];
    tld.len() >= 2
        && (tld.chars().all(|c| c.is_ascii_alphabetic()) || tld.starts_with("xn--"))
}
