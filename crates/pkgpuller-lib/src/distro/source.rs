use super::known::PackageFamily;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SourceError {
    #[error("no `deb` line found in APT source")]
    MissingDebLine,
    #[error("APT source line is missing the {0}")]
    IncompleteDebLine(&'static str),
    #[error("no `baseurl=` entry found in RPM repository definition")]
    MissingBaseUrl,
    #[error("invalid repository URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Where a distribution's packages come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepositorySource {
    Apt {
        base_url: String,
        suite: String,
        component: String,
        architecture: String,
    },
    Rpm {
        base_url: String,
    },
}

impl RepositorySource {
    pub fn parse(family: PackageFamily, raw: &str) -> Result<Self, SourceError> {
        match family {
            PackageFamily::Deb => parse_apt_source(raw),
            PackageFamily::Rpm => parse_rpm_repo(raw),
        }
    }

    /// Repository root without a trailing slash.
    pub fn base_url(&self) -> &str {
        match self {
            RepositorySource::Apt { base_url, .. } | RepositorySource::Rpm { base_url } => {
                base_url
            }
        }
    }

    pub fn family(&self) -> PackageFamily {
        match self {
            RepositorySource::Apt { .. } => PackageFamily::Deb,
            RepositorySource::Rpm { .. } => PackageFamily::Rpm,
        }
    }

    /// Path of the top-level index document, relative to [`Self::base_url`].
    pub fn top_level_index_path(&self) -> String {
        match self {
            RepositorySource::Apt {
                suite,
                component,
                architecture,
                ..
            } => format!("dists/{suite}/{component}/binary-{architecture}/Packages.gz"),
            RepositorySource::Rpm { .. } => "repodata/repomd.xml".to_string(),
        }
    }
}

impl Display for RepositorySource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositorySource::Apt {
                base_url,
                suite,
                component,
                ..
            } => write!(f, "deb {base_url} {suite} {component}"),
            RepositorySource::Rpm { base_url } => write!(f, "baseurl={base_url}"),
        }
    }
}

fn normalize_base_url(raw: &str) -> Result<String, SourceError> {
    let url = Url::parse(raw).map_err(|e| SourceError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SourceError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// amd64 whenever the line allows it; a different arch only when it is the only one listed.
fn select_architecture(arches: &str) -> String {
    let listed: Vec<&str> = arches.split(',').filter(|a| !a.is_empty()).collect();
    match listed.as_slice() {
        [single] => single.to_string(),
        _ => "amd64".to_string(),
    }
}

fn parse_apt_source(raw: &str) -> Result<RepositorySource, SourceError> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("deb ") || line.starts_with("deb\t"))
        .ok_or(SourceError::MissingDebLine)?;

    let mut rest = line[3..].trim_start();
    let mut architecture = "amd64".to_string();

    if let Some(options) = rest.strip_prefix('[') {
        let (options, remainder) = options
            .split_once(']')
            .ok_or(SourceError::IncompleteDebLine("closing `]` of the options"))?;
        for option in options.split_whitespace() {
            if let Some(arches) = option.strip_prefix("arch=") {
                architecture = select_architecture(arches);
            }
        }
        rest = remainder.trim_start();
    }

    let mut parts = rest.split_whitespace();
    let url = parts.next().ok_or(SourceError::IncompleteDebLine("URL"))?;
    let suite = parts
        .next()
        .ok_or(SourceError::IncompleteDebLine("suite"))?;
    let component = parts.next().unwrap_or("main");

    Ok(RepositorySource::Apt {
        base_url: normalize_base_url(url)?,
        suite: suite.to_string(),
        component: component.to_string(),
        architecture,
    })
}

fn parse_rpm_repo(raw: &str) -> Result<RepositorySource, SourceError> {
    let trimmed = raw.trim();
    let base_url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.lines().next().unwrap_or(trimmed).trim()
    } else {
        trimmed
            .lines()
            .map(str::trim)
            .filter_map(|line| line.split_once('='))
            .find(|(key, _)| key.trim() == "baseurl")
            .map(|(_, value)| value.trim())
            .ok_or(SourceError::MissingBaseUrl)?
    };

    let base_url = base_url.replace("$basearch", "x86_64");
    Ok(RepositorySource::Rpm {
        base_url: normalize_base_url(&base_url)?,
    })
}
