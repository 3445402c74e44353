use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use super::model::OrgIndex;
use super::parse::parse_org_index;

pub const DEFAULT_INDEX_URL: &str = "https://davidmegginson.github.io/iati3w-data/org-index.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexLocation {
    Url(String),
    File(PathBuf),
}

impl fmt::Display for IndexLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadOptions {
    pub location: IndexLocation,
    pub timeout: Duration,
}

pub fn load_org_index(options: &LoadOptions) -> Result<OrgIndex> {
    let raw = match &options.location {
        IndexLocation::Url(url) => fetch_url(url, options.timeout)?,
        IndexLocation::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read organization index {}", path.display()))?,
    };

    let index = parse_org_index(&raw)
        .with_context(|| format!("failed to parse organization index from {}", options.location))?;

    tracing::info!(
        location = %options.location,
        organizations = index.len(),
        skipped = index.skipped_count(),
        "loaded organization index"
    );

    Ok(index)
}

fn fetch_url(url: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("failed to fetch {url}"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("fetching {url} returned HTTP {status}"));
    }

    response
        .text()
        .with_context(|| format!("failed to read response body from {url}"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("orgnet-{}-{name}", std::process::id()))
    }

    #[test]
    fn loads_index_from_file() {
        let path = temp_path("index.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"a": {{"info": {{"stub": "a", "name": "Alpha", "scope": "local"}}, "sources": ["3W"]}}}}"#
        )
        .unwrap();
        drop(file);

        let index = load_org_index(&LoadOptions {
            location: IndexLocation::File(path.clone()),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a").unwrap().name, "Alpha");
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = temp_path("does-not-exist.json");
        let error = load_org_index(&LoadOptions {
            location: IndexLocation::File(path.clone()),
            timeout: Duration::from_secs(1),
        })
        .unwrap_err();

        assert!(format!("{error:#}").contains("does-not-exist.json"));
    }

    #[test]
    fn parse_failure_names_the_location() {
        let path = temp_path("garbage.json");
        std::fs::write(&path, "{ not json").unwrap();

        let error = load_org_index(&LoadOptions {
            location: IndexLocation::File(path.clone()),
            timeout: Duration::from_secs(1),
        })
        .unwrap_err();
        std::fs::remove_file(&path).ok();

        let message = format!("{error:#}");
        assert!(message.contains("garbage.json"));
        assert!(message.contains("invalid JSON"));
    }
}
