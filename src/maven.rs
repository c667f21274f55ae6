//! Maven repository access
//!
//! Two uses: resolving the newest platform API snapshot through
//! `maven-metadata.xml`, and fetching plain `maven:` coordinates from a list
//! of repositories.

use crate::http::{build_http_client, get_bytes, send, status_error};
use crate::platform::Platform;
use crate::project::Coordinate;
use crate::{Config, Error, Result};
use quick_xml::de::from_str;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

/// Suffix every platform API snapshot version carries
pub const SNAPSHOT_SUFFIX: &str = "-R0.1-SNAPSHOT";

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MavenMetadata {
    #[serde(default)]
    versioning: Option<Versioning>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Versioning {
    #[serde(default)]
    latest: Option<String>,
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    versions: Option<VersionList>,
    #[serde(default)]
    snapshot: Option<SnapshotInfo>,
}

#[derive(Debug, Deserialize, Default)]
struct VersionList {
    #[serde(default, rename = "version")]
    items: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SnapshotInfo {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    build_number: Option<String>,
}

/// Fully resolved snapshot of a platform API jar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifact {
    pub platform: Platform,
    /// Game version, e.g. `1.21.4`
    pub version: String,
    pub timestamp: String,
    pub build_number: String,
}

impl SnapshotArtifact {
    /// Unique snapshot file name, e.g. `paper-api-1.21.4-R0.1-20250101.120000-42.jar`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-R0.1-{}-{}.jar",
            self.platform.artifact_id(),
            self.version,
            self.timestamp,
            self.build_number
        )
    }

    pub fn url(&self, repository: &str) -> String {
        format!(
            "{}/{}{}/{}",
            repository.trim_end_matches('/'),
            self.version,
            SNAPSHOT_SUFFIX,
            self.file_name()
        )
    }
}

fn snapshot_artifact(
    metadata: MavenMetadata,
    platform: Platform,
    version: &str,
    url: &str,
) -> Result<SnapshotArtifact> {
    let snapshot = metadata
        .versioning
        .and_then(|v| v.snapshot)
        .ok_or_else(|| Error::Metadata(format!("No snapshot section in {}", url)))?;
    let timestamp = snapshot
        .timestamp
        .ok_or_else(|| Error::Metadata(format!("Snapshot timestamp missing in {}", url)))?;
    let build_number = snapshot
        .build_number
        .ok_or_else(|| Error::Metadata(format!("Snapshot buildNumber missing in {}", url)))?;

    Ok(SnapshotArtifact {
        platform,
        version: version.to_string(),
        timestamp: timestamp.trim().to_string(),
        build_number: build_number.trim().to_string(),
    })
}

pub struct MavenClient {
    client: Client,
    /// Tried first for `maven:` coordinates
    default_repository: String,
    /// Overrides the built-in snapshot repository of every platform
    snapshot_repository: Option<String>,
}

impl MavenClient {
    pub fn new(default_repository: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            default_repository: default_repository.to_string(),
            snapshot_repository: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::new(&config.registry.maven_url, config.network.timeout())?;
        Ok(match &config.registry.snapshot_url {
            Some(url) => client.with_snapshot_repository(url),
            None => client,
        })
    }

    /// Use one repository for all platform snapshots (mirrors, tests)
    pub fn with_snapshot_repository(mut self, repository: &str) -> Self {
        self.snapshot_repository = Some(repository.trim_end_matches('/').to_string());
        self
    }

    fn repository_for(&self, platform: Platform) -> String {
        self.snapshot_repository
            .clone()
            .unwrap_or_else(|| platform.snapshot_repository().to_string())
    }

    /// Newest published game version of a platform's API
    pub fn latest_version(&self, platform: Platform) -> Result<String> {
        let url = format!("{}/maven-metadata.xml", self.repository_for(platform));
        let metadata = self.fetch_metadata(&url)?;

        let versioning = metadata.versioning.unwrap_or_default();
        let latest = versioning
            .latest
            .or(versioning.release)
            .or_else(|| versioning.versions.and_then(|v| v.items.into_iter().last()))
            .ok_or_else(|| Error::Metadata(format!("No latest version listed in {}", url)))?;

        Ok(latest
            .strip_suffix(SNAPSHOT_SUFFIX)
            .unwrap_or(&latest)
            .to_string())
    }

    /// Timestamp and build number of the snapshot for `version`
    pub fn resolve_snapshot(&self, platform: Platform, version: &str) -> Result<SnapshotArtifact> {
        let url = format!(
            "{}/{}{}/maven-metadata.xml",
            self.repository_for(platform),
            version,
            SNAPSHOT_SUFFIX
        );
        let metadata = self.fetch_metadata(&url)?;
        snapshot_artifact(metadata, platform, version, &url)
    }

    /// Resolve and download the platform API jar for `version`
    pub fn download_platform_api(&self, platform: Platform, version: &str) -> Result<Vec<u8>> {
        let artifact = self.resolve_snapshot(platform, version)?;
        let url = artifact.url(&self.repository_for(platform));
        tracing::info!(%platform, %version, file = %artifact.file_name(), "downloading platform API");
        get_bytes(&self.client, &url)
    }

    /// Fetch a coordinate from the default repository, then each extra one in order
    pub fn fetch_coordinate(&self, coordinate: &Coordinate, extra: &[String]) -> Result<Vec<u8>> {
        let mut tried = Vec::new();

        for repository in std::iter::once(&self.default_repository).chain(extra.iter()) {
            let url = coordinate.url(repository);
            let response = send(self.client.get(&url), &url)?;
            let status = response.status();

            if status.is_success() {
                return Ok(response.bytes()?.to_vec());
            }
            if status != 404 {
                return Err(status_error(status, &url));
            }

            tracing::debug!(%url, "not found, trying next repository");
            tried.push(url);
        }

        Err(Error::Metadata(format!(
            "{} not found in any repository (tried: {})",
            coordinate,
            tried.join(", ")
        )))
    }

    fn fetch_metadata(&self, url: &str) -> Result<MavenMetadata> {
        let bytes = get_bytes(&self.client, url)?;
        let xml = String::from_utf8(bytes)
            .map_err(|_| Error::Metadata(format!("{} is not valid UTF-8", url)))?;
        parse_metadata(&xml)
            .map_err(|e| Error::Metadata(format!("Failed to parse {}: {}", url, e)))
    }
}

fn parse_metadata(xml: &str) -> std::result::Result<MavenMetadata, quick_xml::DeError> {
    from_str(xml)
}
