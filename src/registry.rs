//! Modrinth registry client and metadata types
//!
//! The registry is the source of truth for plugin discovery and version
//! compatibility. Only read endpoints are used.
//!
//! # Examples
//!
//! ```no_run
//! use mcpkg::{Config, RegistryClient};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = RegistryClient::from_config(&Config::load()?)?;
//!
//! let hits = registry.search("permissions", 10, 0)?;
//! for hit in hits.hits {
//!     println!("{} ({} downloads)", hit.slug, hit.downloads);
//! }
//!
//! let (project, versions) = registry.resolve("luckperms")?;
//! println!("{} has {} versions", project.title, versions.len());
//! # Ok(())
//! # }
//! ```

use crate::http::{build_http_client, get_bytes, send, status_error};
use crate::{Config, Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModrinthProject {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub downloads: u64,
}

/// Release maturity of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionType {
    Release,
    Beta,
    Alpha,
}

/// One published version of a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModrinthVersion {
    #[serde(default)]
    pub id: String,
    pub version_number: String,
    pub version_type: VersionType,
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionFile {
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub size: u64,
}

impl ModrinthVersion {
    /// File flagged primary, or the first file when none is
    pub fn primary_file(&self) -> Option<&VersionFile> {
        self.files
            .iter()
            .find(|f| f.primary)
            .or_else(|| self.files.first())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total_hits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub project_id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub latest_version: Option<String>,
}

pub struct RegistryClient {
    base_url: String,
    client: Client,
}

impl RegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_http_client(timeout)?,
        })
    }

    /// Create a registry client using configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.registry.url, config.network.timeout())
    }

    /// Get project metadata
    pub fn get_project(&self, id: &str) -> Result<ModrinthProject> {
        let url = format!("{}/project/{}", self.base_url, id);
        self.get_json(&url, id)
    }

    /// Get every published version of a project, newest first
    pub fn get_versions(&self, id: &str) -> Result<Vec<ModrinthVersion>> {
        let url = format!("{}/project/{}/version", self.base_url, id);
        self.get_json(&url, id)
    }

    /// Project record plus its full version list
    pub fn resolve(&self, id: &str) -> Result<(ModrinthProject, Vec<ModrinthVersion>)> {
        let project = self.get_project(id)?;
        let versions = self.get_versions(id)?;
        tracing::debug!(project = %project.slug, versions = versions.len(), "resolved project");
        Ok((project, versions))
    }

    /// Search plugins; hits are re-sorted by download count, highest first
    pub fn search(&self, query: &str, limit: u32, offset: u32) -> Result<SearchResponse> {
        let url = format!("{}/search", self.base_url);
        let request = self.client.get(&url).query(&[
            ("query", query.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("facets", r#"[["project_type:plugin"]]"#.to_string()),
        ]);

        let response = send(request, &url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &url));
        }

        let mut results: SearchResponse = response
            .json()
            .map_err(|e| Error::Network(format!("Failed to parse search response: {}", e)))?;
        results.hits.sort_by(|a, b| b.downloads.cmp(&a.downloads));

        Ok(results)
    }

    /// Download a version file
    pub fn download(&self, file: &VersionFile) -> Result<Vec<u8>> {
        get_bytes(&self.client, &file.url)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, id: &str) -> Result<T> {
        let response = send(self.client.get(url), url)?;
        let status = response.status();

        if status == 404 {
            return Err(Error::PackageNotFound(id.to_string()));
        }

        if !status.is_success() {
            return Err(status_error(status, url));
        }

        response
            .json()
            .map_err(|e| Error::Network(format!("Failed to parse response from {}: {}", url, e)))
    }
}
