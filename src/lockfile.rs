//! Lockfile recording materialized artifacts
//!
//! `mcpkg install` writes `mcpkg.lock` next to the project file after a
//! successful resolution pass. `mcpkg build` reads it to find every artifact
//! without talking to the registry.
//!
//! Lockfiles use TOML format and may be committed to version control.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the entire lockfile structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lockfile {
    /// Metadata about the lockfile
    #[serde(rename = "metadata")]
    pub metadata: LockfileMetadata,

    /// API jar of the active platform, if one was resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<LockedArtifact>,

    /// Map of dependency key to locked artifact
    #[serde(rename = "package", default)]
    pub packages: BTreeMap<String, LockedArtifact>,
}

/// Metadata about the lockfile generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockfileMetadata {
    /// Version of mcpkg that generated this lockfile
    pub mcpkg_version: String,

    /// Timestamp when the lockfile was generated (ISO 8601 format)
    pub generated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSource {
    Registry,
    Maven,
    Local,
    Platform,
}

/// Information about one materialized artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedArtifact {
    pub source: ArtifactSource,

    /// Exact version installed (empty for local files)
    #[serde(default)]
    pub version: String,

    /// Specifier string this entry was resolved from
    #[serde(default)]
    pub specifier: String,

    /// Location on disk
    pub path: PathBuf,

    /// SHA256 checksum of the file
    pub checksum: String,
}

impl Lockfile {
    /// Create a new empty lockfile
    pub fn new() -> Self {
        Self {
            metadata: LockfileMetadata {
                mcpkg_version: env!("CARGO_PKG_VERSION").to_string(),
                generated_at: chrono::Utc::now().to_rfc3339(),
            },
            platform: None,
            packages: BTreeMap::new(),
        }
    }

    /// Load lockfile from a specific path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)?;
        let lockfile: Lockfile = toml::from_str(&contents)
            .map_err(|e| Error::InvalidProject(format!("Failed to parse lockfile: {}", e)))?;

        Ok(Some(lockfile))
    }

    /// Save lockfile to a specific path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), toml_string)?;
        Ok(())
    }

    /// Add or update a package in the lockfile
    pub fn update_package(&mut self, key: String, artifact: LockedArtifact) {
        self.packages.insert(key, artifact);
        self.touch();
    }

    pub fn set_platform(&mut self, artifact: Option<LockedArtifact>) {
        self.platform = artifact;
        self.touch();
    }

    pub fn get_package(&self, key: &str) -> Option<&LockedArtifact> {
        self.packages.get(key)
    }

    pub fn has_package(&self, key: &str) -> bool {
        self.packages.contains_key(key)
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    fn touch(&mut self) {
        self.metadata.generated_at = chrono::Utc::now().to_rfc3339();
    }
}

impl Default for Lockfile {
    fn default() -> Self {
        Self::new()
    }
}
