//! User configuration and project paths
//!
//! User-level settings live in TOML at `~/.mcpkg/config.toml`. Project-level
//! locations (root, build, dist, dependency storage) are an explicit [`Paths`]
//! value that every component receives instead of reading the working directory.
//!
//! # Examples
//!
//! ```no_run
//! use mcpkg::{Config, Paths};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! println!("Registry URL: {}", config.registry.url);
//!
//! let paths = Paths::from_project_file("mcpkg.json")?;
//! println!("Artifacts go to {}", paths.deps_dir.display());
//! # Ok(())
//! # }
//! ```

use crate::platform::VersionOrdering;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default project declaration filename
pub const PROJECT_FILE_NAME: &str = "mcpkg.json";

/// User configuration file (`~/.mcpkg/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// HTTP settings
    #[serde(default)]
    pub network: NetworkConfig,

    /// Compiler and archiver settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Dependency resolver settings
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Modrinth-compatible API base URL
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// Base URL for `maven:` coordinates, tried before project repositories
    #[serde(default = "default_maven_url")]
    pub maven_url: String,

    /// Serve every platform API snapshot from this repository (mirrors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_url: Option<String>,
}

fn default_registry_url() -> String {
    "https://api.modrinth.com/v2".to_string()
}

fn default_maven_url() -> String {
    "https://repo1.maven.org/maven2".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            maven_url: default_maven_url(),
            snapshot_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Java compiler executable
    #[serde(default = "default_javac")]
    pub javac: String,

    /// Java archiver executable
    #[serde(default = "default_jar")]
    pub jar: String,

    /// Upper bound for a single compiler/archiver run, in seconds
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Fail the build when a dependency has no discoverable plugin name
    #[serde(default)]
    pub strict_manifest: bool,
}

fn default_javac() -> String {
    "javac".to_string()
}

fn default_jar() -> String {
    "jar".to_string()
}

fn default_tool_timeout_secs() -> u64 {
    600
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            javac: default_javac(),
            jar: default_jar(),
            tool_timeout_secs: default_tool_timeout_secs(),
            strict_manifest: false,
        }
    }
}

/// Dependency resolver settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// How game versions are ranked when several qualify
    #[serde(default)]
    pub version_ordering: VersionOrdering,

    /// Accept beta/alpha registry versions without `--beta`
    #[serde(default)]
    pub include_beta: bool,
}

impl Config {
    /// Get the default config file path
    ///
    /// Uses MCPKG_CONFIG_DIR if set, otherwise ~/.mcpkg/config.toml
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(config_dir) = std::env::var("MCPKG_CONFIG_DIR") {
            return Ok(PathBuf::from(config_dir).join("config.toml"));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| Error::Other("Could not find home directory".to_string()))?;

        Ok(home.join(".mcpkg").join("config.toml"))
    }

    /// Load config from file, or the defaults if it doesn't exist
    ///
    /// Environment variable overrides:
    /// - `MCPKG_REGISTRY_URL`: Overrides `registry.url`
    /// - `MCPKG_CONFIG_DIR`: Overrides the config directory location
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path()?)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if !path.exists() {
            Self::default()
        } else {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        };

        if let Ok(url) = std::env::var("MCPKG_REGISTRY_URL") {
            if !url.is_empty() {
                config.registry.url = url;
            }
        }

        Ok(config)
    }
}

/// Filesystem locations for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Directory containing the project file
    pub root: PathBuf,
    /// The project declaration itself
    pub project_file: PathBuf,
    /// Lockfile next to the project declaration
    pub lock_file: PathBuf,
    /// Compiled classes, manifest and shaded entries
    pub build_dir: PathBuf,
    /// Final packaged artifact
    pub dist_dir: PathBuf,
    /// Materialized dependency artifacts
    pub deps_dir: PathBuf,
    /// Java sources
    pub source_dir: PathBuf,
}

impl Paths {
    /// Paths for a project rooted at `root` using the default filename.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let project_file = root.join(PROJECT_FILE_NAME);
        Self::with_project_file(root, project_file)
    }

    /// Paths derived from an explicit project file location.
    pub fn from_project_file<P: AsRef<Path>>(project_file: P) -> Result<Self> {
        let project_file = project_file.as_ref();
        let project_file = if project_file.is_absolute() {
            project_file.to_path_buf()
        } else {
            std::env::current_dir()?.join(project_file)
        };
        let root = project_file
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                Error::InvalidProject(format!(
                    "Project file has no parent directory: {}",
                    project_file.display()
                ))
            })?;
        Ok(Self::with_project_file(root, project_file))
    }

    /// Paths for the current directory, or for `--config` if given.
    pub fn discover(project_file: Option<&Path>) -> Result<Self> {
        match project_file {
            Some(file) => Self::from_project_file(file),
            None => Ok(Self::new(std::env::current_dir()?)),
        }
    }

    fn with_project_file(root: PathBuf, project_file: PathBuf) -> Self {
        let lock_file = project_file.with_extension("lock");
        Self {
            build_dir: root.join("build"),
            dist_dir: root.join("dist"),
            deps_dir: root.join(".mcpkg").join("deps"),
            source_dir: root.join("src"),
            lock_file,
            project_file,
            root,
        }
    }

    /// Resolve a project-relative path (absolute paths pass through).
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            return path.to_path_buf();
        }
        if let Ok(rest) = path.strip_prefix("~") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        self.root.join(path)
    }
}
