//! Project declaration (`mcpkg.json`) and dependency specifiers
//!
//! The project file is the only durable project state. It is read on every
//! command and rewritten wholesale after each mutation.
//!
//! # Examples
//!
//! ```no_run
//! use mcpkg::{DependencySpec, Paths, Project};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = Paths::new(".");
//! let mut project = Project::load(&paths.project_file)?;
//!
//! project.dependencies.insert("luckperms".to_string(), "5.4.102".to_string());
//! assert!(matches!(
//!     DependencySpec::classify("5.4.102")?,
//!     DependencySpec::Registry { .. }
//! ));
//!
//! project.save(&paths.project_file)?;
//! # Ok(())
//! # }
//! ```

use crate::platform::Compatibility;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Output path of the plugin manifest inside the build tree
pub const PLUGIN_YML: &str = "plugin.yml";

/// The project declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,

    pub version: String,

    /// Fully-qualified main class, e.g. `com.example.MyPlugin`
    pub main: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    /// Output path inside the build tree -> source path relative to the project root
    #[serde(default)]
    pub resources: BTreeMap<String, String>,

    /// Dependency key -> specifier string
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// Per-dependency shading rules
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shading: BTreeMap<String, ShadingRule>,

    #[serde(default)]
    pub compatibility: Compatibility,

    /// Extra Maven repositories searched for `maven:` coordinates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<String>,
}

/// Which archive entries of a dependency are copied into the build output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadingRule {
    /// `None` includes everything that is not excluded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl Project {
    pub fn new(name: &str, version: &str, main: &str, compatibility: Compatibility) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            main: main.to_string(),
            description: String::new(),
            authors: Vec::new(),
            resources: BTreeMap::new(),
            dependencies: BTreeMap::new(),
            shading: BTreeMap::new(),
            compatibility,
            repositories: Vec::new(),
        }
    }

    /// Load and validate the project file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::InvalidProject(format!(
                "{} not found. Run 'mcpkg init' first.",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let project: Project = serde_json::from_str(&content).map_err(|e| {
            Error::InvalidProject(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        project.validate()?;

        Ok(project)
    }

    /// Rewrite the whole project file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content + "\n")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(Error::InvalidProject(format!(
                "Invalid project name '{}': use letters, digits, '_', '-' or '.'",
                self.name
            )));
        }

        if self.version.trim().is_empty() {
            return Err(Error::InvalidProject("Project version is empty".to_string()));
        }

        validate_main_class(&self.main)?;

        for key in self.dependencies.keys() {
            if !valid_dependency_key(key) {
                return Err(Error::InvalidProject(format!(
                    "Invalid dependency key '{}': it names a file and a registry path",
                    key
                )));
            }
        }

        for key in self.shading.keys() {
            if !self.dependencies.contains_key(key) {
                return Err(Error::InvalidProject(format!(
                    "Shading rule for '{}' has no matching dependency",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Last segment of the main class
    pub fn main_class_name(&self) -> &str {
        self.main.rsplit('.').next().unwrap_or(&self.main)
    }

    /// Package of the main class
    pub fn package_name(&self) -> &str {
        self.main
            .rsplit_once('.')
            .map(|(package, _)| package)
            .unwrap_or("")
    }

    /// Final artifact filename inside the dist directory
    pub fn archive_name(&self) -> String {
        format!("{}-{}.jar", self.name, self.version)
    }

    /// Source of the declared plugin.yml fragment, if any
    pub fn manifest_resource(&self) -> Option<&str> {
        self.resources.get(PLUGIN_YML).map(String::as_str)
    }
}

fn validate_main_class(main: &str) -> Result<()> {
    let segments: Vec<&str> = main.split('.').collect();
    let valid_segment = |s: &&str| {
        let mut chars = s.chars();
        matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
            && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
    };

    if segments.len() < 2 || !segments.iter().all(valid_segment) {
        return Err(Error::InvalidProject(format!(
            "Invalid main class '{}': expected a fully-qualified name like com.example.MyPlugin",
            main
        )));
    }

    Ok(())
}

/// A classified dependency value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySpec {
    /// Registry package; `None` means latest compatible
    Registry { version: Option<String> },
    /// Artifact addressed by Maven coordinates
    Coordinate(Coordinate),
    /// Prebuilt jar already on disk
    Local(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinate {
    /// Path relative to a repository base
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.file_name()
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}-{}.jar", self.artifact, self.version)
    }

    pub fn url(&self, repo_base: &str) -> String {
        format!("{}/{}", repo_base.trim_end_matches('/'), self.repository_path())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "maven:{}:{}@{}", self.group, self.artifact, self.version)
    }
}

const MAVEN_PREFIX: &str = "maven:";
const FILE_PREFIX: &str = "file:";

impl DependencySpec {
    /// Classify a specifier by its prefix and shape
    pub fn classify(value: &str) -> Result<Self> {
        let value = value.trim();

        if let Some(path) = value.strip_prefix(FILE_PREFIX) {
            if path.is_empty() {
                return Err(Error::InvalidSpecifier(value.to_string()));
            }
            return Ok(DependencySpec::Local(PathBuf::from(path)));
        }

        if let Some(coord) = value.strip_prefix(MAVEN_PREFIX) {
            return parse_coordinate(coord)
                .map(DependencySpec::Coordinate)
                .ok_or_else(|| Error::InvalidSpecifier(value.to_string()));
        }

        if looks_like_path(value) {
            return Ok(DependencySpec::Local(PathBuf::from(value)));
        }

        let version = match value {
            "" | "*" | "latest" => None,
            v => Some(v.to_string()),
        };
        Ok(DependencySpec::Registry { version })
    }

    /// Canonical string stored in the project file
    pub fn to_value(&self) -> String {
        match self {
            DependencySpec::Registry { version: None } => "latest".to_string(),
            DependencySpec::Registry { version: Some(v) } => v.clone(),
            DependencySpec::Coordinate(c) => c.to_string(),
            DependencySpec::Local(p) => format!("{}{}", FILE_PREFIX, p.display()),
        }
    }

    /// Parse an `install` argument into a dependency key and specifier.
    ///
    /// Accepts `name`, `name@version`, `maven:group:artifact@version` and
    /// local paths. Coordinates are keyed by artifact id, local jars by file stem.
    pub fn parse_request(request: &str) -> Result<(String, Self)> {
        let request = request.trim();
        if request.is_empty() {
            return Err(Error::InvalidSpecifier(request.to_string()));
        }

        if request.starts_with(MAVEN_PREFIX)
            || request.starts_with(FILE_PREFIX)
            || looks_like_path(request)
        {
            let spec = Self::classify(request)?;
            let key = match &spec {
                DependencySpec::Coordinate(c) => c.artifact.clone(),
                DependencySpec::Local(p) => p
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| Error::InvalidSpecifier(request.to_string()))?,
                DependencySpec::Registry { .. } => {
                    return Err(Error::InvalidSpecifier(request.to_string()))
                }
            };
            if !valid_dependency_key(&key) {
                return Err(Error::InvalidSpecifier(request.to_string()));
            }
            return Ok((key, spec));
        }

        let (name, version) = match request.split_once('@') {
            Some((name, version)) => (name, Some(version.to_string())),
            None => (request, None),
        };
        if !valid_dependency_key(name) {
            return Err(Error::InvalidSpecifier(request.to_string()));
        }
        let version = version.filter(|v| !matches!(v.as_str(), "" | "*" | "latest"));
        Ok((name.to_string(), DependencySpec::Registry { version }))
    }
}

/// Keys become jar file names and registry URL segments
fn valid_dependency_key(key: &str) -> bool {
    !key.trim().is_empty()
        && !key.contains("..")
        && !key.chars().any(|c| matches!(c, '/' | '\\' | '?' | '#'))
}

fn looks_like_path(value: &str) -> bool {
    value.starts_with('/')
        || value.starts_with("./")
        || value.starts_with("../")
        || value.starts_with("~/")
        || value.ends_with(".jar")
}

fn parse_coordinate(coord: &str) -> Option<Coordinate> {
    // group:artifact@version, or group:artifact:version
    let (group_artifact, version) = match coord.rsplit_once('@') {
        Some((ga, v)) => (ga, v),
        None => coord.rsplit_once(':')?,
    };
    let (group, artifact) = group_artifact.split_once(':')?;

    if [group, artifact, version]
        .iter()
        .any(|s| s.is_empty() || s.contains(':') || s.contains('/'))
    {
        return None;
    }

    Some(Coordinate {
        group: group.to_string(),
        artifact: artifact.to_string(),
        version: version.to_string(),
    })
}
