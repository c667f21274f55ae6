use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure category, stable across message wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed project declaration, user config, or identifiers
    Configuration,
    /// Package, version, or metadata could not be resolved
    Resolution,
    /// Local filesystem problems
    Io,
    /// The compiler or archiver failed
    ExternalTool,
    /// Transport-level failures talking to a registry
    Network,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Entry '{entry}' in {archive} is not valid UTF-8 text")]
    Decode { archive: PathBuf, entry: String },

    #[error("Invalid project: {0}")]
    InvalidProject(String),

    #[error("Invalid dependency specifier '{0}'")]
    InvalidSpecifier(String),

    #[error("Package not found: {0}\n\n\
             Hint: Check the spelling or look it up with:\n\
               mcpkg search {0}\n\n\
             If the plugin is not published on the registry, download the jar and add it locally:\n\
               mcpkg install ./libs/{0}.jar")]
    PackageNotFound(String),

    #[error("No compatible version of '{package}' found{detail}\n\n\
             Hint: Possible solutions:\n\
             1. Check the platforms and versions in your project's compatibility section\n\
             2. Pin a specific version: mcpkg install {package}@<version>\n\
             3. Allow pre-releases with --beta, or bypass game version checks with --force\n\
             4. Add a downloaded jar as a local dependency: mcpkg install ./libs/{package}.jar")]
    NoCompatibleVersion {
        package: String,
        /// Already prefixed with ": " when present
        detail: String,
    },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Local dependency not found: {}", .0.display())]
    MissingLocalFile(PathBuf),

    #[error("No plugin name found in {}\n\n\
             Hint: The artifact has no plugin.yml with a 'name' field.\n\
             Set build.strict_manifest = false in your config to skip such artifacts.",
             .0.display())]
    ManifestName(PathBuf),

    #[error("No Java source files found under {}", .0.display())]
    NoSources(PathBuf),

    #[error("{tool} failed with {status}:\n{stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} did not finish within {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    #[error("Registry error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Json(_)
            | Error::Yaml(_)
            | Error::TomlDe(_)
            | Error::TomlSer(_)
            | Error::Pattern(_)
            | Error::InvalidProject(_)
            | Error::InvalidSpecifier(_) => ErrorKind::Configuration,
            Error::PackageNotFound(_)
            | Error::NoCompatibleVersion { .. }
            | Error::Metadata(_)
            | Error::Xml(_)
            | Error::ManifestName(_) => ErrorKind::Resolution,
            Error::Io(_)
            | Error::Zip(_)
            | Error::Decode { .. }
            | Error::MissingLocalFile(_)
            | Error::NoSources(_)
            | Error::Other(_) => ErrorKind::Io,
            Error::ToolFailed { .. } | Error::ToolTimeout { .. } => ErrorKind::ExternalTool,
            Error::Http(_) | Error::Network(_) => ErrorKind::Network,
        }
    }
}
