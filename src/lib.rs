//! mcpkg - Build and dependency tool for Minecraft server plugins
//!
//! mcpkg scaffolds plugin projects, resolves their dependencies against the
//! Modrinth registry, Maven repositories or local jars, and packages them with
//! the JDK into a single distributable jar:
//!
//! - Registry selection filtered by platform, game version and release type
//! - TOML lockfile with SHA256 checksums so builds run offline
//! - Platform API jars resolved from Maven snapshot metadata
//! - Selective shading of dependency contents with glob rules
//! - Merged plugin.yml with discovered `depend` entries
//!
//! # Examples
//!
//! ```no_run
//! use mcpkg::{Assembler, Config, JdkToolchain, Lockfile, Paths, Project};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let paths = Paths::new(".");
//! let project = Project::load(&paths.project_file)?;
//! let lockfile = Lockfile::load_from(&paths.lock_file)?;
//!
//! let toolchain = JdkToolchain::from_config(&config.build);
//! let output = Assembler::new(&paths, &toolchain).build(&project, lockfile.as_ref())?;
//! println!("Built {}", output.archive.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`project`] - mcpkg.json and dependency specifiers
//! - [`registry`] - Modrinth registry client
//! - [`maven`] - Platform API snapshots and Maven coordinates
//! - [`resolver`] - Install pass, lockfile writing and garbage collection
//! - [`archive`] - Jar inspection with include/exclude globs
//! - [`plugin_yml`] - Manifest fragments and merging
//! - [`assembler`] - Build pipeline
//! - [`toolchain`] - javac/jar invocation
//! - [`scaffold`] - Project initialization
//! - [`config`] - User configuration and project paths
//! - [`error`] - Error types and result handling

pub mod archive;
pub mod assembler;
pub mod config;
pub mod error;
mod http;
pub mod lockfile;
pub mod maven;
pub mod platform;
pub mod plugin_yml;
pub mod project;
pub mod registry;
pub mod resolver;
pub mod scaffold;
pub mod template;
pub mod toolchain;

pub use archive::{ArchiveInspector, EntryFilter, Inspection, LazyEntry};
pub use assembler::{Assembler, BuildOutput};
pub use config::{Config, Paths, PROJECT_FILE_NAME};
pub use error::{Error, ErrorKind, Result};
pub use lockfile::{ArtifactSource, LockedArtifact, Lockfile};
pub use maven::{MavenClient, SnapshotArtifact};
pub use platform::{Compatibility, Platform, VersionOrdering, DEFAULT_GAME_VERSION};
pub use project::{Coordinate, DependencySpec, Project, ShadingRule};
pub use registry::{ModrinthProject, ModrinthVersion, RegistryClient, SearchResponse, VersionType};
pub use resolver::{
    locate, select_version, Classpath, Outcome, Resolution, ResolveOptions, Resolver, Selection,
};
pub use scaffold::{init, InitOptions, Scaffold};
pub use template::TemplateContext;
pub use toolchain::{JdkToolchain, Toolchain};
