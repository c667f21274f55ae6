//! Dependency resolution and materialization
//!
//! One pass over the declared dependency map classifies every specifier,
//! selects a concrete artifact, makes sure its bytes exist under the deps
//! directory and records the result in a fresh [`Lockfile`]. Files in the
//! deps directory that the pass did not touch are deleted afterwards.
//!
//! # Examples
//!
//! ```no_run
//! use mcpkg::{Config, Lockfile, MavenClient, Paths, Project, RegistryClient, ResolveOptions, Resolver};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let paths = Paths::new(".");
//! let project = Project::load(&paths.project_file)?;
//!
//! let registry = RegistryClient::from_config(&config)?;
//! let maven = MavenClient::from_config(&config)?;
//! let resolver = Resolver::new(&paths, &registry, &maven, ResolveOptions::from_config(&config));
//!
//! let previous = Lockfile::load_from(&paths.lock_file)?;
//! let resolution = resolver.install(&project, previous.as_ref())?;
//! resolution.lockfile.save_to(&paths.lock_file)?;
//! # Ok(())
//! # }
//! ```

use crate::lockfile::{ArtifactSource, LockedArtifact, Lockfile};
use crate::maven::MavenClient;
use crate::platform::{Compatibility, Platform, VersionOrdering, DEFAULT_GAME_VERSION};
use crate::project::{Coordinate, DependencySpec, Project};
use crate::registry::{ModrinthVersion, RegistryClient, VersionType};
use crate::{Config, Error, Paths, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Knobs for one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Re-fetch cached artifacts and skip game version checks
    pub force: bool,
    /// Accept beta and alpha registry versions
    pub include_beta: bool,
    pub ordering: VersionOrdering,
}

impl ResolveOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            force: false,
            include_beta: config.resolver.include_beta,
            ordering: config.resolver.version_ordering,
        }
    }
}

/// A registry version chosen for a dependency
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub version: &'a ModrinthVersion,
    /// Preferred shared game version, `None` when forced past the check
    pub game_version: Option<String>,
    /// Selected only because `force` skipped the game version check
    pub forced: bool,
}

/// Pick a registry version for `package`.
///
/// Versions are scanned in registry order and the first one passing every
/// filter wins: requested version number, loader, game version (skipped with
/// `force`) and release type (skipped with `include_beta`).
pub fn select_version<'a>(
    package: &str,
    versions: &'a [ModrinthVersion],
    compatibility: &Compatibility,
    requested: Option<&str>,
    options: &ResolveOptions,
) -> Result<Selection<'a>> {
    let reference = compatibility
        .active_version(options.ordering)
        .unwrap_or(DEFAULT_GAME_VERSION)
        .to_string();

    let chosen = versions.iter().find(|v| {
        requested.map_or(true, |r| v.version_number == r)
            && compatibility.supports_any_platform(&v.loaders)
            && (options.force || !compatibility.shared_versions(&v.game_versions).is_empty())
            && (options.include_beta || v.version_type == VersionType::Release)
    });

    let Some(version) = chosen else {
        return Err(Error::NoCompatibleVersion {
            package: package.to_string(),
            detail: describe_failure(versions, compatibility, requested),
        });
    };

    let shared = compatibility.shared_versions(&version.game_versions);
    let game_version = options
        .ordering
        .select(&shared, &reference)
        .map(str::to_string);
    let forced = game_version.is_none();

    if forced {
        tracing::warn!(
            package,
            version = %version.version_number,
            supported = ?version.game_versions,
            "selected version does not declare any of the project's game versions (--force)"
        );
    }

    Ok(Selection {
        version,
        game_version,
        forced,
    })
}

fn describe_failure(
    versions: &[ModrinthVersion],
    compatibility: &Compatibility,
    requested: Option<&str>,
) -> String {
    if versions.is_empty() {
        return ": the project has no published versions".to_string();
    }
    if let Some(requested) = requested {
        if !versions.iter().any(|v| v.version_number == requested) {
            return format!(": version {} does not exist", requested);
        }
        return format!(
            ": version {} does not support platforms {:?} and game versions {:?}",
            requested, compatibility.platforms, compatibility.versions
        );
    }
    format!(
        " for platforms {:?} and game versions {:?}",
        compatibility.platforms, compatibility.versions
    )
}

/// How an entry was satisfied during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Artifact was already on disk
    Cached,
    Downloaded,
    /// Local file reference, used in place
    Linked,
}

/// Result of a resolution pass
#[derive(Debug, Clone)]
pub struct Resolution {
    pub lockfile: Lockfile,
    /// Dependency key, outcome; declared order
    pub outcomes: Vec<(String, Outcome)>,
    /// Files deleted from the deps directory
    pub collected: Vec<PathBuf>,
}

impl Resolution {
    pub fn downloaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == Outcome::Downloaded)
            .count()
    }
}

/// Classpath entries for a build, read from the lockfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classpath {
    pub platform: Option<PathBuf>,
    /// Dependency key and artifact path in declared order
    pub artifacts: Vec<(String, PathBuf)>,
}

impl Classpath {
    /// Platform jar first, then every dependency
    pub fn entries(&self) -> Vec<PathBuf> {
        self.platform
            .iter()
            .cloned()
            .chain(self.artifacts.iter().map(|(_, p)| p.clone()))
            .collect()
    }
}

pub struct Resolver<'a> {
    paths: &'a Paths,
    registry: &'a RegistryClient,
    maven: &'a MavenClient,
    options: ResolveOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(
        paths: &'a Paths,
        registry: &'a RegistryClient,
        maven: &'a MavenClient,
        options: ResolveOptions,
    ) -> Self {
        Self {
            paths,
            registry,
            maven,
            options,
        }
    }

    /// Materialize the platform API and every declared dependency.
    ///
    /// Unforced passes reuse artifacts recorded in `previous` whose specifier
    /// is unchanged and whose file still exists, without any network access.
    /// On error nothing is collected; the caller must not write a lockfile.
    pub fn install(&self, project: &Project, previous: Option<&Lockfile>) -> Result<Resolution> {
        fs::create_dir_all(&self.paths.deps_dir)?;

        let mut touched: HashSet<PathBuf> = HashSet::new();
        let mut lockfile = Lockfile::new();
        let mut outcomes = Vec::with_capacity(project.dependencies.len());

        if let Some(artifact) = self.materialize_platform(&project.compatibility, &mut touched)? {
            lockfile.set_platform(Some(artifact));
        }

        for (key, value) in &project.dependencies {
            let spec = DependencySpec::classify(value)?;
            let (artifact, outcome) =
                self.materialize(project, key, value, &spec, previous, &mut touched)?;
            tracing::debug!(%key, version = %artifact.version, path = %artifact.path.display(), ?outcome, "materialized");
            lockfile.update_package(key.clone(), artifact);
            outcomes.push((key.clone(), outcome));
        }

        let collected = self.collect_garbage(&touched)?;

        Ok(Resolution {
            lockfile,
            outcomes,
            collected,
        })
    }

    /// Parse an install request, add it to a copy of `project` and run a pass.
    ///
    /// `project` is only updated when the pass succeeds. Returns the key.
    pub fn add(
        &self,
        project: &mut Project,
        request: &str,
        previous: Option<&Lockfile>,
    ) -> Result<(String, Resolution)> {
        let (key, spec) = DependencySpec::parse_request(request)?;

        let mut candidate = project.clone();
        candidate.dependencies.insert(key.clone(), spec.to_value());
        let resolution = self.install(&candidate, previous)?;

        *project = candidate;
        Ok((key, resolution))
    }

    /// Drop `key` from the project and collect its artifact.
    pub fn remove(
        &self,
        project: &mut Project,
        key: &str,
        previous: Option<&Lockfile>,
    ) -> Result<Resolution> {
        if !project.dependencies.contains_key(key) {
            return Err(Error::InvalidProject(format!(
                "'{}' is not a dependency of {}",
                key, project.name
            )));
        }

        let mut candidate = project.clone();
        candidate.dependencies.remove(key);
        candidate.shading.remove(key);
        let resolution = self.install(&candidate, previous)?;

        *project = candidate;
        Ok(resolution)
    }

    fn materialize_platform(
        &self,
        compatibility: &Compatibility,
        touched: &mut HashSet<PathBuf>,
    ) -> Result<Option<LockedArtifact>> {
        let Some(platform) = compatibility.active_platform() else {
            tracing::warn!(
                platforms = ?compatibility.platforms,
                "no known platform declared; building without a platform API jar"
            );
            return Ok(None);
        };

        let version = compatibility
            .active_version(self.options.ordering)
            .unwrap_or(DEFAULT_GAME_VERSION)
            .to_string();
        let path = platform_jar_path(&self.paths.deps_dir, platform, &version);

        if !path.exists() || self.options.force {
            let bytes = self.maven.download_platform_api(platform, &version)?;
            fs::write(&path, bytes)?;
        }
        touched.insert(path.clone());

        Ok(Some(LockedArtifact {
            source: ArtifactSource::Platform,
            checksum: sha256_file(&path)?,
            version,
            specifier: platform.id().to_string(),
            path,
        }))
    }

    fn materialize(
        &self,
        project: &Project,
        key: &str,
        value: &str,
        spec: &DependencySpec,
        previous: Option<&Lockfile>,
        touched: &mut HashSet<PathBuf>,
    ) -> Result<(LockedArtifact, Outcome)> {
        let reusable = previous
            .and_then(|lock| lock.get_package(key))
            .filter(|locked| !self.options.force && locked.specifier == value && locked.path.is_file());

        let (artifact, outcome) = match (spec, reusable) {
            (DependencySpec::Local(path), _) => {
                let path = self.paths.resolve(path);
                if !path.is_file() {
                    return Err(Error::MissingLocalFile(path));
                }
                let artifact = LockedArtifact {
                    source: ArtifactSource::Local,
                    version: String::new(),
                    specifier: value.to_string(),
                    checksum: sha256_file(&path)?,
                    path,
                };
                (artifact, Outcome::Linked)
            }
            (_, Some(locked)) => (locked.clone(), Outcome::Cached),
            (DependencySpec::Registry { version }, None) => {
                self.materialize_registry(project, key, value, version.as_deref())?
            }
            (DependencySpec::Coordinate(coordinate), None) => {
                self.materialize_coordinate(project, value, coordinate)?
            }
        };

        touched.insert(artifact.path.clone());
        Ok((artifact, outcome))
    }

    fn materialize_registry(
        &self,
        project: &Project,
        key: &str,
        value: &str,
        requested: Option<&str>,
    ) -> Result<(LockedArtifact, Outcome)> {
        let (_, versions) = self.registry.resolve(key)?;
        let selection = select_version(
            key,
            &versions,
            &project.compatibility,
            requested,
            &self.options,
        )?;
        let version = selection.version;

        let path = self
            .paths
            .deps_dir
            .join(format!("{}-{}.jar", key, version.version_number));

        let outcome = if path.is_file() && !self.options.force {
            Outcome::Cached
        } else {
            let file = version.primary_file().ok_or_else(|| {
                Error::Metadata(format!(
                    "{} {} has no downloadable files",
                    key, version.version_number
                ))
            })?;
            let bytes = self.registry.download(file)?;
            fs::write(&path, bytes)?;
            Outcome::Downloaded
        };

        Ok((
            LockedArtifact {
                source: ArtifactSource::Registry,
                version: version.version_number.clone(),
                specifier: value.to_string(),
                checksum: sha256_file(&path)?,
                path,
            },
            outcome,
        ))
    }

    fn materialize_coordinate(
        &self,
        project: &Project,
        value: &str,
        coordinate: &Coordinate,
    ) -> Result<(LockedArtifact, Outcome)> {
        let path = self.paths.deps_dir.join(coordinate.file_name());

        let outcome = if path.is_file() && !self.options.force {
            Outcome::Cached
        } else {
            let bytes = self
                .maven
                .fetch_coordinate(coordinate, &project.repositories)?;
            fs::write(&path, bytes)?;
            Outcome::Downloaded
        };

        Ok((
            LockedArtifact {
                source: ArtifactSource::Maven,
                version: coordinate.version.clone(),
                specifier: value.to_string(),
                checksum: sha256_file(&path)?,
                path,
            },
            outcome,
        ))
    }

    fn collect_garbage(&self, touched: &HashSet<PathBuf>) -> Result<Vec<PathBuf>> {
        let mut collected = Vec::new();

        for entry in fs::read_dir(&self.paths.deps_dir)? {
            let path = entry?.path();
            if path.is_file() && !touched.contains(&path) {
                fs::remove_file(&path)?;
                tracing::debug!(path = %path.display(), "collected unused artifact");
                collected.push(path);
            }
        }

        collected.sort();
        Ok(collected)
    }
}

/// Deterministic location of a platform API jar
pub fn platform_jar_path(deps_dir: &Path, platform: Platform, game_version: &str) -> PathBuf {
    deps_dir.join(format!("{}-api-{}.jar", platform.id(), game_version))
}

/// Build classpath from the lockfile without touching the network.
///
/// Every declared dependency needs a lockfile entry with the same specifier
/// and an existing file, and the locked platform API must match the active
/// game version; otherwise the project must be installed again.
pub fn locate(
    paths: &Paths,
    project: &Project,
    lockfile: Option<&Lockfile>,
    ordering: VersionOrdering,
) -> Result<Classpath> {
    let stale = |what: &str| {
        Error::InvalidProject(format!(
            "{} is not installed or out of date. Run 'mcpkg install' first.",
            what
        ))
    };

    let platform = match project.compatibility.active_platform() {
        None => None,
        Some(platform) => {
            let version = project
                .compatibility
                .active_version(ordering)
                .unwrap_or(DEFAULT_GAME_VERSION);
            let locked = lockfile
                .and_then(|lock| lock.platform.as_ref())
                .filter(|locked| {
                    locked.specifier == platform.id()
                        && locked.version == version
                        && locked.path.is_file()
                })
                .ok_or_else(|| stale(&format!("The {} {} API", platform, version)))?;
            Some(locked.path.clone())
        }
    };

    let mut artifacts = Vec::with_capacity(project.dependencies.len());
    for (key, value) in &project.dependencies {
        let path = match DependencySpec::classify(value)? {
            DependencySpec::Local(path) => {
                let path = paths.resolve(path);
                if !path.is_file() {
                    return Err(Error::MissingLocalFile(path));
                }
                path
            }
            _ => lockfile
                .and_then(|lock| lock.get_package(key))
                .filter(|locked| locked.specifier == *value && locked.path.is_file())
                .map(|locked| locked.path.clone())
                .ok_or_else(|| stale(&format!("Dependency '{}'", key)))?,
        };
        artifacts.push((key.clone(), path));
    }

    Ok(Classpath {
        platform,
        artifacts,
    })
}

/// SHA256 of a file as lowercase hex
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
