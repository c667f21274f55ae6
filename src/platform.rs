//! Target platforms, compatibility constraints and version ordering
//!
//! A project declares an ordered list of platforms and a set of game versions.
//! Only [`Platform`] values are resolvable against the registry and snapshot
//! repositories; other identifiers are kept in the project file but ignored.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Game version used when nothing better is known (offline init, empty lists).
pub const DEFAULT_GAME_VERSION: &str = "1.21.4";

/// Server implementations with a known snapshot repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Paper,
    Spigot,
    Bukkit,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Paper, Platform::Spigot, Platform::Bukkit];

    /// Parse a platform identifier (case-insensitive). Unknown names yield `None`.
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "paper" => Some(Platform::Paper),
            "spigot" => Some(Platform::Spigot),
            "bukkit" => Some(Platform::Bukkit),
            _ => None,
        }
    }

    /// Loader identifier used by the registry
    pub fn id(&self) -> &'static str {
        match self {
            Platform::Paper => "paper",
            Platform::Spigot => "spigot",
            Platform::Bukkit => "bukkit",
        }
    }

    /// Maven artifact directory holding the platform API snapshots
    pub fn snapshot_repository(&self) -> &'static str {
        match self {
            Platform::Paper => {
                "https://repo.papermc.io/repository/maven-public/io/papermc/paper/paper-api"
            }
            Platform::Spigot => {
                "https://hub.spigotmc.org/nexus/content/repositories/snapshots/org/spigotmc/spigot-api"
            }
            Platform::Bukkit => {
                "https://hub.spigotmc.org/nexus/content/repositories/snapshots/org/bukkit/bukkit"
            }
        }
    }

    /// Artifact id inside the snapshot repository
    pub fn artifact_id(&self) -> &'static str {
        match self {
            Platform::Paper => "paper-api",
            Platform::Spigot => "spigot-api",
            Platform::Bukkit => "bukkit",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Policy for choosing between several candidate game versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionOrdering {
    /// Smallest edit distance to the reference wins
    #[default]
    #[serde(rename = "textual_similarity")]
    TextualSimilarity,
    /// Highest version wins, compared component by component
    #[serde(rename = "semver")]
    SemVer,
}

impl VersionOrdering {
    /// Pick one candidate relative to `reference`. Returns `None` for an empty list.
    pub fn select<'a, S: AsRef<str>>(&self, candidates: &'a [S], reference: &str) -> Option<&'a str> {
        let mut best: Option<&'a str> = None;
        for candidate in candidates {
            let candidate = candidate.as_ref();
            best = match best {
                None => Some(candidate),
                Some(current) if self.prefers(candidate, current, reference) => Some(candidate),
                keep => keep,
            };
        }
        best
    }

    /// Whether `a` is strictly preferred over `b`
    fn prefers(&self, a: &str, b: &str, reference: &str) -> bool {
        match self {
            VersionOrdering::TextualSimilarity => {
                levenshtein_distance(a, reference) < levenshtein_distance(b, reference)
            }
            VersionOrdering::SemVer => compare_versions(a, b) == Ordering::Greater,
        }
    }
}

/// Compatibility section of the project file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    /// Target platforms in priority order
    #[serde(default)]
    pub platforms: Vec<String>,

    /// Target game versions
    #[serde(default)]
    pub versions: Vec<String>,
}

impl Compatibility {
    pub fn new(platform: &str, version: &str) -> Self {
        Self {
            platforms: vec![platform.to_string()],
            versions: vec![version.to_string()],
        }
    }

    /// First declared platform that is resolvable
    pub fn active_platform(&self) -> Option<Platform> {
        self.platforms.iter().find_map(|p| Platform::parse(p))
    }

    /// Game version the project builds against
    pub fn active_version(&self, ordering: VersionOrdering) -> Option<&str> {
        ordering.select(&self.versions, DEFAULT_GAME_VERSION)
    }

    /// Whether any of `loaders` is a declared platform
    pub fn supports_any_platform<S: AsRef<str>>(&self, loaders: &[S]) -> bool {
        loaders.iter().any(|loader| {
            self.platforms
                .iter()
                .any(|p| p.eq_ignore_ascii_case(loader.as_ref()))
        })
    }

    /// Declared game versions also present in `game_versions`
    pub fn shared_versions<S: AsRef<str>>(&self, game_versions: &[S]) -> Vec<String> {
        self.versions
            .iter()
            .filter(|v| game_versions.iter().any(|g| g.as_ref() == v.as_str()))
            .cloned()
            .collect()
    }
}

/// `api-version` value for plugin.yml: the major.minor part of a game version
pub fn api_version(game_version: &str) -> String {
    game_version
        .split('.')
        .take(2)
        .collect::<Vec<_>>()
        .join(".")
}

/// Compare two version strings numerically where possible.
///
/// Missing components count as zero (1.21 == 1.21.0). Strings that are not
/// numeric dotted versions fall back to plain string comparison.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn parse_lenient(version: &str) -> Option<Version> {
    let version = version.trim().trim_start_matches('v');
    let normalized = match version.matches('.').count() {
        0 => format!("{}.0.0", version),
        1 => format!("{}.0", version),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Calculate Levenshtein distance between two strings
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();
    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in matrix[0].iter_mut().enumerate() {
        *val = j;
    }

    for (i, c1) in s1.chars().enumerate() {
        for (j, c2) in s2.chars().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };
            matrix[i + 1][j + 1] = (matrix[i][j + 1] + 1)
                .min(matrix[i + 1][j] + 1)
                .min(matrix[i][j] + cost);
        }
    }

    matrix[len1][len2]
}
