//! plugin.yml fragments, name discovery and merging
//!
//! The project may declare a partial `plugin.yml`. At build time it is merged
//! with values derived from the project file and with the names of every
//! plugin the project depends on.

use crate::archive::ArchiveInspector;
use crate::platform::api_version;
use crate::project::{Project, PLUGIN_YML};
use crate::{Error, Result};
use serde_yaml_ng::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::thread;

/// Values the project itself contributes to the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDefaults {
    pub name: String,
    pub version: String,
    pub main: String,
    pub description: String,
    pub authors: Vec<String>,
    /// Names of plugins this one requires
    pub depend: Vec<String>,
    /// Game version the `api-version` key is derived from
    pub game_version: Option<String>,
}

impl ManifestDefaults {
    pub fn from_project(project: &Project, depend: Vec<String>, game_version: Option<&str>) -> Self {
        Self {
            name: project.name.clone(),
            version: project.version.clone(),
            main: project.main.clone(),
            description: project.description.clone(),
            authors: project.authors.clone(),
            depend,
            game_version: game_version.map(str::to_string),
        }
    }

    /// Non-empty values as a YAML mapping
    pub fn to_mapping(&self) -> Mapping {
        let mut mapping = Mapping::new();
        let scalars = [
            ("name", self.name.clone()),
            ("version", self.version.clone()),
            ("main", self.main.clone()),
            ("description", self.description.clone()),
            (
                "api-version",
                self.game_version.as_deref().map(api_version).unwrap_or_default(),
            ),
        ];
        for (key, value) in scalars {
            if !value.trim().is_empty() {
                mapping.insert(Value::from(key), Value::from(value));
            }
        }

        for (key, values) in [("authors", &self.authors), ("depend", &self.depend)] {
            if !values.is_empty() {
                let sequence = values.iter().cloned().map(Value::from).collect();
                mapping.insert(Value::from(key), Value::Sequence(sequence));
            }
        }

        mapping
    }
}

/// Parse a manifest fragment. Empty text is an empty mapping.
pub fn parse_fragment(text: &str) -> Result<Mapping> {
    match serde_yaml_ng::from_str::<Value>(text)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(Error::InvalidProject(
            "plugin.yml fragment must be a YAML mapping".to_string(),
        )),
    }
}

/// Merge project-derived `defaults` into a declared `fragment`.
///
/// Non-empty default scalars overwrite the fragment. Sequences are unioned,
/// fragment elements first, without duplicates; a scalar the fragment wrote
/// where the defaults carry a sequence counts as a one-element sequence. A
/// singular `author` in the fragment moves to the front of `authors`.
pub fn merge(mut fragment: Mapping, defaults: &Mapping) -> Mapping {
    if let Some(author) = fragment.remove("author") {
        let mut authors = vec![author];
        if let Some(existing) = fragment.remove("authors") {
            authors.extend(into_sequence(existing));
        }
        fragment.insert(Value::from("authors"), Value::Sequence(authors));
    }

    for (key, value) in defaults {
        if is_empty(value) {
            continue;
        }

        let merged = match (fragment.get(key).cloned(), value) {
            (Some(declared), Value::Sequence(derived)) if !is_empty(&declared) => {
                Value::Sequence(union(&into_sequence(declared), derived))
            }
            _ => value.clone(),
        };
        fragment.insert(key.clone(), merged);
    }

    for value in fragment.values_mut() {
        if let Value::Sequence(items) = value {
            *items = union(items, &[]);
        }
    }

    fragment
}

fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Sequence(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn union(first: &[Value], second: &[Value]) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(mapping) => mapping.is_empty(),
        _ => false,
    }
}

/// Serialize a merged manifest
pub fn to_yaml(mapping: &Mapping) -> Result<String> {
    Ok(serde_yaml_ng::to_string(mapping)?)
}

/// `name` declared by the plugin.yml inside an archive, if any
pub fn plugin_name(archive: &Path) -> Result<Option<String>> {
    let include = [PLUGIN_YML];
    let inspection = ArchiveInspector::open::<_, &str>(archive, &[], Some(include.as_slice()))?;

    let Some(entry) = inspection.entry(PLUGIN_YML) else {
        return Ok(None);
    };

    let manifest: Value = match serde_yaml_ng::from_str(&entry.text()?) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(archive = %archive.display(), error = %e, "unparseable plugin.yml");
            return Ok(None);
        }
    };

    Ok(manifest
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string))
}

/// Plugin names of every artifact, looked up concurrently.
///
/// Results keep the order of `artifacts`. Artifacts without a name are
/// skipped, or rejected with [`Error::ManifestName`] when `strict` is set.
pub fn discover_names(artifacts: &[PathBuf], strict: bool) -> Result<Vec<String>> {
    let lookups: Vec<Result<Option<String>>> = thread::scope(|scope| {
        let handles: Vec<_> = artifacts
            .iter()
            .map(|path| scope.spawn(move || plugin_name(path)))
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::Other("Name lookup thread panicked".to_string())))
            })
            .collect()
    });

    let mut names = Vec::with_capacity(artifacts.len());
    for (path, lookup) in artifacts.iter().zip(lookups) {
        match lookup {
            Ok(Some(name)) => {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            Ok(None) | Err(Error::Decode { .. }) if !strict => {
                tracing::warn!(artifact = %path.display(), "no plugin name found, not adding to depend");
            }
            Ok(None) | Err(Error::Decode { .. }) => return Err(Error::ManifestName(path.clone())),
            Err(e) => return Err(e),
        }
    }

    Ok(names)
}
