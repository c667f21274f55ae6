//! New project layout
//!
//! `mcpkg init` writes the project file, a main class, a plugin.yml fragment
//! and `.gitignore` entries. Nothing is prompted for; every value comes from
//! [`InitOptions`] or a default.

use crate::platform::{Compatibility, Platform, DEFAULT_GAME_VERSION};
use crate::project::{Project, PLUGIN_YML};
use crate::template::TemplateContext;
use crate::{Error, Paths, Result};
use std::fs;
use std::path::{Path, PathBuf};

const MAIN_CLASS_TEMPLATE: &str = include_str!("../static/Main.java");
const MANIFEST_TEMPLATE: &str = include_str!("../static/plugin.yml");
const MANIFEST_SOURCE: &str = "resources/plugin.yml";
const IGNORED: [&str; 3] = ["/build/", "/dist/", "/.mcpkg/"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOptions {
    /// Defaults to the project directory name
    pub name: Option<String>,
    /// Defaults to `com.example.<Name>`
    pub main: Option<String>,
    pub version: String,
    pub description: String,
    pub authors: Vec<String>,
    pub platform: String,
    /// Defaults to the newest snapshot of the platform API
    pub game_version: Option<String>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            name: None,
            main: None,
            version: "1.0.0".to_string(),
            description: String::new(),
            authors: Vec::new(),
            platform: Platform::Paper.id().to_string(),
            game_version: None,
        }
    }
}

/// What `init` created
#[derive(Debug, Clone)]
pub struct Scaffold {
    pub project: Project,
    pub files: Vec<PathBuf>,
}

/// Create a project under `paths.root`.
///
/// `latest_version` is asked for the game version when none was given; a
/// failure there falls back to [`DEFAULT_GAME_VERSION`].
pub fn init<F>(paths: &Paths, options: &InitOptions, latest_version: F) -> Result<Scaffold>
where
    F: FnOnce(Platform) -> Result<String>,
{
    if paths.project_file.exists() {
        return Err(Error::InvalidProject(format!(
            "{} already exists",
            paths.project_file.display()
        )));
    }

    let name = match &options.name {
        Some(name) => name.clone(),
        None => paths
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidProject("Cannot derive a project name; pass --name".to_string()))?,
    };
    let main = options
        .main
        .clone()
        .unwrap_or_else(|| format!("com.example.{}", class_name(&name)));

    let game_version = match (&options.game_version, Platform::parse(&options.platform)) {
        (Some(version), _) => version.clone(),
        (None, Some(platform)) => latest_version(platform).unwrap_or_else(|e| {
            tracing::warn!(%platform, error = %e, "could not look up the latest game version, using {}", DEFAULT_GAME_VERSION);
            DEFAULT_GAME_VERSION.to_string()
        }),
        (None, None) => DEFAULT_GAME_VERSION.to_string(),
    };

    let mut project = Project::new(
        &name,
        &options.version,
        &main,
        Compatibility::new(&options.platform, &game_version),
    );
    project.description = options.description.clone();
    project.authors = options.authors.clone();
    project
        .resources
        .insert(PLUGIN_YML.to_string(), MANIFEST_SOURCE.to_string());
    project.validate()?;

    let context = TemplateContext::from_project(&project);
    let mut files = Vec::new();

    let package_dir = project
        .package_name()
        .split('.')
        .fold(paths.source_dir.clone(), |dir, part| dir.join(part));
    let main_file = package_dir.join(format!("{}.java", project.main_class_name()));
    write_new(&main_file, &context.render(MAIN_CLASS_TEMPLATE), &mut files)?;

    let manifest_file = paths.resolve(MANIFEST_SOURCE);
    write_new(&manifest_file, MANIFEST_TEMPLATE, &mut files)?;

    let gitignore = paths.root.join(".gitignore");
    if update_gitignore(&gitignore)? {
        files.push(gitignore);
    }

    project.save(&paths.project_file)?;
    files.push(paths.project_file.clone());

    tracing::debug!(project = %project.name, files = files.len(), "scaffolded");
    Ok(Scaffold { project, files })
}

/// Java class name for a project name: `my-cool_plugin` -> `MyCoolPlugin`
pub fn class_name(name: &str) -> String {
    let mut out: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect();

    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "Plugin");
    }
    out
}

/// Existing sources and resources are never overwritten
fn write_new(path: &Path, content: &str, files: &mut Vec<PathBuf>) -> Result<()> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "exists, not overwriting");
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    files.push(path.to_path_buf());
    Ok(())
}

/// Append missing ignore entries. Returns whether the file changed.
fn update_gitignore(path: &Path) -> Result<bool> {
    let existing = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let missing: Vec<&str> = IGNORED
        .iter()
        .copied()
        .filter(|entry| !existing.lines().any(|line| line.trim() == *entry))
        .collect();
    if missing.is_empty() {
        return Ok(false);
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for entry in missing {
        content.push_str(entry);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn offline(_: Platform) -> Result<String> {
        Err(Error::Network("offline".to_string()))
    }

    #[test]
    fn test_init_writes_layout() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("cool-plugin");
        fs::create_dir_all(&root).unwrap();
        let paths = Paths::new(&root);

        let scaffold = init(&paths, &InitOptions::default(), |_| Ok("1.21.5".to_string())).unwrap();
        let project = scaffold.project;

        assert_eq!(project.name, "cool-plugin");
        assert_eq!(project.main, "com.example.CoolPlugin");
        assert_eq!(project.compatibility, Compatibility::new("paper", "1.21.5"));

        let main = fs::read_to_string(root.join("src/com/example/CoolPlugin.java")).unwrap();
        assert!(main.starts_with("package com.example;"));
        assert!(main.contains("public class CoolPlugin extends JavaPlugin"));
        assert!(!main.contains("$__"));

        assert!(root.join(MANIFEST_SOURCE).exists());
        assert_eq!(project.manifest_resource(), Some(MANIFEST_SOURCE));
        assert_eq!(Project::load(&paths.project_file).unwrap(), project);

        let gitignore = fs::read_to_string(root.join(".gitignore")).unwrap();
        assert!(gitignore.contains("/build/\n/dist/\n/.mcpkg/\n"));
    }

    #[test]
    fn test_init_falls_back_when_offline() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        let options = InitOptions {
            name: Some("Demo".into()),
            main: Some("dev.demo.DemoPlugin".into()),
            ..Default::default()
        };

        let scaffold = init(&paths, &options, offline).unwrap();
        assert_eq!(scaffold.project.compatibility.versions, vec![DEFAULT_GAME_VERSION]);
        assert!(dir.path().join("src/dev/demo/DemoPlugin.java").exists());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        let options = InitOptions {
            name: Some("Demo".into()),
            game_version: Some("1.20.6".into()),
            ..Default::default()
        };

        init(&paths, &options, offline).unwrap();
        let err = init(&paths, &options, offline).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_init_keeps_existing_gitignore_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "target\n/build/").unwrap();
        let paths = Paths::new(dir.path());
        let options = InitOptions {
            name: Some("Demo".into()),
            game_version: Some("1.20.6".into()),
            ..Default::default()
        };

        init(&paths, &options, offline).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join(".gitignore")).unwrap(),
            "target\n/build/\n/dist/\n/.mcpkg/\n"
        );
    }

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("my-cool_plugin"), "MyCoolPlugin");
        assert_eq!(class_name("Essentials"), "Essentials");
        assert_eq!(class_name("123"), "Plugin123");
        assert_eq!(class_name("--"), "Plugin");
    }

    #[test]
    fn test_invalid_name_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        let options = InitOptions {
            name: Some("bad name".into()),
            game_version: Some("1.20.6".into()),
            ..Default::default()
        };
        assert!(init(&paths, &options, offline).is_err());
        assert!(!paths.source_dir.exists());
    }
}
