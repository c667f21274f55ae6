//! Test utilities shared by the integration tests.
//!
//! [`MockRepository`] serves the registry API, platform snapshot metadata and
//! a plain Maven repository from one mockito server. [`ZipToolchain`] stands
//! in for the JDK so builds can run without javac.

#![allow(dead_code)]

use mcpkg::{Config, Error, Paths, Toolchain};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

pub const SNAPSHOT_TIMESTAMP: &str = "20250105.120000";
pub const SNAPSHOT_BUILD: &str = "7";

/// Isolated project directory with its own user config
pub struct TestProject {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub config_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("demo-plugin");
        let config_dir = temp_dir.path().join("config");
        fs::create_dir_all(&root).expect("Failed to create project directory");
        fs::create_dir_all(&config_dir).expect("Failed to create config directory");

        Self {
            temp_dir,
            root,
            config_dir,
        }
    }

    pub fn paths(&self) -> Paths {
        Paths::new(&self.root)
    }

    /// Write `config.toml` pointing every remote at `repository`
    pub fn write_config(&self, repository: &MockRepository) {
        let content = format!(
            r#"[registry]
url = "{}"
maven_url = "{}"
snapshot_url = "{}"

[network]
timeout_secs = 5
"#,
            repository.registry_url(),
            repository.maven_url(),
            repository.snapshot_url()
        );
        fs::write(self.config_dir.join("config.toml"), content).expect("Failed to write config");
    }

    pub fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }
}

/// A registry version served by [`MockRepository::plugin`]
pub struct MockVersion {
    pub number: &'static str,
    pub kind: &'static str,
    pub loaders: &'static [&'static str],
    pub game_versions: &'static [&'static str],
}

impl MockVersion {
    pub fn release(number: &'static str, game_versions: &'static [&'static str]) -> Self {
        Self {
            number,
            kind: "release",
            loaders: &["paper", "spigot"],
            game_versions,
        }
    }
}

pub struct MockRepository {
    pub server: ServerGuard,
}

impl MockRepository {
    pub fn new() -> Self {
        Self {
            server: mockito::Server::new(),
        }
    }

    pub fn registry_url(&self) -> String {
        self.server.url()
    }

    pub fn maven_url(&self) -> String {
        format!("{}/maven2", self.server.url())
    }

    pub fn snapshot_url(&self) -> String {
        format!("{}/paper-api", self.server.url())
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.registry.url = self.registry_url();
        config.registry.maven_url = self.maven_url();
        config.registry.snapshot_url = Some(self.snapshot_url());
        config.network.timeout_secs = 5;
        config
    }

    /// Serve a registry project whose jars declare `name: <slug>`.
    ///
    /// Returns the project, version list and download mocks, in that order.
    pub fn plugin(&mut self, slug: &str, versions: &[MockVersion]) -> Vec<Mock> {
        let url = self.server.url();
        let mut mocks = Vec::new();

        mocks.push(
            self.server
                .mock("GET", format!("/project/{}", slug).as_str())
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(
                    json!({
                        "id": format!("id-{}", slug),
                        "slug": slug,
                        "title": slug,
                        "description": format!("The {} plugin", slug),
                        "game_versions": ["1.20.6", "1.21.4"],
                        "loaders": ["paper", "spigot"],
                        "downloads": 1234
                    })
                    .to_string(),
                )
                .create(),
        );

        let body: Vec<_> = versions
            .iter()
            .map(|v| {
                json!({
                    "id": format!("{}-{}", slug, v.number),
                    "version_number": v.number,
                    "version_type": v.kind,
                    "loaders": v.loaders,
                    "game_versions": v.game_versions,
                    "files": [{
                        "url": format!("{}/files/{}-{}.jar", url, slug, v.number),
                        "filename": format!("{}-{}.jar", slug, v.number),
                        "primary": true,
                        "size": 100
                    }]
                })
            })
            .collect();
        mocks.push(
            self.server
                .mock("GET", format!("/project/{}/version", slug).as_str())
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(serde_json::Value::Array(body).to_string())
                .create(),
        );

        for v in versions {
            let manifest = format!("name: {}\nversion: {}\n", slug, v.number);
            mocks.push(
                self.server
                    .mock("GET", format!("/files/{}-{}.jar", slug, v.number).as_str())
                    .with_status(200)
                    .with_body(jar_bytes(&[("plugin.yml", manifest.as_bytes())]))
                    .create(),
            );
        }

        mocks
    }

    pub fn missing_plugin(&mut self, slug: &str) -> Mock {
        self.server
            .mock("GET", format!("/project/{}", slug).as_str())
            .with_status(404)
            .with_body(r#"{"error":"not_found"}"#)
            .create()
    }

    /// Serve paper-api snapshot metadata and the jar for `version`
    pub fn platform_snapshot(&mut self, version: &str) -> Vec<Mock> {
        let top_level = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>io.papermc.paper</groupId>
  <artifactId>paper-api</artifactId>
  <versioning>
    <latest>{0}-R0.1-SNAPSHOT</latest>
    <versions>
      <version>{0}-R0.1-SNAPSHOT</version>
    </versions>
  </versioning>
</metadata>"#,
            version
        );
        let per_version = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata modelVersion="1.1.0">
  <groupId>io.papermc.paper</groupId>
  <artifactId>paper-api</artifactId>
  <version>{}-R0.1-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>{}</timestamp>
      <buildNumber>{}</buildNumber>
    </snapshot>
  </versioning>
</metadata>"#,
            version, SNAPSHOT_TIMESTAMP, SNAPSHOT_BUILD
        );

        vec![
            self.server
                .mock("GET", "/paper-api/maven-metadata.xml")
                .with_status(200)
                .with_body(top_level)
                .create(),
            self.server
                .mock(
                    "GET",
                    format!("/paper-api/{}-R0.1-SNAPSHOT/maven-metadata.xml", version).as_str(),
                )
                .with_status(200)
                .with_body(per_version)
                .create(),
            self.server
                .mock(
                    "GET",
                    format!(
                        "/paper-api/{0}-R0.1-SNAPSHOT/paper-api-{0}-R0.1-{1}-{2}.jar",
                        version, SNAPSHOT_TIMESTAMP, SNAPSHOT_BUILD
                    )
                    .as_str(),
                )
                .with_status(200)
                .with_body(jar_bytes(&[("org/bukkit/plugin/java/JavaPlugin.class", b"api")]))
                .create(),
        ]
    }

    /// Serve a plain Maven artifact below `prefix` (e.g. `/maven2`)
    pub fn maven_artifact(&mut self, prefix: &str, group: &str, artifact: &str, version: &str) -> Mock {
        let path = format!(
            "{}/{}/{}/{}/{}-{}.jar",
            prefix,
            group.replace('.', "/"),
            artifact,
            version,
            artifact,
            version
        );
        self.server
            .mock("GET", path.as_str())
            .with_status(200)
            .with_body(jar_bytes(&[(
                &format!("{}/Library.class", group.replace('.', "/")),
                b"lib",
            )]))
            .create()
    }

    pub fn not_found(&mut self, path: &str) -> Mock {
        self.server.mock("GET", path).with_status(404).create()
    }

    /// Search endpoint returning `hits` as `(slug, downloads)` pairs
    pub fn search(&mut self, hits: &[(&str, u64)]) -> Mock {
        let hits: Vec<_> = hits
            .iter()
            .map(|(slug, downloads)| {
                json!({
                    "project_id": format!("id-{}", slug),
                    "slug": slug,
                    "title": slug,
                    "description": format!("The {} plugin", slug),
                    "author": "someone",
                    "downloads": downloads,
                    "latest_version": "1.21.4"
                })
            })
            .collect();
        self.server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "hits": hits,
                    "offset": 0,
                    "limit": 10,
                    "total_hits": hits.len()
                })
                .to_string(),
            )
            .create()
    }
}

/// In-memory jar with the given entries
pub fn jar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        zip.write_all(content).expect("Failed to write zip entry");
    }
    zip.finish().expect("Failed to finish zip").into_inner()
}

/// Names and contents of every entry in a jar on disk
pub fn read_jar(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(File::open(path).expect("Failed to open jar"))
        .expect("Failed to read jar");
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).expect("Failed to read entry");
        let mut content = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut content).expect("Failed to read entry");
        entries.push((file.name().to_string(), content));
    }
    entries
}

/// Compiles by writing one `.class` per source into its package directory
/// and archives with the zip crate
#[derive(Default)]
pub struct ZipToolchain;

impl Toolchain for ZipToolchain {
    fn compile(&self, sources: &[PathBuf], _classpath: &[PathBuf], out_dir: &Path) -> mcpkg::Result<()> {
        for source in sources {
            let stem = source
                .file_stem()
                .ok_or_else(|| Error::Other("source without a name".to_string()))?;
            let package = fs::read_to_string(source)?
                .lines()
                .find_map(|line| {
                    line.trim()
                        .strip_prefix("package ")
                        .map(|p| p.trim_end_matches(';').trim().to_string())
                })
                .unwrap_or_default();

            let dir = package
                .split('.')
                .filter(|part| !part.is_empty())
                .fold(out_dir.to_path_buf(), |dir, part| dir.join(part));
            fs::create_dir_all(&dir)?;
            fs::write(dir.join(stem).with_extension("class"), b"compiled")?;
        }
        Ok(())
    }

    fn archive(&self, content_dir: &Path, output: &Path) -> mcpkg::Result<()> {
        let mut zip = zip::ZipWriter::new(File::create(output)?);
        for entry in WalkDir::new(content_dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry
                .path()
                .strip_prefix(content_dir)
                .map_err(|e| Error::Other(e.to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            zip.start_file(name, SimpleFileOptions::default())?;
            zip.write_all(&fs::read(entry.path())?)?;
        }
        zip.finish()?;
        Ok(())
    }
}
