//! Build pipeline
//!
//! Turns an installed project into `dist/<name>-<version>.jar`:
//!
//! 1. clear the build directory
//! 2. read the declared plugin.yml fragment
//! 3. discover dependency plugin names and shade selected entries
//! 4. write the merged plugin.yml
//! 5. compile `src/**/*.java` against the platform API and dependencies
//! 6. copy the remaining resources
//! 7. recreate the dist directory and archive the build tree
//!
//! The dist directory is only touched by the last step.

use crate::archive::ArchiveInspector;
use crate::lockfile::Lockfile;
use crate::platform::VersionOrdering;
use crate::plugin_yml::{self, ManifestDefaults};
use crate::project::{Project, PLUGIN_YML};
use crate::resolver::locate;
use crate::template::TemplateContext;
use crate::toolchain::Toolchain;
use crate::{Error, Paths, Result};
use serde_yaml_ng::Mapping;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// The JDK archiver writes its own manifest
const JAR_MANIFEST: &str = "META-INF/MANIFEST.MF";

/// Summary of a finished build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub archive: PathBuf,
    pub sources: usize,
    /// Entries copied from dependencies
    pub shaded: usize,
    /// Plugin names written to `depend`
    pub depend: Vec<String>,
}

pub struct Assembler<'a, T: Toolchain> {
    paths: &'a Paths,
    toolchain: &'a T,
    ordering: VersionOrdering,
    strict_manifest: bool,
}

impl<'a, T: Toolchain> Assembler<'a, T> {
    pub fn new(paths: &'a Paths, toolchain: &'a T) -> Self {
        Self {
            paths,
            toolchain,
            ordering: VersionOrdering::default(),
            strict_manifest: false,
        }
    }

    pub fn ordering(mut self, ordering: VersionOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Fail when a dependency has no discoverable plugin name
    pub fn strict_manifest(mut self, strict: bool) -> Self {
        self.strict_manifest = strict;
        self
    }

    pub fn build(&self, project: &Project, lockfile: Option<&Lockfile>) -> Result<BuildOutput> {
        let classpath = locate(self.paths, project, lockfile, self.ordering)?;
        let context = TemplateContext::from_project(project);
        let build_dir = &self.paths.build_dir;

        if build_dir.exists() {
            fs::remove_dir_all(build_dir)?;
        }
        fs::create_dir_all(build_dir)?;

        let fragment = match project.manifest_resource() {
            Some(source) => {
                let text = fs::read_to_string(self.paths.resolve(source))?;
                plugin_yml::parse_fragment(&context.render(&text))?
            }
            None => Mapping::new(),
        };

        let artifacts: Vec<PathBuf> = classpath.artifacts.iter().map(|(_, p)| p.clone()).collect();
        let depend = plugin_yml::discover_names(&artifacts, self.strict_manifest)?;
        let shaded = self.shade(project, &classpath.artifacts)?;

        let defaults = ManifestDefaults::from_project(
            project,
            depend.clone(),
            project.compatibility.active_version(self.ordering),
        );
        let manifest = plugin_yml::merge(fragment, &defaults.to_mapping());
        fs::write(build_dir.join(PLUGIN_YML), plugin_yml::to_yaml(&manifest)?)?;

        let sources = find_sources(&self.paths.source_dir);
        if sources.is_empty() {
            return Err(Error::NoSources(self.paths.source_dir.clone()));
        }
        tracing::info!(count = sources.len(), "compiling");
        self.toolchain
            .compile(&sources, &classpath.entries(), build_dir)?;

        self.copy_resources(project, &context)?;

        let dist_dir = &self.paths.dist_dir;
        if dist_dir.exists() {
            fs::remove_dir_all(dist_dir)?;
        }
        fs::create_dir_all(dist_dir)?;
        let archive = dist_dir.join(project.archive_name());
        self.toolchain.archive(build_dir, &archive)?;

        Ok(BuildOutput {
            archive,
            sources: sources.len(),
            shaded,
            depend,
        })
    }

    fn shade(&self, project: &Project, artifacts: &[(String, PathBuf)]) -> Result<usize> {
        let mut copied = 0;

        for (key, path) in artifacts {
            let Some(rule) = project.shading.get(key) else {
                continue;
            };

            let mut exclude = rule.exclude.clone();
            exclude.push(JAR_MANIFEST.to_string());

            let inspection = ArchiveInspector::open(path, &exclude, rule.include.as_deref())?;
            let written = inspection.extract_to(&self.paths.build_dir)?;
            tracing::debug!(%key, entries = written, "shaded");
            copied += written;
        }

        Ok(copied)
    }

    fn copy_resources(&self, project: &Project, context: &TemplateContext) -> Result<()> {
        for (output, source) in &project.resources {
            if output == PLUGIN_YML {
                continue;
            }

            let relative = relative_output(output).ok_or_else(|| {
                Error::InvalidProject(format!(
                    "Resource output '{}' must be a relative path inside the build directory",
                    output
                ))
            })?;
            let target = self.paths.build_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            let bytes = fs::read(self.paths.resolve(source))?;
            fs::write(&target, context.render_bytes(bytes))?;
        }

        Ok(())
    }
}

/// Every `*.java` file below `source_dir`, sorted
pub fn find_sources(source_dir: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(source_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "java"))
        .collect();
    sources.sort();
    sources
}

fn relative_output(output: &str) -> Option<PathBuf> {
    let path = Path::new(output);
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockfile::{ArtifactSource, LockedArtifact};
    use crate::platform::Compatibility;
    use crate::project::ShadingRule;
    use std::cell::RefCell;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    /// Records calls and fakes the outputs of javac and jar
    #[derive(Default)]
    struct FakeToolchain {
        classpaths: RefCell<Vec<Vec<PathBuf>>>,
        fail_compile: bool,
    }

    impl Toolchain for FakeToolchain {
        fn compile(&self, sources: &[PathBuf], classpath: &[PathBuf], out_dir: &Path) -> Result<()> {
            self.classpaths.borrow_mut().push(classpath.to_vec());
            if self.fail_compile {
                return Err(Error::ToolFailed {
                    tool: "javac".into(),
                    status: "exit status: 1".into(),
                    stderr: "error: cannot find symbol".into(),
                });
            }
            for source in sources {
                let stem = source.file_stem().unwrap();
                fs::write(out_dir.join(stem).with_extension("class"), b"class").unwrap();
            }
            Ok(())
        }

        fn archive(&self, content_dir: &Path, output: &Path) -> Result<()> {
            let mut zip = zip::ZipWriter::new(File::create(output)?);
            for entry in WalkDir::new(content_dir).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() {
                    let name = entry.path().strip_prefix(content_dir).unwrap();
                    zip.start_file(name.to_string_lossy(), SimpleFileOptions::default())?;
                    zip.write_all(&fs::read(entry.path())?)?;
                }
            }
            zip.finish()?;
            Ok(())
        }
    }

    fn write_jar(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    struct Fixture {
        _dir: TempDir,
        paths: Paths,
        project: Project,
        lockfile: Lockfile,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());

        let mut project = Project::new(
            "Demo",
            "1.2.0",
            "dev.demo.Demo",
            Compatibility::new("sponge", "1.21.4"),
        );
        project.authors = vec!["Alice".into()];
        project
            .resources
            .insert(PLUGIN_YML.into(), "resources/plugin.yml".into());
        project
            .resources
            .insert("config.yml".into(), "resources/config.yml".into());
        project.dependencies.insert("Vault".into(), "2.0".into());
        project.dependencies.insert("gson".into(), "./libs/gson.jar".into());
        project.shading.insert(
            "gson".into(),
            ShadingRule {
                include: Some(vec!["com/**/*.class".into()]),
                exclude: vec![],
            },
        );

        fs::create_dir_all(dir.path().join("src/dev/demo")).unwrap();
        fs::write(dir.path().join("src/dev/demo/Demo.java"), "class Demo {}").unwrap();
        fs::create_dir_all(dir.path().join("resources")).unwrap();
        fs::write(
            dir.path().join("resources/plugin.yml"),
            "author: Bob\ndepend: [Essentials]\ncommands:\n  demo: {}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("resources/config.yml"),
            "greeting: $__PROJECT_NAME__$ v$__PROJECT_VERSION__$\n",
        )
        .unwrap();

        fs::create_dir_all(&paths.deps_dir).unwrap();
        let vault = paths.deps_dir.join("Vault-2.0.jar");
        write_jar(&vault, &[("plugin.yml", "name: Vault\n")]);
        fs::create_dir_all(dir.path().join("libs")).unwrap();
        write_jar(
            &dir.path().join("libs/gson.jar"),
            &[
                ("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n"),
                ("com/google/gson/Gson.class", "gson"),
            ],
        );

        let mut lockfile = Lockfile::new();
        lockfile.update_package(
            "Vault".into(),
            LockedArtifact {
                source: ArtifactSource::Registry,
                version: "2.0".into(),
                specifier: "2.0".into(),
                path: vault,
                checksum: String::new(),
            },
        );

        Fixture {
            _dir: dir,
            paths,
            project,
            lockfile,
        }
    }

    #[test]
    fn test_build_produces_archive_with_merged_manifest() {
        let f = fixture();
        let toolchain = FakeToolchain::default();

        let output = Assembler::new(&f.paths, &toolchain)
            .build(&f.project, Some(&f.lockfile))
            .unwrap();

        assert_eq!(output.archive, f.paths.dist_dir.join("Demo-1.2.0.jar"));
        assert!(output.archive.exists());
        assert_eq!(output.sources, 1);
        assert_eq!(output.shaded, 1);
        assert_eq!(output.depend, vec!["Vault"]);

        let manifest = plugin_yml::parse_fragment(
            &fs::read_to_string(f.paths.build_dir.join(PLUGIN_YML)).unwrap(),
        )
        .unwrap();
        assert_eq!(
            manifest,
            plugin_yml::parse_fragment(
                "authors: [Bob, Alice]\n\
                 depend: [Essentials, Vault]\n\
                 commands:\n  demo: {}\n\
                 name: Demo\n\
                 version: 1.2.0\n\
                 main: dev.demo.Demo\n\
                 api-version: '1.21'\n"
            )
            .unwrap()
        );

        assert!(f.paths.build_dir.join("com/google/gson/Gson.class").exists());
        assert!(!f.paths.build_dir.join(JAR_MANIFEST).exists());
        assert!(f.paths.build_dir.join("Demo.class").exists());
        assert_eq!(
            fs::read_to_string(f.paths.build_dir.join("config.yml")).unwrap(),
            "greeting: Demo v1.2.0\n"
        );

        let classpaths = toolchain.classpaths.borrow();
        assert_eq!(
            classpaths[0],
            vec![
                f.paths.deps_dir.join("Vault-2.0.jar"),
                f.paths.root.join("./libs/gson.jar")
            ]
        );
    }

    #[test]
    fn test_no_sources_leaves_dist_untouched() {
        let f = fixture();
        fs::remove_file(f.paths.root.join("src/dev/demo/Demo.java")).unwrap();
        fs::create_dir_all(&f.paths.dist_dir).unwrap();
        let previous = f.paths.dist_dir.join("Demo-1.1.0.jar");
        fs::write(&previous, b"old build").unwrap();

        let toolchain = FakeToolchain::default();
        let err = Assembler::new(&f.paths, &toolchain)
            .build(&f.project, Some(&f.lockfile))
            .unwrap_err();

        assert!(matches!(err, Error::NoSources(_)));
        assert!(previous.exists());
        assert!(toolchain.classpaths.borrow().is_empty());
    }

    #[test]
    fn test_compiler_failure_propagates() {
        let f = fixture();
        let toolchain = FakeToolchain {
            fail_compile: true,
            ..Default::default()
        };
        let err = Assembler::new(&f.paths, &toolchain)
            .build(&f.project, Some(&f.lockfile))
            .unwrap_err();
        assert!(err.to_string().contains("cannot find symbol"));
        assert!(!f.paths.dist_dir.exists());
    }

    #[test]
    fn test_strict_manifest_rejects_nameless_dependency() {
        let f = fixture();
        let toolchain = FakeToolchain::default();
        let err = Assembler::new(&f.paths, &toolchain)
            .strict_manifest(true)
            .build(&f.project, Some(&f.lockfile))
            .unwrap_err();
        assert!(matches!(err, Error::ManifestName(_)));
    }

    #[test]
    fn test_build_requires_install() {
        let f = fixture();
        let toolchain = FakeToolchain::default();
        let err = Assembler::new(&f.paths, &toolchain)
            .build(&f.project, None)
            .unwrap_err();
        assert!(err.to_string().contains("mcpkg install"));
        assert!(!f.paths.build_dir.exists());
    }

    #[test]
    fn test_relative_output() {
        assert!(relative_output("config.yml").is_some());
        assert!(relative_output("lang/en.yml").is_some());
        assert!(relative_output("../escape.yml").is_none());
        assert!(relative_output("/etc/passwd").is_none());
    }
}
