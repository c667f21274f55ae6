//! Archive inspection for jar/zip files
//!
//! [`ArchiveInspector::open`] lists the entries of an archive that pass the
//! exclude/include glob filters. Entry contents are only read from the
//! archive when a [`LazyEntry`] is asked for them.
//!
//! # Examples
//!
//! ```no_run
//! use mcpkg::ArchiveInspector;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let exclude = vec!["META-INF/**/*".to_string()];
//! let inspection = ArchiveInspector::open("libs/Vault.jar", &exclude, None)?;
//!
//! if let Some(entry) = inspection.entry("plugin.yml") {
//!     println!("{}", entry.text()?);
//! }
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use zip::ZipArchive;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled include/exclude rules
#[derive(Debug, Clone)]
pub struct EntryFilter {
    exclude: Vec<Pattern>,
    include: Option<Vec<Pattern>>,
}

impl EntryFilter {
    pub fn new<S: AsRef<str>>(exclude: &[S], include: Option<&[S]>) -> Result<Self> {
        let compile = |patterns: &[S]| -> Result<Vec<Pattern>> {
            patterns
                .iter()
                .map(|p| Pattern::new(p.as_ref()).map_err(Error::from))
                .collect()
        };

        Ok(Self {
            exclude: compile(exclude)?,
            include: include.map(compile).transpose()?,
        })
    }

    /// Exclusion wins over inclusion; no include list means "everything else".
    pub fn matches(&self, name: &str) -> bool {
        if self
            .exclude
            .iter()
            .any(|p| p.matches_with(name, MATCH_OPTIONS))
        {
            return false;
        }

        match &self.include {
            None => true,
            Some(include) => include.iter().any(|p| p.matches_with(name, MATCH_OPTIONS)),
        }
    }
}

pub struct ArchiveInspector;

impl ArchiveInspector {
    /// Open an archive and select its file entries.
    ///
    /// Directory entries are skipped. Nothing but the central directory is read here.
    pub fn open<P: AsRef<Path>, S: AsRef<str>>(
        path: P,
        exclude: &[S],
        include: Option<&[S]>,
    ) -> Result<Inspection> {
        let filter = EntryFilter::new(exclude, include)?;
        Self::open_with(path, &filter)
    }

    pub fn open_with<P: AsRef<Path>>(path: P, filter: &EntryFilter) -> Result<Inspection> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let archive = ZipArchive::new(BufReader::new(file))?;

        let names: BTreeSet<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/') && filter.matches(name))
            .map(str::to_string)
            .collect();

        tracing::debug!(
            archive = %path.display(),
            selected = names.len(),
            total = archive.len(),
            "inspected archive"
        );

        Ok(Inspection {
            path: path.to_path_buf(),
            archive: Mutex::new(archive),
            names: names.into_iter().collect(),
        })
    }
}

/// The selected entries of one archive
pub struct Inspection {
    path: PathBuf,
    archive: Mutex<ZipArchive<BufReader<File>>>,
    names: Vec<String>,
}

impl Inspection {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Selected entry names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    /// Deferred handle for a selected entry
    pub fn entry<'a>(&'a self, name: &'a str) -> Option<LazyEntry<'a>> {
        self.contains(name).then_some(LazyEntry {
            inspection: self,
            name,
        })
    }

    /// All selected entries as deferred handles
    pub fn entries(&self) -> impl Iterator<Item = LazyEntry<'_>> {
        self.names.iter().map(move |name| LazyEntry {
            inspection: self,
            name,
        })
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self
            .archive
            .lock()
            .map_err(|_| Error::Other(format!("Archive lock poisoned: {}", self.path.display())))?;
        let mut file = archive.by_name(name)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Write every selected entry below `dir`, keeping relative paths.
    ///
    /// Returns the number of files written.
    pub fn extract_to<P: AsRef<Path>>(&self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        let mut written = 0;

        for entry in self.entries() {
            let relative = safe_relative_path(entry.name()).ok_or_else(|| {
                Error::Other(format!(
                    "Refusing to extract '{}' from {}: path escapes the output directory",
                    entry.name(),
                    self.path.display()
                ))
            })?;
            let target = dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, entry.bytes()?)?;
            written += 1;
        }

        Ok(written)
    }
}

/// An archive entry whose content has not been read yet
#[derive(Clone, Copy)]
pub struct LazyEntry<'a> {
    inspection: &'a Inspection,
    name: &'a str,
}

impl<'a> LazyEntry<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        self.inspection.read(self.name)
    }

    /// Entry content decoded as UTF-8
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.bytes()?).map_err(|_| Error::Decode {
            archive: self.inspection.path.clone(),
            entry: self.name.to_string(),
        })
    }
}

fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, content) in entries {
            if name.ends_with('/') {
                zip.add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())
                    .unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(content).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    fn sample_jar(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("sample.jar");
        write_jar(
            &path,
            &[
                ("META-INF/", b""),
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
                ("plugin.yml", b"name: Sample\n"),
                ("com/", b""),
                ("com/Foo.class", &[0xCA, 0xFE, 0xBA, 0xBE]),
            ],
        );
        path
    }

    #[test]
    fn test_exclude_then_include() {
        let dir = TempDir::new().unwrap();
        let jar = sample_jar(&dir);

        let exclude = vec!["META-INF/**/*".to_string()];
        let include = vec!["plugin.yml".to_string(), "**/*".to_string()];
        let inspection = ArchiveInspector::open(&jar, &exclude, Some(include.as_slice())).unwrap();

        let names: Vec<&str> = inspection.names().collect();
        assert_eq!(names, vec!["com/Foo.class", "plugin.yml"]);
    }

    #[test]
    fn test_no_include_means_everything_not_excluded() {
        let dir = TempDir::new().unwrap();
        let jar = sample_jar(&dir);

        let inspection = ArchiveInspector::open::<_, String>(&jar, &[], None).unwrap();
        let names: Vec<&str> = inspection.names().collect();
        assert_eq!(
            names,
            vec!["META-INF/MANIFEST.MF", "com/Foo.class", "plugin.yml"]
        );
    }

    #[test]
    fn test_single_star_does_not_cross_directories() {
        let dir = TempDir::new().unwrap();
        let jar = sample_jar(&dir);

        let include = vec!["*".to_string()];
        let inspection = ArchiveInspector::open(&jar, &[], Some(include.as_slice())).unwrap();
        let names: Vec<&str> = inspection.names().collect();
        assert_eq!(names, vec!["plugin.yml"]);
    }

    #[test]
    fn test_lazy_text_and_bytes() {
        let dir = TempDir::new().unwrap();
        let jar = sample_jar(&dir);

        let inspection = ArchiveInspector::open::<_, String>(&jar, &[], None).unwrap();
        let manifest = inspection.entry("plugin.yml").unwrap();
        assert_eq!(manifest.text().unwrap(), "name: Sample\n");

        let class = inspection.entry("com/Foo.class").unwrap();
        assert_eq!(class.bytes().unwrap(), vec![0xCA, 0xFE, 0xBA, 0xBE]);
        assert!(matches!(class.text(), Err(Error::Decode { .. })));

        assert!(inspection.entry("missing.txt").is_none());
    }

    #[test]
    fn test_large_entry_reads_completely() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.jar");
        let content = vec![0u8; 1 << 20];
        write_jar(&path, &[("data.bin", content.as_slice())]);

        let inspection = ArchiveInspector::open::<_, String>(&path, &[], None).unwrap();
        assert_eq!(inspection.entry("data.bin").unwrap().bytes().unwrap(), content);
    }

    #[test]
    fn test_extract_to() {
        let dir = TempDir::new().unwrap();
        let jar = sample_jar(&dir);
        let out = dir.path().join("out");

        let exclude = vec!["META-INF/**/*".to_string()];
        let inspection = ArchiveInspector::open(&jar, &exclude, None).unwrap();
        assert_eq!(inspection.extract_to(&out).unwrap(), 2);

        assert!(out.join("com/Foo.class").exists());
        assert!(out.join("plugin.yml").exists());
        assert!(!out.join("META-INF").exists());
    }

    #[test]
    fn test_open_missing_archive_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = ArchiveInspector::open::<_, String>(dir.path().join("nope.jar"), &[], None);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_pattern() {
        let bad = vec!["[".to_string()];
        assert!(EntryFilter::new(&bad, None).is_err());
    }

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(
            safe_relative_path("com/Foo.class"),
            Some(PathBuf::from("com/Foo.class"))
        );
        assert_eq!(safe_relative_path("../evil"), None);
        assert_eq!(safe_relative_path("/abs"), None);
    }
}
