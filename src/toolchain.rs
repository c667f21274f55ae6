//! External compiler and archiver
//!
//! [`Toolchain`] is the seam the assembler builds through. [`JdkToolchain`]
//! runs `javac` and `jar` as subprocesses, each bounded by a timeout.

use crate::config::BuildConfig;
use crate::{Error, Result};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub trait Toolchain {
    /// Compile `sources` against `classpath` into `out_dir`
    fn compile(&self, sources: &[PathBuf], classpath: &[PathBuf], out_dir: &Path) -> Result<()>;

    /// Package the contents of `content_dir` into the archive at `output`
    fn archive(&self, content_dir: &Path, output: &Path) -> Result<()>;
}

/// `javac` + `jar` from a locally installed JDK
#[derive(Debug, Clone)]
pub struct JdkToolchain {
    pub javac: String,
    pub jar: String,
    pub timeout: Duration,
}

impl JdkToolchain {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            javac: config.javac.clone(),
            jar: config.jar.clone(),
            timeout: Duration::from_secs(config.tool_timeout_secs),
        }
    }

    fn run(&self, program: &str, args: Vec<OsString>) -> Result<()> {
        tracing::debug!(program, ?args, "running");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async {
            let child = Command::new(program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| spawn_error(program, e))?;

            let output = tokio::time::timeout(self.timeout, child.wait_with_output())
                .await
                .map_err(|_| Error::ToolTimeout {
                    tool: program.to_string(),
                    seconds: self.timeout.as_secs(),
                })??;

            if !output.status.success() {
                let mut stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
                if stderr.is_empty() {
                    // javac reports some failures on stdout
                    stderr = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
                }
                return Err(Error::ToolFailed {
                    tool: program.to_string(),
                    status: output.status.to_string(),
                    stderr,
                });
            }

            Ok::<(), Error>(())
        })
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::NotFound {
        Error::ToolFailed {
            tool: program.to_string(),
            status: "not found".to_string(),
            stderr: format!(
                "'{}' is not on PATH. Install a JDK or set the build.javac / build.jar paths in your config.",
                program
            ),
        }
    } else {
        Error::Io(e)
    }
}

impl Toolchain for JdkToolchain {
    fn compile(&self, sources: &[PathBuf], classpath: &[PathBuf], out_dir: &Path) -> Result<()> {
        let mut args: Vec<OsString> = vec![
            "-encoding".into(),
            "UTF-8".into(),
            "-d".into(),
            out_dir.into(),
        ];

        if !classpath.is_empty() {
            let joined = std::env::join_paths(classpath)
                .map_err(|e| Error::Other(format!("Invalid classpath entry: {}", e)))?;
            args.push("-cp".into());
            args.push(joined);
        }

        args.extend(sources.iter().map(|s| s.as_os_str().to_os_string()));
        self.run(&self.javac, args)
    }

    fn archive(&self, content_dir: &Path, output: &Path) -> Result<()> {
        let args: Vec<OsString> = vec![
            "cf".into(),
            output.into(),
            "-C".into(),
            content_dir.into(),
            ".".into(),
        ];
        self.run(&self.jar, args)
    }
}
