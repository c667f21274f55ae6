pub mod build;
pub mod info;
pub mod init;
pub mod install;
pub mod remove;
pub mod search;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use mcpkg::{Config, Paths};
use std::path::Path;
use std::time::Duration;

/// Everything a command needs to locate the project and talk to the network
pub struct Context {
    pub config: Config,
    pub paths: Paths,
}

impl Context {
    pub fn load(project_file: Option<&Path>) -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
            paths: Paths::discover(project_file)?,
        })
    }
}

pub fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}
