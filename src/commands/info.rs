use super::{spinner, Context};
use anyhow::{bail, Result};
use mcpkg::{select_version, DependencySpec, Project, RegistryClient, ResolveOptions};
use std::path::Path;

const SHOWN_VERSIONS: usize = 10;

pub fn run(project_file: Option<&Path>, package: &str) -> Result<()> {
    let ctx = Context::load(project_file)?;

    let (slug, requested) = match DependencySpec::parse_request(package)? {
        (slug, DependencySpec::Registry { version }) => (slug, version),
        _ => bail!("'{}' is not a registry plugin name", package),
    };

    let registry = RegistryClient::from_config(&ctx.config)?;
    let spinner = spinner("Fetching plugin metadata...")?;
    let resolved = registry.resolve(&slug);
    spinner.finish_and_clear();
    let (project, versions) = resolved?;

    println!("{} ({})", project.title, project.slug);
    if !project.description.is_empty() {
        println!("  {}", project.description);
    }
    println!("  Downloads:     {}", project.downloads);
    if !project.loaders.is_empty() {
        println!("  Platforms:     {}", project.loaders.join(", "));
    }
    if let (Some(first), Some(last)) = (project.game_versions.first(), project.game_versions.last()) {
        println!("  Game versions: {} - {}", first, last);
    }
    println!();

    match &requested {
        Some(number) => {
            let Some(version) = versions.iter().find(|v| &v.version_number == number) else {
                bail!("{} has no version {}", slug, number);
            };
            println!("Version {} ({:?})", version.version_number, version.version_type);
            println!("  Platforms:     {}", version.loaders.join(", "));
            println!("  Game versions: {}", version.game_versions.join(", "));
            if let Some(file) = version.primary_file() {
                println!("  File:          {} ({} bytes)", file.filename, file.size);
            }
        }
        None => {
            println!("Versions ({} total):", versions.len());
            for version in versions.iter().take(SHOWN_VERSIONS) {
                println!(
                    "  {:<16} {:<8} {}",
                    version.version_number,
                    format!("{:?}", version.version_type).to_lowercase(),
                    version.game_versions.join(", ")
                );
            }
            if versions.len() > SHOWN_VERSIONS {
                println!("  ... and {} more", versions.len() - SHOWN_VERSIONS);
            }
        }
    }

    // Inside a project, show what an install would pick
    if ctx.paths.project_file.exists() {
        let local = Project::load(&ctx.paths.project_file)?;
        let options = ResolveOptions::from_config(&ctx.config);
        println!();
        match select_version(
            &slug,
            &versions,
            &local.compatibility,
            requested.as_deref(),
            &options,
        ) {
            Ok(selection) => println!(
                "✓ {} would install {}{}",
                local.name,
                selection.version.version_number,
                selection
                    .game_version
                    .map(|g| format!(" (game version {})", g))
                    .unwrap_or_default()
            ),
            Err(_) => println!(
                "⚠ No version is compatible with {} ({} {})",
                local.name,
                local.compatibility.platforms.join(", "),
                local.compatibility.versions.join(", ")
            ),
        }
    }

    Ok(())
}
