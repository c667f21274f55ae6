use super::{spinner, Context};
use anyhow::Result;
use mcpkg::{
    Lockfile, MavenClient, Outcome, Project, RegistryClient, Resolution, ResolveOptions, Resolver,
};
use std::path::Path;

pub fn run(project_file: Option<&Path>, package: Option<String>, force: bool, beta: bool) -> Result<()> {
    let ctx = Context::load(project_file)?;
    let mut project = Project::load(&ctx.paths.project_file)?;
    let previous = Lockfile::load_from(&ctx.paths.lock_file)?;

    let registry = RegistryClient::from_config(&ctx.config)?;
    let maven = MavenClient::from_config(&ctx.config)?;
    let mut options = ResolveOptions::from_config(&ctx.config);
    options.force = force;
    options.include_beta |= beta;
    let resolver = Resolver::new(&ctx.paths, &registry, &maven, options);

    if force {
        println!("⚠ Forced install: artifacts are re-downloaded and game versions are not checked");
        println!();
    }

    let spinner = spinner("Resolving dependencies...")?;
    let result = match &package {
        Some(request) => resolver
            .add(&mut project, request, previous.as_ref())
            .map(|(key, resolution)| (Some(key), resolution)),
        None => resolver
            .install(&project, previous.as_ref())
            .map(|resolution| (None, resolution)),
    };
    let (added, resolution) = match result {
        Ok(value) => value,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    let count = resolution.lockfile.package_count();
    spinner.finish_with_message(format!(
        "✓ Resolved {} dependenc{}",
        count,
        if count == 1 { "y" } else { "ies" }
    ));

    if added.is_some() {
        project.save(&ctx.paths.project_file)?;
    }
    resolution.lockfile.save_to(&ctx.paths.lock_file)?;

    print_resolution(&resolution);

    println!();
    match added {
        Some(key) => println!(
            "✓ Added {} = \"{}\" to {}",
            key,
            project.dependencies.get(&key).map(String::as_str).unwrap_or_default(),
            ctx.paths.project_file.display()
        ),
        None => println!("✓ All dependencies installed"),
    }

    Ok(())
}

pub(crate) fn print_resolution(resolution: &Resolution) {
    if let Some(platform) = &resolution.lockfile.platform {
        println!("  {} API {}", platform.specifier, platform.version);
    }

    for (key, outcome) in &resolution.outcomes {
        let version = resolution
            .lockfile
            .get_package(key)
            .map(|locked| locked.version.as_str())
            .unwrap_or_default();
        let note = match outcome {
            Outcome::Cached => "cached",
            Outcome::Downloaded => "downloaded",
            Outcome::Linked => "local",
        };
        if version.is_empty() {
            println!("  {} ({})", key, note);
        } else {
            println!("  {}@{} ({})", key, version, note);
        }
    }

    for path in &resolution.collected {
        if let Some(name) = path.file_name() {
            println!("  - removed {}", name.to_string_lossy());
        }
    }
}
