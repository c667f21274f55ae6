use super::install::print_resolution;
use super::Context;
use anyhow::Result;
use mcpkg::{Lockfile, MavenClient, Project, RegistryClient, ResolveOptions, Resolver};
use std::path::Path;

pub fn run(project_file: Option<&Path>, name: &str) -> Result<()> {
    let ctx = Context::load(project_file)?;
    let mut project = Project::load(&ctx.paths.project_file)?;
    let previous = Lockfile::load_from(&ctx.paths.lock_file)?;

    let registry = RegistryClient::from_config(&ctx.config)?;
    let maven = MavenClient::from_config(&ctx.config)?;
    let resolver = Resolver::new(
        &ctx.paths,
        &registry,
        &maven,
        ResolveOptions::from_config(&ctx.config),
    );

    let resolution = resolver.remove(&mut project, name, previous.as_ref())?;
    project.save(&ctx.paths.project_file)?;
    resolution.lockfile.save_to(&ctx.paths.lock_file)?;

    println!("✓ Removed {}", name);
    print_resolution(&resolution);

    Ok(())
}
