use super::{spinner, Context};
use anyhow::Result;
use mcpkg::{init, InitOptions, MavenClient};
use std::path::Path;

pub fn run(project_file: Option<&Path>, options: InitOptions) -> Result<()> {
    let ctx = Context::load(project_file)?;

    println!("Initializing plugin project...");
    println!();

    let maven = MavenClient::from_config(&ctx.config)?;
    let scaffold = init(&ctx.paths, &options, |platform| {
        let spinner = spinner(&format!("Looking up the latest {} version...", platform))
            .map_err(|e| mcpkg::Error::Other(e.to_string()))?;
        let latest = maven.latest_version(platform);
        spinner.finish_and_clear();
        latest
    })?;

    let project = &scaffold.project;
    println!("✓ Created {} {}", project.name, project.version);
    println!("  Main class:   {}", project.main);
    println!(
        "  Targets:      {} {}",
        project.compatibility.platforms.join(", "),
        project.compatibility.versions.join(", ")
    );
    println!();
    for file in &scaffold.files {
        let shown = file.strip_prefix(&ctx.paths.root).unwrap_or(file);
        println!("  + {}", shown.display());
    }

    println!();
    println!("Next steps:");
    println!("  • Add dependencies: mcpkg install <plugin>");
    println!("  • Build the plugin: mcpkg install && mcpkg build");
    println!();

    Ok(())
}
