use super::{spinner, Context};
use anyhow::Result;
use mcpkg::{Assembler, JdkToolchain, Lockfile, Project};
use std::path::Path;

pub fn run(project_file: Option<&Path>) -> Result<()> {
    let ctx = Context::load(project_file)?;
    let project = Project::load(&ctx.paths.project_file)?;
    let lockfile = Lockfile::load_from(&ctx.paths.lock_file)?;

    println!("Building {} {}", project.name, project.version);
    println!();

    let toolchain = JdkToolchain::from_config(&ctx.config.build);
    let assembler = Assembler::new(&ctx.paths, &toolchain)
        .ordering(ctx.config.resolver.version_ordering)
        .strict_manifest(ctx.config.build.strict_manifest);

    let spinner = spinner("Compiling and packaging...")?;
    let output = match assembler.build(&project, lockfile.as_ref()) {
        Ok(output) => output,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    spinner.finish_with_message(format!(
        "✓ Compiled {} source file{}",
        output.sources,
        if output.sources == 1 { "" } else { "s" }
    ));

    if output.shaded > 0 {
        println!("  Shaded {} entries from dependencies", output.shaded);
    }
    if !output.depend.is_empty() {
        println!("  depend: {}", output.depend.join(", "));
    }

    println!();
    let shown = output
        .archive
        .strip_prefix(&ctx.paths.root)
        .unwrap_or(&output.archive);
    println!("✓ Built {}", shown.display());

    Ok(())
}
