use super::spinner;
use anyhow::Result;
use mcpkg::{Config, RegistryClient};

pub fn run(query: &str, limit: u32, offset: u32) -> Result<()> {
    let config = Config::load()?;
    let registry = RegistryClient::from_config(&config)?;

    let spinner = spinner(&format!("Searching for: {}", query))?;
    let results = registry.search(query, limit, offset);
    spinner.finish_and_clear();
    let results = results?;

    if results.hits.is_empty() {
        println!("No plugins found matching '{}'", query);
        println!();
        println!("Try a different search term, or add a downloaded jar with 'mcpkg install ./libs/<file>.jar'.");
        return Ok(());
    }

    println!(
        "Found {} plugin{} (showing {}-{}):",
        results.total_hits,
        if results.total_hits == 1 { "" } else { "s" },
        offset + 1,
        offset as usize + results.hits.len()
    );
    for hit in &results.hits {
        let latest = hit
            .latest_version
            .as_deref()
            .map(|v| format!(" [{}]", v))
            .unwrap_or_default();
        println!("  {}{} - {} downloads", hit.slug, latest, hit.downloads);
        if !hit.description.is_empty() {
            println!("      {}", hit.description);
        }
    }
    println!();
    println!("Install with: mcpkg install <slug>");

    Ok(())
}
