//! CLI handler for `mdc-cookies targets`.

use anyhow::Result;

use mdc_cookies::TargetRegistry;

use crate::cli::output;

/// List the built-in probe targets.
pub fn run() -> Result<()> {
    let registry = TargetRegistry::builtin();

    if output::is_json() {
        let targets: Vec<serde_json::Value> = registry
            .iter()
            .map(|t| {
                serde_json::json!({
                    "domain": t.domain,
                    "probe_url": t.probe_url,
                    "success_indicators": t.success_indicators,
                    "block_indicators": t.block_indicators,
                })
            })
            .collect();
        output::print_json(&serde_json::json!({ "targets": targets }));
        return Ok(());
    }

    println!("{}\n", output::heading("Probe Targets"));
    for target in registry.iter() {
        println!("  {:<20} {}", target.domain, target.probe_url);
        if output::is_verbose() {
            println!("    success: {}", target.success_indicators.join(", "));
            println!("    blocked: {}", target.block_indicators.join(", "));
        }
    }
    Ok(())
}
