//! Diagnostic command to check configuration and credentials.

use std::path::Path;

use parley_core::{Config, Vendor};

use crate::AppContext;

fn report_path(label: &str, path: &Path) {
    println!("{}: {}", label, path.display());
    if path.exists() {
        println!("  ✓ Exists");
    } else {
        println!("  ✗ Not found");
    }
}

pub fn run(ctx: &AppContext, explicit: Option<&Path>) -> anyhow::Result<()> {
    println!("Running diagnostics...\n");

    report_path("User config", &Config::config_dir().join("config.toml"));
    report_path("Project config", Path::new(".parley/config.toml"));
    if let Some(path) = explicit {
        report_path("Explicit config", path);
    }

    match ctx.config.catalog.path {
        Some(ref path) => report_path("\nModel catalog", path),
        None => println!("\nModel catalog: built-in"),
    }

    println!("\nAPI Keys:");
    let registry = ctx.orchestrator.registry();
    let available = registry.list_available();
    for vendor in Vendor::ALL {
        if available.contains(&vendor.id()) {
            println!("  ✓ {} credentials found", vendor.display_name());
        } else {
            println!(
                "  ✗ {} credentials missing (set {})",
                vendor.display_name(),
                vendor.api_key_env()
            );
        }
    }

    let generation = &ctx.config.generation;
    println!("\nGeneration defaults:");
    println!("  max_tokens: {}", generation.max_tokens);
    println!("  temperature: {}", generation.temperature);
    println!("  timeout: {}s", generation.timeout_secs);
    println!("  dispatch: {:?}", ctx.config.compare.dispatch);

    println!("\nDiagnostics complete.");
    Ok(())
}
