//! List providers that have credentials.

use parley_core::Vendor;

use crate::AppContext;

pub fn run(ctx: &AppContext) -> anyhow::Result<()> {
    let registry = ctx.orchestrator.registry();
    let available = registry.list_available();

    println!("Available providers:\n");
    if available.is_empty() {
        println!("  No providers configured.");
        println!("\n  Set one of the following to add providers:");
        for vendor in Vendor::ALL {
            println!("    export {}=your-api-key", vendor.api_key_env());
        }
        return Ok(());
    }

    for (id, models) in registry.all_available_models() {
        let name = id
            .parse::<Vendor>()
            .map(|v| v.display_name())
            .unwrap_or("Unknown");
        println!("  {} ({})", name, id);
        for (model_type, names) in models {
            if names.is_empty() {
                continue;
            }
            println!("    {}: {}", model_type, names.join(", "));
        }
        println!();
    }

    Ok(())
}
