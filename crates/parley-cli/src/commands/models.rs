//! Catalog details for one provider.

use parley_core::{ModelType, Vendor};

use crate::AppContext;

pub fn run(provider: &str, ctx: &AppContext) -> anyhow::Result<()> {
    let vendor: Vendor = provider.parse()?;
    let catalog = ctx.orchestrator.registry().catalog().vendor(vendor)?;

    println!("{} models\n", vendor.display_name());

    for model_type in ModelType::ALL {
        let models = catalog.models(model_type);
        let default = catalog.default_model(model_type);
        println!("{} (default: {})", model_type, default.unwrap_or("none"));
        if models.is_empty() {
            println!("  (no models)\n");
            continue;
        }

        for name in models {
            let c = catalog.characteristics(name);
            let marker = if Some(name.as_str()) == default { " *" } else { "" };
            println!(
                "  {}{} - context {} tokens",
                name,
                marker,
                catalog.context_window(name)
            );
            if !c.strengths.is_empty() {
                println!("      strengths: {}", c.strengths.join(", "));
            }
            if !c.cost_per_1k_tokens.is_empty() {
                println!("      cost/1K: {}", c.cost_per_1k_tokens);
            }
        }
        println!();
    }

    Ok(())
}
