//! Multi-provider comparison.

use parley_compare::Orchestrator;
use parley_core::{DispatchMode, ModelType};

use crate::output::{self, OutputFormat};
use crate::{AppContext, CompareArgs};

pub async fn run(args: CompareArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let vendors = if args.providers.is_empty() {
        ctx.config.compare.vendors.clone()
    } else {
        args.providers
    };

    let type_names = if args.model_types.is_empty() {
        &ctx.config.compare.model_types
    } else {
        &args.model_types
    };
    let model_types = type_names
        .iter()
        .map(|t| t.parse::<ModelType>())
        .collect::<Result<Vec<_>, _>>()?;

    let dispatch = if args.concurrent {
        DispatchMode::Concurrent
    } else {
        ctx.orchestrator.dispatch()
    };
    let orchestrator = Orchestrator::new(ctx.orchestrator.registry().clone())
        .with_options(ctx.orchestrator.options().clone())
        .with_dispatch(dispatch);

    let spinner = output::spinner(
        format!(
            "Querying {} provider(s) x {} model type(s)...",
            vendors.len(),
            model_types.len()
        ),
        args.output,
    );
    let result = orchestrator
        .compare_all(&args.query, vendors.as_slice(), &model_types)
        .await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let batch = result?;

    for warning in &batch.warnings {
        eprintln!("Warning: {}", warning);
    }
    if batch.is_empty() {
        anyhow::bail!(
            "No providers could be queried. Set OPENAI_API_KEY, ANTHROPIC_API_KEY or HUGGINGFACE_API_KEY."
        );
    }

    println!("{}", output::render_batch(&batch, args.output)?);

    if let Some(ref path) = args.save {
        output::save(path, |format: OutputFormat| output::render_batch(&batch, format))?;
    }

    Ok(())
}
