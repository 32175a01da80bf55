//! Single-provider query.

use std::time::Duration;

use parley_compare::Orchestrator;
use parley_core::ModelType;

use crate::output::{self, OutputFormat};
use crate::{AppContext, QueryArgs};

pub async fn run(args: QueryArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let model_type: ModelType = args.model_type.parse()?;

    let mut options = ctx.orchestrator.options().clone();
    if let Some(max_tokens) = args.max_tokens {
        options.max_tokens = max_tokens;
    }
    if let Some(temperature) = args.temperature {
        options.temperature = temperature;
    }
    if let Some(timeout) = args.timeout {
        options.timeout = Duration::from_secs(timeout);
    }
    let orchestrator = Orchestrator::new(ctx.orchestrator.registry().clone())
        .with_options(options)
        .with_dispatch(ctx.orchestrator.dispatch());

    let spinner = output::spinner(
        format!("Querying {} ({})...", args.provider, model_type),
        args.output,
    );
    let result = orchestrator
        .query_single(&args.query, &args.provider, model_type, args.model.as_deref())
        .await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let response = result?;

    println!("{}", output::render_single(&response, args.output)?);

    if let Some(ref path) = args.save {
        output::save(path, |format: OutputFormat| output::render_single(&response, format))?;
    }

    Ok(())
}
