//! Token estimation, context-window fit and truncation.

use parley_core::{ModelType, Vendor};
use parley_providers::TokenEstimator;

use crate::{AppContext, TokensArgs};

pub fn run(args: TokensArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let vendor: Vendor = args.provider.parse()?;
    let registry = ctx.orchestrator.registry();
    let estimator = registry.estimator();
    let catalog = registry.catalog().vendor(vendor)?;

    let model = args
        .model
        .clone()
        .or_else(|| catalog.default_model(ModelType::Instruct).map(str::to_string));
    let window = args.context_window.unwrap_or_else(|| match model.as_deref() {
        Some(m) => catalog.context_window(m) as usize,
        None => catalog.default_context_window as usize,
    });

    let stats = TokenEstimator::analyze(&args.text);
    println!("Text statistics:");
    println!("  Characters: {}", stats.characters);
    println!("  Words: {}", stats.words);
    println!("  Sentences: {}", stats.sentences);
    println!("  Avg word length: {:.1}", stats.avg_word_length);
    println!("  Avg sentence length: {:.1} words", stats.avg_sentence_length);

    let fit = estimator.check_fit(&args.text, window, vendor, model.as_deref());
    println!(
        "\nContext window ({}{}):",
        vendor,
        model.as_deref().map(|m| format!(" / {}", m)).unwrap_or_default()
    );
    println!("  Estimated tokens: {}", fit.estimated_tokens);
    println!("  Window: {}", fit.context_window);
    println!("  Utilization: {:.1}%", fit.utilization_percent);
    println!(
        "  Fits: {} ({} tokens remaining)",
        if fit.fits { "yes" } else { "no" },
        fit.remaining_tokens
    );

    if let Some(limit) = args.truncate {
        let truncated = estimator.truncate_to_tokens(&args.text, limit, vendor, model.as_deref());
        println!(
            "\nTruncated to {} tokens ({} estimated):",
            limit,
            estimator.estimate(&truncated, vendor, model.as_deref())
        );
        println!("{}", truncated);
    }

    Ok(())
}
