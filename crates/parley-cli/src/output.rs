//! Rendering of responses for the terminal, JSON and Markdown.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};

use parley_compare::ComparisonBatch;
use parley_core::{ModelCharacteristics, NormalizedResponse};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl OutputFormat {
    /// Format implied by a save path: `.md` is Markdown, everything else JSON.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") => OutputFormat::Markdown,
            _ => OutputFormat::Json,
        }
    }
}

const PREVIEW_CHARS: usize = 100;
const RULE: &str = "------------------------------------------------------------";

/// Spinner shown while requests are in flight. `None` when stdout is not a terminal.
pub fn spinner(message: impl Into<String>, format: OutputFormat) -> Option<ProgressBar> {
    if format != OutputFormat::Console || !std::io::stdout().is_terminal() {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub fn render_single(response: &NormalizedResponse, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Console => console_single(response),
        OutputFormat::Json => serde_json::to_string_pretty(response)?,
        OutputFormat::Markdown => markdown_single(response),
    })
}

pub fn render_batch(batch: &ComparisonBatch, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Console => console_batch(batch),
        OutputFormat::Json => serde_json::to_string_pretty(&batch.responses)?,
        OutputFormat::Markdown => markdown_batch(batch),
    })
}

/// Write rendered output to `path`, choosing the format from its extension.
pub fn save(path: &Path, rendered: impl FnOnce(OutputFormat) -> anyhow::Result<String>) -> anyhow::Result<()> {
    let content = rendered(OutputFormat::for_path(path))?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("Results saved to {}", path.display());
    Ok(())
}

fn console_single(r: &NormalizedResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Model: {}", r.model_name);
    let _ = writeln!(out, "Provider: {} | Type: {}", r.provider, r.model_type);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{}", r.text);
    let _ = writeln!(out, "{}", RULE);
    if let Some(ref error) = r.error {
        let _ = writeln!(out, "Error: {}", error);
    }
    write_characteristics(&mut out, &r.characteristics);
    let _ = writeln!(
        out,
        "Tokens: {} in / {} out / {} total",
        r.token_usage.input, r.token_usage.output, r.token_usage.total
    );
    let _ = writeln!(
        out,
        "Context window: {} | Time: {:.2}s",
        r.context_window, r.response_time_seconds
    );
    out
}

fn write_characteristics(out: &mut String, c: &ModelCharacteristics) {
    if *c == ModelCharacteristics::default() {
        return;
    }
    let _ = writeln!(out, "Characteristics:");
    if !c.training_cutoff.is_empty() {
        let _ = writeln!(out, "  Training cutoff: {}", c.training_cutoff);
    }
    if !c.strengths.is_empty() {
        let _ = writeln!(out, "  Strengths: {}", c.strengths.join(", "));
    }
    if !c.use_cases.is_empty() {
        let _ = writeln!(out, "  Use cases: {}", c.use_cases.join(", "));
    }
    if !c.fine_tuning_strategy.is_empty() {
        let _ = writeln!(out, "  Fine-tuning: {}", c.fine_tuning_strategy);
    }
    if !c.instruction_following.is_empty() {
        let _ = writeln!(out, "  Instruction following: {}", c.instruction_following);
    }
    if !c.cost_per_1k_tokens.is_empty() {
        let _ = writeln!(out, "  Cost per 1K tokens: {}", c.cost_per_1k_tokens);
    }
}

fn console_batch(batch: &ComparisonBatch) -> String {
    let mut out = String::new();
    if batch.responses.is_empty() {
        let _ = writeln!(out, "No responses.");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<12} {:<11} {:<32} {:>7}  Preview",
        "Provider", "Type", "Model", "Tokens"
    );
    for r in &batch.responses {
        let preview = r.preview(PREVIEW_CHARS).replace('\n', " ");
        let _ = writeln!(
            out,
            "{:<12} {:<11} {:<32} {:>7}  {}",
            r.provider,
            r.model_type.as_str(),
            r.model_name,
            r.token_usage.total,
            preview
        );
    }
    let _ = writeln!(
        out,
        "\n{} of {} succeeded in {:.2}s",
        batch.successful(),
        batch.responses.len(),
        batch.total_time_seconds
    );

    for (i, r) in batch.responses.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n=== Response {}: {} - {} ===",
            i + 1,
            r.provider,
            r.model_type
        );
        out.push_str(&console_single(r));
    }
    out
}

fn markdown_section(out: &mut String, r: &NormalizedResponse) {
    let _ = writeln!(out, "**Model:** {}  ", r.model_name);
    let _ = writeln!(out, "**Type:** {}  ", r.model_type);
    let _ = writeln!(
        out,
        "**Tokens:** {} (input {}, output {})  ",
        r.token_usage.total, r.token_usage.input, r.token_usage.output
    );
    let _ = writeln!(out, "**Time:** {:.2}s", r.response_time_seconds);
    if let Some(ref error) = r.error {
        let _ = writeln!(out, "\n**Error:** {}", error);
    }
    let _ = writeln!(out, "\n**Response:**\n\n{}\n", r.text);
}

fn markdown_single(r: &NormalizedResponse) -> String {
    let mut out = String::from("# Model Response\n\n");
    let _ = writeln!(out, "**Provider:** {}  ", r.provider);
    markdown_section(&mut out, r);
    out
}

fn markdown_batch(batch: &ComparisonBatch) -> String {
    let mut out = String::from("# Model Comparison Results\n\n");
    for (i, r) in batch.responses.iter().enumerate() {
        let _ = writeln!(out, "## Response {}: {} - {}\n", i + 1, r.provider, r.model_type);
        markdown_section(&mut out, r);
    }
    if !batch.warnings.is_empty() {
        let _ = writeln!(out, "## Skipped\n");
        for w in &batch.warnings {
            let _ = writeln!(out, "- {}", w);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_core::{ModelType, TokenUsage};

    fn response(provider: &str, model_type: ModelType, text: &str) -> NormalizedResponse {
        NormalizedResponse {
            provider: provider.to_string(),
            model_name: "test-model".to_string(),
            model_type,
            text: text.to_string(),
            token_usage: TokenUsage::new(4, 6),
            response_time_seconds: 1.5,
            context_window: 4096,
            characteristics: ModelCharacteristics::default(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    fn batch() -> ComparisonBatch {
        ComparisonBatch {
            responses: vec![
                response("openai", ModelType::Instruct, "first"),
                response("anthropic", ModelType::Instruct, &"long ".repeat(50)),
            ],
            warnings: vec!["Skipping huggingface: missing".to_string()],
            total_time_seconds: 2.0,
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::for_path(Path::new("out.md")), OutputFormat::Markdown);
        assert_eq!(OutputFormat::for_path(Path::new("out.json")), OutputFormat::Json);
        assert_eq!(OutputFormat::for_path(Path::new("out.txt")), OutputFormat::Json);
        assert_eq!(OutputFormat::for_path(Path::new("out")), OutputFormat::Json);
    }

    #[test]
    fn test_console_batch_headings_and_preview() {
        let text = render_batch(&batch(), OutputFormat::Console).unwrap();
        assert!(text.contains("=== Response 1: openai - instruct ==="));
        assert!(text.contains("=== Response 2: anthropic - instruct ==="));
        assert!(text.contains("..."));
        assert!(text.contains("2 of 2 succeeded"));
    }

    #[test]
    fn test_markdown_batch() {
        let md = render_batch(&batch(), OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("# Model Comparison Results"));
        assert!(md.contains("## Response 1: openai - instruct"));
        assert!(md.contains("**Tokens:** 10"));
        assert!(md.contains("- Skipping huggingface: missing"));
    }

    #[test]
    fn test_markdown_single_includes_error() {
        let mut r = response("openai", ModelType::Base, "Error: boom");
        r.error = Some("boom".to_string());
        let md = render_single(&r, OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("# Model Response"));
        assert!(md.contains("**Error:** boom"));
    }

    #[test]
    fn test_json_uses_field_names() {
        let json = render_single(&response("openai", ModelType::FineTuned, "hi"), OutputFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["provider"], "openai");
        assert_eq!(value["model_type"], "fine-tuned");
        assert_eq!(value["token_usage"]["total"], 10);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_save_picks_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.md");
        let b = batch();
        save(&path, |f| render_batch(&b, f)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Model Comparison Results"));
    }
}
