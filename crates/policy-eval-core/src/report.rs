use std::{fmt::Write, fs, path::Path};

use anyhow::Context;

use crate::evaluation::{best_model, ranked_models, EvaluationReport};
use crate::metrics::ScoreBundle;

const RULE_WIDTH: usize = 70;

/// Format styles supported by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unknown output format `{other}`")),
        }
    }
}

/// Render a single score bundle.
pub fn render_scores(scores: &ScoreBundle, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_score_lines(scores),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(scores)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(scores)?),
    }
}

/// Render a full evaluation report. Human output is the model comparison table.
pub fn render_report(report: &EvaluationReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_comparison(report),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
    }
}

fn render_score_lines(scores: &ScoreBundle) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "BLEU:      {:.4}", scores.bleu)?;
    writeln!(out, "ROUGE-L F: {:.4}", scores.rouge_l_f)?;
    writeln!(out, "ROUGE-L P: {:.4}", scores.rouge_l_p)?;
    writeln!(out, "ROUGE-L R: {:.4}", scores.rouge_l_r)?;
    Ok(out)
}

fn render_comparison(report: &EvaluationReport) -> anyhow::Result<String> {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{rule}")?;
    writeln!(out, "LLM MODEL COMPARISON")?;
    writeln!(out, "{rule}")?;

    if report.summary.is_empty() {
        writeln!(out, "No results to compare.")?;
        return Ok(out);
    }

    writeln!(
        out,
        "{:<20} {:<10} {:<12} {:<12} {:<12} {}",
        "Model", "BLEU", "ROUGE-L F", "ROUGE-L P", "ROUGE-L R", "Policies"
    )?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    for (model, scores) in ranked_models(&report.summary) {
        writeln!(
            out,
            "{:<20} {:<10.4} {:<12.4} {:<12.4} {:<12.4} {}",
            model.to_uppercase(),
            scores.avg_bleu,
            scores.avg_rouge_l_f,
            scores.avg_rouge_l_p,
            scores.avg_rouge_l_r,
            scores.num_policies
        )?;
    }
    writeln!(out, "{rule}")?;

    if let Some((model, scores)) = best_model(&report.summary) {
        writeln!(out, "Best model: {}", model.to_uppercase())?;
        writeln!(out, "  BLEU: {:.4}", scores.avg_bleu)?;
        writeln!(out, "  ROUGE-L F: {:.4}", scores.avg_rouge_l_f)?;
    }
    Ok(out)
}

/// Write the report as pretty JSON, creating parent directories as needed.
pub fn write_report(report: &EvaluationReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("failed to write report to {}", path.display()))
}
