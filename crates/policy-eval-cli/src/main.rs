mod settings;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use policy_eval_core::{
    load_generated_policies, render_report, render_scores, write_report, BatchEvaluator,
    EvaluationReport, Evaluator, FileReferenceRepository, OutputFormat, ReferenceRepository,
    TokenizerKind,
};
use settings::AppConfig;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "policy-eval",
    author,
    version,
    about = "Score generated compliance policies against reference policies (BLEU / ROUGE-L)"
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Highest n-gram order used by BLEU
    #[arg(long = "max-n", value_name = "N", global = true)]
    max_n: Option<usize>,

    /// Tokenization strategy (`word` or `unicode`)
    #[arg(long, value_name = "KIND", global = true)]
    tokenizer: Option<TokenizerKind>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score one candidate text against one or more reference files
    Score {
        /// Reference policy file (repeatable)
        #[arg(long = "reference", value_name = "FILE", required = true)]
        references: Vec<PathBuf>,
        /// Candidate policy file; reads stdin when omitted
        #[arg(long, value_name = "FILE")]
        candidate: Option<PathBuf>,
        /// Output format: human, json or yaml
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
    /// Evaluate every generated policy and compare models
    Evaluate {
        /// Directory with reference policies (`nist_csf/`, `iso27001/`)
        #[arg(long, value_name = "DIR")]
        references_dir: Option<PathBuf>,
        /// Directory with generated policies (`<model>/<framework>/<category>.txt`)
        #[arg(long, value_name = "DIR")]
        policies_dir: Option<PathBuf>,
        /// Where to write the JSON report
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Only evaluate these models (repeatable)
        #[arg(long = "model", value_name = "NAME")]
        models: Vec<String>,
        /// Output format for stdout: human, json or yaml
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
    /// Show how many reference policies are available per framework
    ListReferences {
        #[arg(long, value_name = "DIR")]
        references_dir: Option<PathBuf>,
        /// Emit counts as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(max_n) = cli.max_n {
        config.scoring.max_n = max_n;
    }
    if let Some(tokenizer) = cli.tokenizer {
        config.scoring.tokenizer = tokenizer;
    }

    match cli.command.unwrap_or(Commands::ListReferences {
        references_dir: None,
        json: false,
    }) {
        Commands::Score {
            references,
            candidate,
            format,
        } => score(&config, &references, candidate.as_deref(), format).await?,
        Commands::Evaluate {
            references_dir,
            policies_dir,
            output,
            models,
            format,
        } => {
            if let Some(dir) = references_dir {
                config.paths.references_dir = dir;
            }
            if let Some(dir) = policies_dir {
                config.paths.policies_dir = dir;
            }
            if let Some(path) = output {
                config.paths.report = path;
            }
            if !models.is_empty() {
                config.models = models;
            }
            evaluate(&config, format).await?
        }
        Commands::ListReferences {
            references_dir,
            json,
        } => {
            let dir = references_dir.unwrap_or_else(|| config.paths.references_dir.clone());
            list_references(&dir, json).await?
        }
    }
    Ok(())
}

fn build_evaluator(config: &AppConfig) -> Result<Evaluator> {
    Evaluator::with_config(config.scoring).context("invalid scoring configuration")
}

async fn score(
    config: &AppConfig,
    reference_paths: &[PathBuf],
    candidate_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let evaluator = build_evaluator(config)?;

    let candidate = match candidate_path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read candidate from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("failed to read candidate from stdin")?;
            buffer
        }
    };

    let mut references = Vec::with_capacity(reference_paths.len());
    for path in reference_paths {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read reference from {}", path.display()))?;
        references.push(text);
    }

    let scores = evaluator.evaluate(&candidate, &references);
    print!("{}", render_scores(&scores, format)?);
    if format != OutputFormat::Human {
        println!();
    }
    Ok(())
}

async fn evaluate(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let evaluator = build_evaluator(config)?;
    let paths = &config.paths;

    let repo = FileReferenceRepository::new(&paths.references_dir);
    let references = repo.load_references().await.with_context(|| {
        format!(
            "failed to load references from {}",
            paths.references_dir.display()
        )
    })?;
    if references.is_empty() {
        bail!(
            "no reference policies found in {}; create .txt files under nist_csf/ or iso27001/",
            paths.references_dir.display()
        );
    }

    let policies = load_generated_policies(&paths.policies_dir, &config.models)?;
    if policies.values().all(|p| p.is_empty()) {
        bail!(
            "no generated policies found in {}",
            paths.policies_dir.display()
        );
    }

    let report = EvaluationReport::build(&BatchEvaluator::new(evaluator), &policies, &references);
    print!("{}", render_report(&report, format)?);
    if format != OutputFormat::Human {
        println!();
    }
    write_report(&report, &paths.report)?;
    info!(path = %paths.report.display(), "evaluation report saved");
    Ok(())
}

async fn list_references(dir: &Path, json: bool) -> Result<()> {
    let repo = FileReferenceRepository::new(dir);
    let references = repo
        .load_references()
        .await
        .with_context(|| format!("failed to load references from {}", dir.display()))?;
    let counts: std::collections::BTreeMap<_, _> = references
        .iter()
        .map(|(framework, texts)| (*framework, texts.len()))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    let total: usize = counts.values().sum();
    println!("{} reference(s) loaded from {}", total, dir.display());
    for (framework, count) in counts {
        println!("- {framework:<10} {count}");
    }
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
