use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use policy_eval_core::ScoringConfig;
use serde::Deserialize;

const ENV_PREFIX: &str = "POLICY_EVAL";

/// Filesystem locations used by the `evaluate` pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub references_dir: PathBuf,
    pub policies_dir: PathBuf,
    pub report: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            references_dir: PathBuf::from("evaluation/reference_policies"),
            policies_dir: PathBuf::from("llm/policies"),
            report: PathBuf::from("evaluation/evaluation_report.json"),
        }
    }
}

/// Application settings assembled from an optional config file and `POLICY_EVAL_*`
/// environment variables (`__` separates nested keys, e.g. `POLICY_EVAL_SCORING__MAX_N`;
/// `POLICY_EVAL_MODELS` takes a comma-separated list).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scoring: ScoringConfig,
    pub paths: PathsConfig,
    /// Restrict evaluation to these model names; empty means every model found.
    pub models: Vec<String>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(env)
            .build()
            .with_context(|| match path {
                Some(path) => format!("failed to load configuration from {}", path.display()),
                None => "failed to load configuration from environment".to_string(),
            })?;
        settings
            .try_deserialize()
            .context("invalid configuration values")
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("models")
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_eval_core::TokenizerKind;
    use std::fs::write;

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let source: config::Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(source))
    }

    #[test]
    fn defaults_without_sources() {
        let config = AppConfig::load_with_env(None, env_from(&[])).expect("defaults load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.scoring.max_n, 4);
        assert_eq!(
            config.paths.references_dir,
            PathBuf::from("evaluation/reference_policies")
        );
    }

    #[test]
    fn reads_toml_file() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write(
            file.path(),
            "models = [\"deepseek\"]\n[scoring]\nmax_n = 2\ntokenizer = \"unicode\"\n[paths]\npolicies_dir = \"out/policies\"\n",
        )
        .unwrap();

        let config =
            AppConfig::load_with_env(Some(file.path()), env_from(&[])).expect("file loads");
        assert_eq!(config.scoring.max_n, 2);
        assert_eq!(config.scoring.tokenizer, TokenizerKind::Unicode);
        assert_eq!(config.paths.policies_dir, PathBuf::from("out/policies"));
        assert_eq!(config.paths.report, PathsConfig::default().report);
        assert_eq!(config.models, vec!["deepseek"]);
    }

    #[test]
    fn environment_overrides_file() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write(file.path(), "[scoring]\nmax_n = 2\n").unwrap();

        let config = AppConfig::load_with_env(
            Some(file.path()),
            env_from(&[("POLICY_EVAL_SCORING__MAX_N", "3")]),
        )
        .expect("env loads");
        assert_eq!(config.scoring.max_n, 3);
    }

    #[test]
    fn environment_lists_models() {
        let config = AppConfig::load_with_env(
            None,
            env_from(&[("POLICY_EVAL_MODELS", "deepseek,llama3")]),
        )
        .expect("model list loads");
        assert_eq!(config.models, vec!["deepseek", "llama3"]);
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let missing = Path::new("/nonexistent/policy-eval.toml");
        let err = AppConfig::load_with_env(Some(missing), env_from(&[]))
            .expect_err("missing file should error");
        assert!(err.to_string().contains("policy-eval.toml"));
    }
}
