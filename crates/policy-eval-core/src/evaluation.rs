use std::{collections::BTreeMap, time::SystemTime};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::corpus::{GeneratedPolicies, PolicyKey, ReferenceSet};
use crate::metrics::{round_to, Evaluator, ScoreBundle};

/// Per-model, per-policy score bundles.
pub type EvaluationResults = BTreeMap<String, BTreeMap<PolicyKey, ScoreBundle>>;

/// Mean scores for one model across all of its scored policies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelAverage {
    pub avg_bleu: f64,
    pub avg_rouge_l_f: f64,
    pub avg_rouge_l_p: f64,
    pub avg_rouge_l_r: f64,
    pub num_policies: usize,
}

/// Scores every generated policy against the references of its framework.
#[derive(Debug, Clone, Default)]
pub struct BatchEvaluator {
    evaluator: Evaluator,
}

impl BatchEvaluator {
    pub fn new(evaluator: Evaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Policies without references for their framework are skipped. Every input model
    /// appears in the output, possibly with no entries.
    #[instrument(name = "evaluate_all", skip_all, fields(models = policies.len()))]
    pub fn evaluate_all(
        &self,
        policies: &GeneratedPolicies,
        references: &ReferenceSet,
    ) -> EvaluationResults {
        let jobs: Vec<(&String, &PolicyKey, &String, &Vec<String>)> = policies
            .iter()
            .flat_map(move |(model, model_policies)| {
                model_policies.iter().filter_map(move |(key, text)| {
                    match references.get(&key.framework).filter(|refs| !refs.is_empty()) {
                        Some(refs) => Some((model, key, text, refs)),
                        None => {
                            warn!(%model, policy = %key, "no references for policy; skipping");
                            None
                        }
                    }
                })
            })
            .collect();

        let scored: Vec<(&String, &PolicyKey, ScoreBundle)> = jobs
            .into_par_iter()
            .map(|(model, key, text, refs)| {
                let bundle = self.evaluator.evaluate(text, refs);
                debug!(
                    %model,
                    policy = %key,
                    bleu = bundle.bleu,
                    rouge_l_f = bundle.rouge_l_f,
                    "policy scored"
                );
                (model, key, bundle)
            })
            .collect();

        let mut results: EvaluationResults = policies
            .keys()
            .map(|model| (model.clone(), BTreeMap::new()))
            .collect();
        for (model, key, bundle) in scored {
            if let Some(model_results) = results.get_mut(model) {
                model_results.insert(key.clone(), bundle);
            }
        }
        info!(
            scored = results.values().map(BTreeMap::len).sum::<usize>(),
            "evaluation finished"
        );
        results
    }
}

/// Mean of each score field per model, rounded to 4 decimals. Models with no scored
/// policies are left out.
pub fn model_averages(results: &EvaluationResults) -> BTreeMap<String, ModelAverage> {
    model_averages_with_decimals(results, 4)
}

pub fn model_averages_with_decimals(
    results: &EvaluationResults,
    decimals: u32,
) -> BTreeMap<String, ModelAverage> {
    results
        .iter()
        .filter(|(_, scores)| !scores.is_empty())
        .map(|(model, scores)| {
            let count = scores.len() as f64;
            let mean = |field: fn(&ScoreBundle) -> f64| {
                round_to(scores.values().map(field).sum::<f64>() / count, decimals)
            };
            let average = ModelAverage {
                avg_bleu: mean(|s| s.bleu),
                avg_rouge_l_f: mean(|s| s.rouge_l_f),
                avg_rouge_l_p: mean(|s| s.rouge_l_p),
                avg_rouge_l_r: mean(|s| s.rouge_l_r),
                num_policies: scores.len(),
            };
            (model.clone(), average)
        })
        .collect()
}

/// Models ordered by `avg_bleu`, highest first; equal scores keep name order.
pub fn ranked_models(averages: &BTreeMap<String, ModelAverage>) -> Vec<(&str, &ModelAverage)> {
    let mut ranked: Vec<_> = averages
        .iter()
        .map(|(model, average)| (model.as_str(), average))
        .collect();
    ranked.sort_by(|a, b| b.1.avg_bleu.total_cmp(&a.1.avg_bleu));
    ranked
}

/// Model with the highest `avg_bleu`.
pub fn best_model(averages: &BTreeMap<String, ModelAverage>) -> Option<(&str, &ModelAverage)> {
    ranked_models(averages).into_iter().next()
}

/// Complete evaluation output: summary averages plus every per-policy bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub timestamp: String,
    pub summary: BTreeMap<String, ModelAverage>,
    pub detailed_results: EvaluationResults,
}

impl EvaluationReport {
    /// Build a report stamped with the current time.
    pub fn new(results: EvaluationResults, summary: BTreeMap<String, ModelAverage>) -> Self {
        Self::with_timestamp(
            humantime::format_rfc3339_seconds(SystemTime::now()).to_string(),
            results,
            summary,
        )
    }

    pub fn with_timestamp(
        timestamp: impl Into<String>,
        results: EvaluationResults,
        summary: BTreeMap<String, ModelAverage>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            summary,
            detailed_results: results,
        }
    }

    /// Evaluate, average and stamp in one step.
    pub fn build(
        batch: &BatchEvaluator,
        policies: &GeneratedPolicies,
        references: &ReferenceSet,
    ) -> Self {
        let results = batch.evaluate_all(policies, references);
        let summary = model_averages_with_decimals(&results, batch.evaluator().config().decimals);
        Self::new(results, summary)
    }
}
