pub mod corpus;
pub mod evaluation;
pub mod metrics;
pub mod report;

pub use corpus::{
    file_repository::{load_generated_policies, FileReferenceRepository},
    Framework, GeneratedPolicies, PolicyKey, ReferenceRepository, ReferenceSet,
};
pub use evaluation::{
    best_model, model_averages, ranked_models, BatchEvaluator, EvaluationReport,
    EvaluationResults, ModelAverage,
};
pub use metrics::{
    bleu::{bleu, brevity_penalty},
    evaluate,
    lcs::lcs_length,
    ngram::ngram_precisions,
    rouge::{rouge_l, RougeL},
    tokenizer::{tokenize, Tokenizer, TokenizerKind},
    Evaluator, ScoreBundle, ScoringConfig, ScoringConfigError,
};
pub use report::{render_report, render_scores, write_report, OutputFormat};
