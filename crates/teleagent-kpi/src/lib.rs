//! Offline evaluation of the agent against scripted scenarios: operation-call
//! alignment, final-answer similarity and latency.

pub mod error;
pub mod evaluator;
pub mod matching;
pub mod report;
pub mod scenario;
pub mod similarity;

pub use error::{KpiError, ReportError, ScenarioError};
pub use evaluator::{EvaluationResult, FinalAnswerScore, KpiEvaluator};
pub use matching::{ToolMatch, pairwise_finals, sequential_tool_match};
pub use report::{
    ReportRow, ReportSummary, render_table, rows, summarize, write_csv, write_csv_file,
};
pub use scenario::{GoldStandard, Scenario, ScenarioStep, load_scenarios, parse_scenarios};
pub use similarity::{SemanticScorer, cosine_similarity};
