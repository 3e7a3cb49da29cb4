use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use teleagent_core::action::parse_actions;
use teleagent_core::agent::ConversationAgent;
use teleagent_core::session::ConversationSession;
use teleagent_llm::EmbeddingProvider;

use crate::error::{KpiError, ScenarioError};
use crate::matching::{ToolMatch, pairwise_finals, sequential_tool_match};
use crate::report::{ReportRow, rows, write_csv_file};
use crate::scenario::{Scenario, load_scenarios};
use crate::similarity::SemanticScorer;

const MIN_LATENCY_SECONDS: f64 = 0.001;

/// Similarity of one gold/predicted final-answer pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalAnswerScore {
    pub gold: String,
    pub predicted: String,
    pub similarity: f32,
    pub passed: bool,
}

/// Outcome of replaying one scenario. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub scenario_id: String,
    pub expected_tools: Vec<String>,
    pub observed_tools: Vec<String>,
    pub tool_match: ToolMatch,
    pub final_scores: Vec<FinalAnswerScore>,
    /// Seconds per user turn, floored at one millisecond.
    pub latencies: Vec<f64>,
    pub failed_turns: usize,
}

impl EvaluationResult {
    pub fn scenario_ok(&self) -> bool {
        self.tool_match.scenario_ok()
    }

    pub fn tool_call_accuracy(&self) -> Option<f64> {
        self.tool_match.accuracy()
    }

    pub fn mean_similarity(&self) -> Option<f64> {
        mean(self.final_scores.iter().map(|s| f64::from(s.similarity)))
    }

    pub fn final_pass_rate(&self) -> Option<f64> {
        mean(
            self.final_scores
                .iter()
                .map(|s| if s.passed { 1.0 } else { 0.0 }),
        )
    }

    pub fn mean_latency(&self) -> Option<f64> {
        mean(self.latencies.iter().copied())
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Replays scenarios through an agent and scores what it did.
pub struct KpiEvaluator {
    agent: Arc<dyn ConversationAgent>,
    scorer: SemanticScorer,
}

impl KpiEvaluator {
    pub fn new(
        agent: Arc<dyn ConversationAgent>,
        embedder: Arc<dyn EmbeddingProvider>,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            agent,
            scorer: SemanticScorer::new(embedder, similarity_threshold),
        }
    }

    pub fn scorer(&self) -> &SemanticScorer {
        &self.scorer
    }

    /// Replay one scenario on a fresh session.
    ///
    /// A failing turn contributes no model output and is counted in
    /// `failed_turns`; it never aborts the scenario.
    pub async fn evaluate(&self, scenario: &Scenario) -> EvaluationResult {
        let scenario_id = scenario.display_id().to_string();
        let gold = scenario.gold();
        let expected_tools = scenario.expected_tools(&gold);

        let mut session = ConversationSession::new();
        let mut latencies = Vec::new();
        let mut captured = Vec::new();
        let mut failed_turns = 0;

        for message in scenario.user_messages() {
            let started = Instant::now();
            match self.agent.respond(&mut session, message).await {
                Ok(outcome) => captured.push(outcome.transcript_text()),
                Err(err) => {
                    warn!("Scenario {scenario_id}: turn failed: {err}");
                    failed_turns += 1;
                }
            }
            latencies.push(started.elapsed().as_secs_f64().max(MIN_LATENCY_SECONDS));
        }

        let mut observed_tools = Vec::new();
        let mut predicted_finals = Vec::new();
        for action in parse_actions(&captured.join("\n")) {
            if action.is_final_answer() {
                predicted_finals.push(action);
            } else {
                observed_tools.push(action.action);
            }
        }

        let tool_match = sequential_tool_match(observed_tools.as_slice(), expected_tools.as_slice());
        debug!(
            "Scenario {scenario_id}: observed {observed_tools:?}, expected {expected_tools:?}"
        );

        let mut final_scores = Vec::new();
        for (gold_text, predicted_text) in pairwise_finals(&gold.finals, &predicted_finals) {
            if gold_text.is_empty() && predicted_text.is_empty() {
                continue;
            }
            match self.scorer.similarity(&gold_text, &predicted_text).await {
                Ok(similarity) => final_scores.push(FinalAnswerScore {
                    passed: self.scorer.passes(similarity),
                    gold: gold_text,
                    predicted: predicted_text,
                    similarity,
                }),
                Err(err) => warn!("Scenario {scenario_id}: skipping final answer pair: {err}"),
            }
        }

        let result = EvaluationResult {
            scenario_id,
            expected_tools,
            observed_tools,
            tool_match,
            final_scores,
            latencies,
            failed_turns,
        };
        info!(
            "Scenario {}: {}/{} calls correct, ok={}",
            result.scenario_id,
            result.tool_match.correct,
            result.tool_match.total,
            result.scenario_ok()
        );
        result
    }

    /// Evaluate scenarios one after another, in order.
    pub async fn evaluate_all(&self, scenarios: &[Scenario]) -> Vec<EvaluationResult> {
        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            results.push(self.evaluate(scenario).await);
        }
        results
    }

    pub async fn evaluate_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Vec<EvaluationResult>, ScenarioError> {
        let scenarios = load_scenarios(path)?;
        Ok(self.evaluate_all(&scenarios).await)
    }

    /// Evaluate a scenario file into report rows, writing them as CSV to
    /// `csv_out` when given.
    pub async fn evaluate_report<P: AsRef<Path>>(
        &self,
        scenarios: P,
        csv_out: Option<&Path>,
    ) -> Result<Vec<ReportRow>, KpiError> {
        let results = self.evaluate_file(scenarios).await?;
        let rows = rows(&results);
        if let Some(out) = csv_out {
            write_csv_file(out, &rows)?;
            info!("Report written to {}", out.display());
        }
        Ok(rows)
    }
}
