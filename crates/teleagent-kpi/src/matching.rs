//! Alignment of observed operation calls against the expected sequence.

use teleagent_core::action::{ActionObject, normalize_name};

/// Result of walking observed calls against the expected list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolMatch {
    pub correct: usize,
    /// Number of observed calls.
    pub total: usize,
    /// Number of expected calls.
    pub expected: usize,
}

impl ToolMatch {
    /// Every observed call matched and nothing expected was left over.
    pub fn scenario_ok(&self) -> bool {
        self.correct == self.total && self.total == self.expected
    }

    /// `correct / total`, undefined when nothing was observed.
    pub fn accuracy(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }
}

/// Single forward pointer into `expected`: an observed call that matches the
/// pointed-to name advances it, anything else is a miss. No backtracking and
/// no skipping ahead.
pub fn sequential_tool_match<A, E>(observed: &[A], expected: &[E]) -> ToolMatch
where
    A: AsRef<str>,
    E: AsRef<str>,
{
    let mut pointer = 0;
    let mut correct = 0;
    for call in observed {
        if let Some(next) = expected.get(pointer)
            && normalize_name(call.as_ref()) == normalize_name(next.as_ref())
        {
            correct += 1;
            pointer += 1;
        }
    }

    ToolMatch {
        correct,
        total: observed.len(),
        expected: expected.len(),
    }
}

/// Pair gold and predicted final answers by position, up to the shorter list,
/// as `(gold_text, predicted_text)`.
pub fn pairwise_finals(gold: &[ActionObject], predicted: &[ActionObject]) -> Vec<(String, String)> {
    gold.iter()
        .zip(predicted)
        .map(|(g, p)| (g.input_text(), p.input_text()))
        .collect()
}
