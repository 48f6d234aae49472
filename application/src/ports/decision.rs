//! Decision port for the autonomy cycle's prioritize phase

use async_trait::async_trait;
use conclave_domain::CandidateActionSet;

/// Picks one candidate action set
///
/// Returning `None` (or an out-of-range index) makes the caller fall back to
/// the heuristic choice.
#[async_trait]
pub trait DecisionService: Send + Sync {
    async fn choose(&self, candidates: &[CandidateActionSet], questions: &[String])
    -> Option<usize>;
}
