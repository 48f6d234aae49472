//! Per-call reasoning session record.

use super::response::Reflection;
use super::step::{Observation, Step};
use super::strategy::Strategy;
use std::time::{Duration, Instant};

/// Mutable record of one executor call.
///
/// Owned exclusively by the call that created it and dropped on return.
/// `restart` resets the per-strategy counters for a fallback attempt while
/// `lifetime_steps` and `cost` keep accumulating across attempts.
#[derive(Debug, Clone)]
pub struct ReasoningSession {
    strategy: Strategy,
    steps: Vec<Step>,
    step_count: usize,
    lifetime_steps: usize,
    started_at: Instant,
    plan: Vec<String>,
    reflections: Vec<Reflection>,
    cost: f64,
}

impl ReasoningSession {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            steps: Vec::new(),
            step_count: 0,
            lifetime_steps: 0,
            started_at: Instant::now(),
            plan: Vec::new(),
            reflections: Vec::new(),
            cost: 0.0,
        }
    }

    /// Start over with another strategy, keeping lifetime counters.
    pub fn restart(&mut self, strategy: Strategy) {
        self.strategy = strategy;
        self.steps.clear();
        self.step_count = 0;
        self.started_at = Instant::now();
        self.plan.clear();
        self.reflections.clear();
    }

    /// Clear the step log for another attempt under the same strategy.
    pub fn clear_steps(&mut self) {
        self.steps.clear();
        self.step_count = 0;
    }

    pub fn record_step(
        &mut self,
        thought: impl Into<String>,
        action: impl Into<String>,
        observation: Observation,
    ) -> &Step {
        self.step_count += 1;
        self.lifetime_steps += 1;
        let step = Step::new(self.step_count, thought, action, observation);
        self.steps.push(step);
        &self.steps[self.steps.len() - 1]
    }

    pub fn add_cost(&mut self, cost: f64) {
        self.cost += cost;
    }

    pub fn set_plan(&mut self, plan: Vec<String>) {
        self.plan = plan;
    }

    pub fn add_reflection(&mut self, reflection: Reflection) {
        self.reflections.push(reflection);
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn lifetime_steps(&self) -> usize {
        self.lifetime_steps
    }

    pub fn plan(&self) -> &[String] {
        &self.plan
    }

    pub fn reflections(&self) -> &[Reflection] {
        &self.reflections
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn last_observation(&self) -> Option<&Observation> {
        self.steps.last().map(|s| &s.observation)
    }

    /// Step log rendered for inclusion in a prompt.
    pub fn transcript(&self) -> String {
        self.steps
            .iter()
            .map(Step::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lessons gathered from all failed reflections, oldest first.
    pub fn lessons(&self) -> Vec<String> {
        self.reflections
            .iter()
            .filter(|r| !r.success)
            .flat_map(|r| r.lessons.iter().cloned())
            .collect()
    }
}
