//! Task value object

use serde::{Deserialize, Serialize};

/// Default budget ceiling (USD) for a task when none is given.
pub const DEFAULT_TASK_BUDGET: f64 = 1.0;

/// A unit of work handed to a reasoning executor or an agent.
///
/// Immutable once built; derived tasks (e.g. with lessons appended) are new
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    goal: String,
    scope: String,
    budget: f64,
    filter: Option<String>,
}

impl Task {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            scope: "general".to_string(),
            budget: DEFAULT_TASK_BUDGET,
            filter: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the budget ceiling. Negative values are treated as zero.
    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = budget.max(0.0);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// A copy of this task whose goal carries lessons from earlier attempts.
    pub fn with_lessons(&self, lessons: &[String]) -> Self {
        if lessons.is_empty() {
            return self.clone();
        }
        let notes = lessons
            .iter()
            .map(|l| format!("- {}", l))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            goal: format!(
                "{}\n\nLessons from previous attempts:\n{}",
                self.goal, notes
            ),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = Task::new("summarize logs")
            .with_scope("ops")
            .with_budget(2.5)
            .with_filter("*.log");
        assert_eq!(task.goal(), "summarize logs");
        assert_eq!(task.scope(), "ops");
        assert_eq!(task.budget(), 2.5);
        assert_eq!(task.filter(), Some("*.log"));
    }

    #[test]
    fn test_negative_budget_is_zero() {
        assert_eq!(Task::new("x").with_budget(-3.0).budget(), 0.0);
    }

    #[test]
    fn test_with_lessons_keeps_original() {
        let task = Task::new("fix the parser").with_scope("code");
        let retried = task.with_lessons(&["check the tests first".to_string()]);
        assert_eq!(task.goal(), "fix the parser");
        assert!(retried.goal().contains("- check the tests first"));
        assert_eq!(retried.scope(), "code");
        assert_eq!(task.with_lessons(&[]), task);
    }
}
