//! Prompt templates for the heartbeat autonomy cycle

use crate::heartbeat::{CandidateActionSet, JobDescriptor};

pub struct AutonomyPromptTemplate;

impl AutonomyPromptTemplate {
    /// Ask for adversarial questions about the pending jobs
    pub fn questions(jobs: &[JobDescriptor]) -> String {
        format!(
            r#"## Pending Jobs

{jobs}

Ask up to five hard questions a skeptical operator would ask before running
these jobs. One question per line."#,
            jobs = render_jobs(jobs)
        )
    }

    /// Ask for the preferred candidate action set
    pub fn decide(candidates: &[CandidateActionSet], questions: &[String]) -> String {
        let options = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "{}. {} risk={:.2} impact={:.2} confidence={:.2} cost={:.0}\n   jobs: {}",
                    i + 1,
                    c.strategy,
                    c.risk,
                    c.impact,
                    c.confidence,
                    c.cost,
                    c.job_ids.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"## Open Questions

{questions}

## Candidate Action Sets

{options}

Reply with the number of the candidate to run."#,
            questions = questions.join("\n"),
            options = options
        )
    }
}

fn render_jobs(jobs: &[JobDescriptor]) -> String {
    if jobs.is_empty() {
        return "(none)".to_string();
    }
    jobs.iter()
        .map(|j| {
            format!(
                "- {} `{}` priority={} failures={} enabled={}",
                j.id, j.command, j.priority, j.failures, j.enabled
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
