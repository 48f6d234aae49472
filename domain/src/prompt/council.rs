//! Prompt templates for council deliberation

use crate::deliberation::{Persona, Proposal};

/// Templates for proposal, review, synthesis and arbitration prompts
pub struct CouncilPromptTemplate;

impl CouncilPromptTemplate {
    /// Ask a participant for an improved version of the artifact
    pub fn proposal(artifact: &str, context: Option<&str>) -> String {
        let context = context
            .map(|c| format!("\n## Context\n\n{}\n", c))
            .unwrap_or_default();
        format!(
            r#"Propose an improved version of the following artifact.
{context}
## Artifact

{artifact}

Reply with the complete improved artifact only."#,
            context = context,
            artifact = artifact
        )
    }

    /// System prompt that puts a model in a persona's role
    pub fn persona_system(persona: &Persona) -> String {
        let authority = if persona.veto {
            "You hold veto authority. Write VETO only for problems that must block acceptance."
        } else {
            "You are an advisory reviewer."
        };
        let directive = if persona.directive.is_empty() {
            String::new()
        } else {
            format!("\n\nFocus: {}", persona.directive)
        };
        format!(
            "You are the {} reviewer on a review council. {}{}",
            persona.name, authority, directive
        )
    }

    /// Review prompt for one persona
    pub fn review(persona: &Persona, proposal: &Proposal) -> String {
        let options = if persona.veto {
            "APPROVE, REJECT or VETO"
        } else {
            "APPROVE or REJECT"
        };
        format!(
            r#"## Proposal (round {round}, by {producer})

{content}

Review the proposal from the {name} perspective.
Start your reply with {options}, then give your reasons."#,
            round = proposal.round,
            producer = proposal.producer,
            content = proposal.content,
            name = persona.name,
            options = options
        )
    }

    /// Revise a proposal using the rejecting reviewers' reasons
    pub fn synthesize(proposal: &Proposal, feedback: &str) -> String {
        format!(
            r#"## Current Proposal

{content}

## Reviewer Objections

{feedback}

Revise the proposal so that it addresses every objection. Reply with the
complete revised artifact only."#,
            content = proposal.content,
            feedback = feedback
        )
    }

    /// Ask the arbiter to pick or merge the best of several proposals
    pub fn arbitrate(original: &str, proposals: &[Proposal]) -> String {
        let candidates = proposals
            .iter()
            .enumerate()
            .map(|(i, p)| format!("### Candidate {} ({})\n\n{}", i + 1, p.producer, p.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            r#"## Original

{original}

## Candidates

{candidates}

Pick the best candidate or merge the best changes from several. Reply with
the complete resulting artifact only."#,
            original = original,
            candidates = candidates
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_mentions_veto_only_for_veto_personas() {
        let proposal = Proposal::new("gpt", "fn f() {}", 1);
        let veto = Persona::new("security", 1.0).with_veto();
        let advisory = Persona::new("style", 0.5);

        assert!(CouncilPromptTemplate::review(&veto, &proposal).contains("VETO"));
        assert!(!CouncilPromptTemplate::review(&advisory, &proposal).contains("VETO"));
    }

    #[test]
    fn test_arbitrate_lists_candidates() {
        let proposals = vec![Proposal::new("a", "one", 1), Proposal::new("b", "two", 1)];
        let prompt = CouncilPromptTemplate::arbitrate("zero", &proposals);
        assert!(prompt.contains("### Candidate 1 (a)"));
        assert!(prompt.contains("### Candidate 2 (b)"));
    }
}
