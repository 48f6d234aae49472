//! Vote response parsing for persona reviews.
//!
//! These functions extract structured decisions from free-form reviewer
//! responses. Pure text pattern matching, no I/O.
//!
//! | Function | Keywords |
//! |----------|----------|
//! | [`parse_review_response`] | APPROVE / REJECT |
//! | [`parse_persona_vote`] | VETO (veto personas only), then APPROVE / REJECT |

use super::persona::Persona;
use super::vote::PersonaVote;
use crate::core::string::truncate;

const MAX_RATIONALE_CHARS: usize = 1200;

/// Parse a review response to extract approval status.
///
/// Checks for explicit APPROVE/REJECT keywords in the response text.
/// Conservative: defaults to rejection when ambiguous.
pub fn parse_review_response(response: &str) -> bool {
    let upper = response.to_uppercase();

    let approved = upper.contains("APPROVE")
        && !upper.contains("NOT APPROVE")
        && !upper.contains("DON'T APPROVE")
        && !upper.contains("CANNOT APPROVE");

    let rejected = upper.contains("REJECT")
        || upper.contains("REVISE")
        || upper.contains("NOT APPROVE")
        || upper.contains("CANNOT APPROVE");

    approved && !rejected
}

/// Whether the response invokes a veto.
fn mentions_veto(response: &str) -> bool {
    let upper = response.to_uppercase();
    upper.contains("VETO") && !upper.contains("NO VETO") && !upper.contains("NOT VETO")
}

/// Turn a persona's review into a vote.
///
/// A VETO keyword only counts for personas with veto authority; from an
/// advisory persona it reads as a plain rejection.
pub fn parse_persona_vote(persona: &Persona, response: &str) -> PersonaVote {
    let rationale = truncate(response.trim(), MAX_RATIONALE_CHARS);

    if mentions_veto(response) {
        return if persona.veto {
            PersonaVote::veto(&persona.name, persona.weight, rationale)
        } else {
            PersonaVote::reject(&persona.name, persona.weight, rationale)
        };
    }

    if parse_review_response(response) {
        PersonaVote::approve(&persona.name, persona.weight, rationale)
    } else {
        PersonaVote::reject(&persona.name, persona.weight, rationale)
    }
}
