//! Deliberation domain
//!
//! Weighted multi-persona review of a candidate artifact.
//!
//! ```text
//! Proposal ──▶ veto personas ──▶ advisory personas ──▶ DeliberationRound
//!                 │ VETO                                   │
//!                 └────────────▶ Rejected ◀── consensus < threshold
//! ```
//!
//! `consensus = Σ approving weight / Σ weight`. A veto from a veto-empowered
//! persona rejects the round regardless of consensus.

pub mod outcome;
pub mod parsing;
pub mod persona;
pub mod proposal;
pub mod round;
pub mod vote;

pub use outcome::DeliberationOutcome;
pub use parsing::{parse_persona_vote, parse_review_response};
pub use persona::{Persona, split_roster};
pub use proposal::Proposal;
pub use round::{DeliberationRound, Verdict};
pub use vote::{PersonaVote, rejection_feedback, weighted_consensus};
