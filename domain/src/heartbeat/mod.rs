//! Heartbeat domain: routine bookkeeping, backoff and the pure decision
//! algorithms of the autonomy cycle.

pub mod autonomy;
pub mod check;

pub use autonomy::{
    CandidateActionSet, CandidateStrategy, JobDescriptor, VerificationReport, build_candidates,
    heuristic_questions, select_heuristically,
};
pub use check::{BackoffPolicy, HeartbeatCheck, MAX_INTERVAL, MIN_INTERVAL, clamp_interval};
