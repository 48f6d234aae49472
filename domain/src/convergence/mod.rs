//! Convergence detection
//!
//! Shared by council refinement loops and the heartbeat autonomy cycle:
//!
//! | Signal | Condition |
//! |--------|-----------|
//! | converged | latest `violations == 0` |
//! | max iterations | snapshots pushed ≥ cap |
//! | oscillation | scores A-B-A-B in the last 4 |
//! | diff oscillation | artifacts A-B-A-B by edit-distance similarity |
//! | plateau | every score step in the last window below epsilon |

pub mod similarity;
pub mod snapshot;
pub mod tracker;

pub use similarity::{edit_distance, similarity};
pub use snapshot::{MetricHistory, MetricSnapshot};
pub use tracker::{ConvergenceTracker, StopReason};
