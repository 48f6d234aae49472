//! Configuration value objects for the domain layer
//!
//! Validation issues are domain concepts shared by the config loader and
//! the `config` CLI subcommand.

mod validation;

pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
