//! Prompt templates
//!
//! Pure string builders; the model service that sends them lives in the
//! application layer.

pub mod autonomy;
pub mod council;
pub mod reasoning;

pub use autonomy::AutonomyPromptTemplate;
pub use council::CouncilPromptTemplate;
pub use reasoning::ReasoningPromptTemplate;
