// Detection Module
// Rumor analysis core logic organized into specialized submodules:
// - prompt: Builds the verification prompt from classifier evidence
// - extraction: Recovers a JSON value from noisy agent output
// - validation: Schema and conditional-field checks plus normalization
// - fusion: Runs the full pipeline and fuses both signals into a verdict

pub mod prompt;
pub mod extraction;
pub mod validation;
pub mod fusion;

// Re-export commonly used functions
pub use prompt::build_verification_prompt;
pub use extraction::{extract_json, ExtractionError};
pub use validation::{
    normalize_response,
    validate_response,
    ValidationError,
    TOP_MATCH_PLACEHOLDER,
};
pub use fusion::{analyze, AnalysisFailure};
