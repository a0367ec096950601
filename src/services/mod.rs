// rumorAI Core Services
// Migrated from Python backend

pub mod classifier;
pub mod config_store;
pub mod providers;
pub mod detection;
pub mod stats;

pub use classifier::*;
pub use config_store::*;
pub use providers::*;
pub use stats::*;

// Re-export detection module functions
pub use detection::{
    analyze,
    build_verification_prompt,
    extract_json,
    normalize_response,
    validate_response,
    AnalysisFailure,
    ExtractionError,
    ValidationError,
};
