//! Error handling
//!
//! Expected negative outcomes (below-threshold detection, no responder
//! available) are `Option`/result values, never errors. These enums cover
//! the genuinely exceptional paths: storage faults, code-generation
//! exhaustion, malformed input.

use serde::{Deserialize, Serialize};

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline-level error
#[derive(Debug)]
pub enum PipelineError {
    /// Persistence layer fault
    Store(StoreError),
    /// Could not obtain a unique alert code within the retry limit
    CodeExhausted { attempts: u32, last_code: String },
    /// Referenced region does not exist
    UnknownRegion { region_id: String },
    /// Malformed input that should have been caught upstream
    InvalidInput { reason: String },
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Store(e) => write!(f, "Store error: {}", e),
            PipelineError::CodeExhausted { attempts, last_code } => {
                write!(f, "No unique alert code after {} attempts (last: {})", attempts, last_code)
            }
            PipelineError::UnknownRegion { region_id } => {
                write!(f, "Unknown region: {}", region_id)
            }
            PipelineError::InvalidInput { reason } => write!(f, "Invalid input: {}", reason),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        PipelineError::Store(e)
    }
}

/// Persistence boundary error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreError {
    /// Alert code already exists (caller recomputes the sequence and retries)
    DuplicateCode { code: String },
    /// Backend failure (connection, schema, I/O)
    Backend { message: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateCode { code } => write!(f, "Duplicate alert code: {}", code),
            StoreError::Backend { message } => write!(f, "Storage backend error: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend { message: e.to_string() }
    }
}
