//! Canopy Core - Deforestation Detection & Alert Pipeline
//!
//! Library crate consumed by the monitoring web layer. Owns the
//! detection -> alert -> notification pipeline:
//!
//! - `logic::index` - vegetation index math and classification
//! - `logic::detector` - before/after change detection and trends
//! - `logic::model` - deterministic detection scoring
//! - `logic::alert` - alert synthesis, assignment, persistence
//! - `logic::notify` - multi-channel notification fan-out
//! - `logic::store` - collaborator traits + reference stores
//!
//! Dashboards, forms, region/user CRUD and auth live in the web layer
//! and only consume the records this crate produces.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{PipelineError, PipelineResult};
