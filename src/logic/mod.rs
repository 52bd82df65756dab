//! Logic Module - Pipeline Engines
//!
//! Dependency order is strictly bottom-up:
//! index -> detector/model -> alert -> notify, with `store` as the
//! collaborator boundary. `alert` is the only component with side effects
//! beyond scoring.

pub mod geo;
pub mod index;
pub mod detector;
pub mod model;
pub mod alert;
pub mod notify;
pub mod store;
