//! # System Module
//!
//! Informational metrics over a model. Metrics never gate construction;
//! structural validity is the concern of `Model::validate`.

mod metrics;

pub use metrics::*;
