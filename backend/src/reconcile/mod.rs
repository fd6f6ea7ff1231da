//! Reconciliation module.
//!
//! - Loaders: state side ([`SourceLoader`]) and CDC side ([`ReferenceLoader`])
//! - Engine: matching, classification and statistics
//! - Pipeline: parse → load → reconcile with logging

mod columns;
pub mod engine;
pub mod pipeline;
pub mod record_set;
pub mod reference;
pub mod source;
mod stats;

pub use engine::{first_difference, Reconciliation, ReconciliationEngine};
pub use pipeline::*;
pub use record_set::{EventCodeFilter, NormalizedRecordSet};
pub use reference::{ReferenceLoad, ReferenceLoader};
pub use source::{is_case_event_code, parse_add_time, SourceLoader, ADD_TIME_FORMAT};
pub use stats::EventStatistics;
