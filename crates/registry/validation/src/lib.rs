//! Registry Validation - independent validator assessments of agents.
//!
//! An agent's controller (or delegate) asks a whitelisted validator to assess
//! the agent under a caller-chosen request hash. Only that validator may
//! answer, and it answers once. Summaries aggregate responded records by
//! validator and tag.

#![deny(unsafe_code)]

pub mod ledger;
pub mod record;

pub use ledger::ValidationLedger;
pub use record::{
    ValidationKey, ValidationRecord, ValidationRequest, ValidationResponse, ValidationState,
    ValidationStatus, ValidationSummary,
};
