//! Registry Service - the agent trust registry as one shared object.
//!
//! [`Registry`] wraps the identity store, the feedback and validation ledgers,
//! the administrator configuration, a logical clock and the event journal.
//! Every mutating call is a single indivisible step.

#![deny(unsafe_code)]

pub mod registry;
pub mod settings;

pub use registry::Registry;
pub use settings::{RegistrySettings, SettingsError};

pub use registry_feedback::{
    FeedbackEntry, FeedbackQuery, FeedbackSubmission, FeedbackSummary, FeedbackView,
};
pub use registry_identity::{
    Agent, MetadataEntry, SignatureValidator, WalletBinding, WALLET_METADATA_KEY,
};
pub use registry_types::{
    AgentId, ErrorKind, Hash32, Identity, JournalEntry, RegistryError, RegistryEvent,
    RegistryResult, Timestamp,
};
pub use registry_validation::{
    ValidationKey, ValidationRequest, ValidationResponse, ValidationStatus, ValidationSummary,
};
