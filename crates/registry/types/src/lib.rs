//! Registry Types - shared vocabulary for the agent trust registry.
//!
//! Identities, sequential agent ids, the logical clock, the error taxonomy,
//! journal events, the authority oracle used by both ledgers, the
//! administrator-owned configuration and the append-only log primitive.

#![deny(unsafe_code)]

pub mod admin;
pub mod authority;
pub mod error;
pub mod events;
pub mod ids;
pub mod log;

pub use admin::{AdminConfig, DEFAULT_MAX_RESPONDERS};
pub use authority::AuthorityOracle;
pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use events::{EventJournal, JournalEntry, RegistryEvent};
pub use ids::{AgentId, Hash32, Identity, Timestamp};
pub use log::AppendLog;

/// Maximum accepted score for feedback and validation responses.
pub const MAX_SCORE: u8 = 100;

/// Truncating integer average; zero for an empty set.
pub fn truncating_average(total: u64, count: u64) -> u8 {
    if count == 0 {
        0
    } else {
        (total / count) as u8
    }
}
