//! Registry Feedback - client reputation about registered agents.
//!
//! Clients submit scored, tagged feedback; each (agent, client) pair gets its
//! own gapless index sequence. Entries can be revoked by their author but are
//! never removed. Anyone may append responses to an entry, bounded by the
//! administrator's responder cap. Aggregation is filtered by client and tags.

#![deny(unsafe_code)]

pub mod entry;
pub mod ledger;

pub use entry::{FeedbackEntry, FeedbackQuery, FeedbackSubmission, FeedbackSummary, FeedbackView};
pub use ledger::FeedbackLedger;
