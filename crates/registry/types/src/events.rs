//! Registry notifications and the append-only journal that carries them.
//!
//! Each successful mutating operation appends exactly one entry, inside the
//! same critical section as its state change. Off-chain indexers consume the
//! journal; delivery beyond the append itself is not tracked.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::{AgentId, Hash32, Identity, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryEvent {
    Registered {
        agent_id: AgentId,
        controller: Identity,
        uri: Option<String>,
        metadata: BTreeMap<String, Vec<u8>>,
    },
    MetadataSet {
        agent_id: AgentId,
        key: String,
        value: Vec<u8>,
    },
    UriUpdated {
        agent_id: AgentId,
        uri: String,
        updated_by: Identity,
    },
    WalletVerified {
        agent_id: AgentId,
        wallet: Identity,
        deadline: Timestamp,
    },
    Transferred {
        agent_id: AgentId,
        from: Identity,
        to: Identity,
        wallet_cleared: bool,
    },
    Approval {
        agent_id: AgentId,
        controller: Identity,
        delegate: Option<Identity>,
    },
    ApprovalForAll {
        controller: Identity,
        operator: Identity,
        approved: bool,
    },
    ProgrammableAccountRegistered {
        address: Identity,
    },
    NewFeedback {
        agent_id: AgentId,
        client: Identity,
        index: u64,
        score: u8,
        tag1: String,
        tag2: String,
        endpoint: String,
        payload_uri: String,
        payload_hash: Hash32,
    },
    FeedbackRevoked {
        agent_id: AgentId,
        client: Identity,
        index: u64,
    },
    ResponseAppended {
        agent_id: AgentId,
        client: Identity,
        index: u64,
        responder: Identity,
        response_uri: String,
        response_hash: Hash32,
    },
    ValidationRequested {
        agent_id: AgentId,
        requester: Identity,
        validator: Identity,
        request_uri: String,
        request_hash: Hash32,
    },
    ValidationResponded {
        agent_id: AgentId,
        validator: Identity,
        request_hash: Hash32,
        response: u8,
        response_uri: String,
        response_hash: Hash32,
        tag: String,
    },
    TrustedValidatorAdded {
        validator: Identity,
    },
    TrustedValidatorRemoved {
        validator: Identity,
    },
    MinFeedbackClockSet {
        threshold: Timestamp,
    },
    MaxRespondersSet {
        cap: usize,
    },
    AdminTransferred {
        from: Identity,
        to: Identity,
    },
}

impl RegistryEvent {
    /// Agent the event concerns, if any.
    pub fn agent_id(&self) -> Option<AgentId> {
        match self {
            RegistryEvent::Registered { agent_id, .. }
            | RegistryEvent::MetadataSet { agent_id, .. }
            | RegistryEvent::UriUpdated { agent_id, .. }
            | RegistryEvent::WalletVerified { agent_id, .. }
            | RegistryEvent::Transferred { agent_id, .. }
            | RegistryEvent::Approval { agent_id, .. }
            | RegistryEvent::NewFeedback { agent_id, .. }
            | RegistryEvent::FeedbackRevoked { agent_id, .. }
            | RegistryEvent::ResponseAppended { agent_id, .. }
            | RegistryEvent::ValidationRequested { agent_id, .. }
            | RegistryEvent::ValidationResponded { agent_id, .. } => Some(*agent_id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Gapless sequence number starting at 1.
    pub seq: u64,
    pub at: Timestamp,
    pub event: RegistryEvent,
}

/// Append-only event journal.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, at: Timestamp, event: RegistryEvent) -> u64 {
        let seq = self.entries.len() as u64 + 1;
        self.entries.push(JournalEntry { seq, at, event });
        seq
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries with `seq` strictly greater than `seq`.
    pub fn since(&self, seq: u64) -> &[JournalEntry] {
        let start = (seq as usize).min(self.entries.len());
        &self.entries[start..]
    }

    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
