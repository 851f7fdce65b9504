use registry_types::{AgentId, Hash32, Identity, Timestamp};
use serde::{Deserialize, Serialize};

/// Caller-supplied feedback about an agent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub agent_id: AgentId,
    /// 0..=100
    pub score: u8,
    pub tag1: String,
    pub tag2: String,
    pub endpoint: String,
    pub payload_uri: String,
    pub payload_hash: Hash32,
}

impl FeedbackSubmission {
    pub fn new(agent_id: AgentId, score: u8) -> Self {
        Self {
            agent_id,
            score,
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tag1: impl Into<String>, tag2: impl Into<String>) -> Self {
        self.tag1 = tag1.into();
        self.tag2 = tag2.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_payload(mut self, uri: impl Into<String>, hash: Hash32) -> Self {
        self.payload_uri = uri.into();
        self.payload_hash = hash;
        self
    }
}

/// A stored feedback entry. Never deleted; revocation only flips `revoked`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub agent_id: AgentId,
    pub client: Identity,
    /// Starts at 1 per (agent, client).
    pub index: u64,
    pub score: u8,
    pub tag1: String,
    pub tag2: String,
    pub endpoint: String,
    pub payload_uri: String,
    pub payload_hash: Hash32,
    pub revoked: bool,
    pub submitted_at: Timestamp,
}

impl FeedbackEntry {
    pub(crate) fn matches_tags(&self, tag1: &str, tag2: &str) -> bool {
        (tag1.is_empty() || self.tag1 == tag1) && (tag2.is_empty() || self.tag2 == tag2)
    }

    pub fn view(&self) -> FeedbackView {
        FeedbackView {
            client: self.client,
            index: self.index,
            score: self.score,
            tag1: self.tag1.clone(),
            tag2: self.tag2.clone(),
            revoked: self.revoked,
        }
    }
}

/// One row of a feedback listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackView {
    pub client: Identity,
    pub index: u64,
    pub score: u8,
    pub tag1: String,
    pub tag2: String,
    pub revoked: bool,
}

/// Filters for listing feedback. Empty filters are wildcards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackQuery {
    pub clients: Vec<Identity>,
    pub tag1: String,
    pub tag2: String,
    pub include_revoked: bool,
}

impl FeedbackQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn including_revoked(mut self) -> Self {
        self.include_revoked = true;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub count: u64,
    /// Truncating integer average of matching scores.
    pub average_score: u8,
}
