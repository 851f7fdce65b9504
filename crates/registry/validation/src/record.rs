use registry_types::{AgentId, Hash32, Identity, Timestamp};
use serde::{Deserialize, Serialize};

/// Validation records are unique per agent, not globally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidationKey {
    pub agent_id: AgentId,
    pub request_hash: Hash32,
}

impl ValidationKey {
    pub fn new(agent_id: AgentId, request_hash: Hash32) -> Self {
        Self {
            agent_id,
            request_hash,
        }
    }
}

/// A request to have `validator` assess an agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub validator: Identity,
    pub agent_id: AgentId,
    pub request_uri: String,
    pub request_hash: Hash32,
}

/// A validator's verdict.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// 0..=100
    pub response: u8,
    pub response_uri: String,
    pub response_hash: Hash32,
    pub tag: String,
}

impl ValidationResponse {
    pub fn new(response: u8) -> Self {
        Self {
            response,
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_evidence(mut self, uri: impl Into<String>, hash: Hash32) -> Self {
        self.response_uri = uri.into();
        self.response_hash = hash;
        self
    }
}

/// Pending until the assigned validator answers; Responded is terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationState {
    Pending,
    Responded(ValidationResponse),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub key: ValidationKey,
    pub validator: Identity,
    pub requester: Identity,
    pub request_uri: String,
    pub state: ValidationState,
    pub last_update: Timestamp,
}

impl ValidationRecord {
    pub fn outcome(&self) -> Option<&ValidationResponse> {
        match &self.state {
            ValidationState::Responded(outcome) => Some(outcome),
            ValidationState::Pending => None,
        }
    }

    pub fn status(&self) -> ValidationStatus {
        let outcome = self.outcome();
        ValidationStatus {
            validator: self.validator,
            agent_id: self.key.agent_id,
            response: outcome.map(|o| o.response),
            response_hash: outcome.map(|o| o.response_hash),
            tag: outcome.map(|o| o.tag.clone()).unwrap_or_default(),
            last_update: self.last_update,
        }
    }
}

/// Read view of one validation record. `response` is `None` until answered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStatus {
    pub validator: Identity,
    pub agent_id: AgentId,
    pub response: Option<u8>,
    pub response_hash: Option<Hash32>,
    pub tag: String,
    pub last_update: Timestamp,
}

impl ValidationStatus {
    pub fn has_responded(&self) -> bool {
        self.response.is_some()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub count: u64,
    /// Truncating integer average of matching responses.
    pub average_response: u8,
}
