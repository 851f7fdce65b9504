use registry_types::{AgentId, Identity, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key mirroring the verified wallet. Callers can never write it directly.
pub const WALLET_METADATA_KEY: &str = "agentWallet";

/// A registered agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub controller: Identity,
    pub uri: Option<String>,
    pub metadata: BTreeMap<String, Vec<u8>>,
    pub verified_wallet: Option<Identity>,
    /// Delegated-single authority over this agent only.
    pub single_delegate: Option<Identity>,
    pub registered_at: Timestamp,
}

impl Agent {
    pub(crate) fn set_wallet(&mut self, wallet: Option<Identity>) {
        self.verified_wallet = wallet;
        match wallet {
            Some(wallet) => {
                self.metadata
                    .insert(WALLET_METADATA_KEY.to_string(), wallet.as_bytes().to_vec());
            }
            None => {
                self.metadata.remove(WALLET_METADATA_KEY);
            }
        }
    }
}

/// One caller-supplied metadata pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
