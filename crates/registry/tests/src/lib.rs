//! Shared fixtures for the registry scenario suites.

use ed25519_dalek::SigningKey;
use registry_service::{
    AgentId, Hash32, Identity, Registry, RegistryResult, Timestamp, WalletBinding,
};

/// Administrator used by every fixture registry.
pub const ADMIN: Identity = Identity([0xad; 32]);

/// Deterministic identity from a seed byte.
pub fn identity(seed: u8) -> Identity {
    Identity::from_bytes([seed; 32])
}

pub fn hash(seed: u8) -> Hash32 {
    Hash32::from_bytes([seed; 32])
}

/// Install a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Registry administered by [`ADMIN`] with `validators` already trusted.
pub fn registry_with_validators(validators: &[Identity]) -> RegistryResult<Registry> {
    init_tracing();
    let registry = Registry::new(ADMIN);
    for validator in validators {
        registry.add_trusted_validator(ADMIN, *validator)?;
    }
    Ok(registry)
}

/// A plain-key wallet: the identity is the Ed25519 verifying key.
pub struct KeyWallet {
    pub key: SigningKey,
}

impl KeyWallet {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::from_bytes(self.key.verifying_key().to_bytes())
    }

    /// Sign the binding of this wallet to `agent_id` under `controller`.
    pub fn prove(&self, agent_id: AgentId, controller: Identity, deadline: Timestamp) -> Vec<u8> {
        WalletBinding {
            agent_id,
            new_wallet: self.identity(),
            controller,
            deadline,
        }
        .sign(&self.key)
    }

    /// Bind this wallet to `agent_id` on behalf of its current controller.
    pub fn bind(
        &self,
        registry: &Registry,
        agent_id: AgentId,
        deadline: Timestamp,
    ) -> RegistryResult<()> {
        let controller = registry.controller_of(agent_id)?;
        let proof = self.prove(agent_id, controller, deadline);
        registry.verify_and_set_wallet(controller, agent_id, self.identity(), deadline, &proof)
    }
}
