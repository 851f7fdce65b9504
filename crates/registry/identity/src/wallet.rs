//! Verified-wallet binding and proof-of-control checks.
//!
//! A proof binds `{agent_id, new_wallet, controller, deadline}`. Plain-key
//! wallets prove control with an Ed25519 signature over the binding digest;
//! programmable accounts are asked through their registered
//! [`SignatureValidator`].

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use registry_types::{AgentId, Identity, RegistryError, RegistryResult, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Domain tag prefixed to every encoded binding.
pub const WALLET_BINDING_DOMAIN: &[u8] = b"maple-registry/wallet-binding/v1";

/// Furthest a deadline may sit in the future, in clock units.
pub const DEFAULT_MAX_DEADLINE_WINDOW: u64 = 300;

/// The structured message a wallet signs to prove control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBinding {
    pub agent_id: AgentId,
    pub new_wallet: Identity,
    pub controller: Identity,
    pub deadline: Timestamp,
}

impl WalletBinding {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WALLET_BINDING_DOMAIN.len() + 8 + 32 + 32 + 8);
        out.extend_from_slice(WALLET_BINDING_DOMAIN);
        out.extend_from_slice(&self.agent_id.value().to_be_bytes());
        out.extend_from_slice(self.new_wallet.as_bytes());
        out.extend_from_slice(self.controller.as_bytes());
        out.extend_from_slice(&self.deadline.value().to_be_bytes());
        out
    }

    pub fn digest(&self) -> [u8; 32] {
        *blake3::hash(&self.encode()).as_bytes()
    }

    /// Sign the binding with a plain key. The key must belong to `new_wallet`.
    pub fn sign(&self, signing_key: &SigningKey) -> Vec<u8> {
        signing_key.sign(&self.digest()).to_bytes().to_vec()
    }
}

/// Signature-validation callback of a programmable account.
pub trait SignatureValidator: Send + Sync {
    fn is_valid_signature(&self, digest: &[u8; 32], proof: &[u8]) -> bool;
}

/// How an identity proves control.
pub enum AccountKind<'a> {
    PlainKey,
    Programmable(&'a dyn SignatureValidator),
}

/// Addresses that carry a signature-validation callback.
#[derive(Default)]
pub struct AccountDirectory {
    accounts: HashMap<Identity, Arc<dyn SignatureValidator>>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        address: Identity,
        validator: Arc<dyn SignatureValidator>,
    ) -> RegistryResult<()> {
        if address.is_zero() {
            return Err(RegistryError::InvalidInput(
                "account address must not be the zero identity".to_string(),
            ));
        }
        if self.accounts.contains_key(&address) {
            return Err(RegistryError::InvalidInput(format!(
                "account {} is already programmable",
                address.short_id()
            )));
        }
        self.accounts.insert(address, validator);
        Ok(())
    }

    pub fn is_programmable(&self, address: &Identity) -> bool {
        self.accounts.contains_key(address)
    }

    pub fn kind(&self, address: &Identity) -> AccountKind<'_> {
        match self.accounts.get(address) {
            Some(validator) => AccountKind::Programmable(validator.as_ref()),
            None => AccountKind::PlainKey,
        }
    }
}

impl fmt::Debug for AccountDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountDirectory")
            .field("accounts", &self.accounts.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Check `deadline` against the clock: not elapsed and not beyond `now + window`.
pub fn check_deadline(deadline: Timestamp, now: Timestamp, window: u64) -> RegistryResult<()> {
    if deadline < now {
        return Err(RegistryError::Expired(format!(
            "deadline {} elapsed at {}",
            deadline, now
        )));
    }
    if deadline > now.saturating_add(window) {
        return Err(RegistryError::NotYetValid(format!(
            "deadline {} is beyond the {} unit window from {}",
            deadline, window, now
        )));
    }
    Ok(())
}

/// Verify that `proof` demonstrates control of `binding.new_wallet`.
pub fn verify_binding(
    directory: &AccountDirectory,
    binding: &WalletBinding,
    proof: &[u8],
) -> RegistryResult<()> {
    let digest = binding.digest();
    let accepted = match directory.kind(&binding.new_wallet) {
        AccountKind::Programmable(validator) => validator.is_valid_signature(&digest, proof),
        AccountKind::PlainKey => verify_key_signature(&binding.new_wallet, &digest, proof),
    };

    if accepted {
        Ok(())
    } else {
        Err(RegistryError::Unauthorized(format!(
            "wallet proof rejected for {}",
            binding.new_wallet.short_id()
        )))
    }
}

fn verify_key_signature(wallet: &Identity, digest: &[u8; 32], proof: &[u8]) -> bool {
    let Ok(sig_bytes) = <[u8; 64]>::try_from(proof) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(wallet.as_bytes()) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);
    verifying_key.verify(digest, &signature).is_ok()
}
