//! Registry Identity - agent identity management.
//!
//! Mints sequentially numbered agents, tracks their controller, metadata and
//! delegations, and governs the verified-wallet attribute through a
//! deadline-bound proof of control. The store doubles as the authority oracle
//! consumed by the feedback and validation ledgers.

#![deny(unsafe_code)]

pub mod agent;
pub mod store;
pub mod wallet;

pub use agent::{Agent, MetadataEntry, WALLET_METADATA_KEY};
pub use store::IdentityStore;
pub use wallet::{
    check_deadline, verify_binding, AccountDirectory, AccountKind, SignatureValidator,
    WalletBinding, DEFAULT_MAX_DEADLINE_WINDOW, WALLET_BINDING_DOMAIN,
};
