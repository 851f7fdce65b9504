//! Identity store: canonical agent id to controller mapping.
//!
//! Agent ids are assigned sequentially from 0 and never reused. The store is
//! also the registry's [`AuthorityOracle`]: controller, delegated-all operator
//! and delegated-single authority are resolved here and nowhere else.

use registry_types::{
    AgentId, AuthorityOracle, EventJournal, Identity, RegistryError, RegistryEvent,
    RegistryResult, Timestamp,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::agent::{Agent, MetadataEntry, WALLET_METADATA_KEY};
use crate::wallet::{
    check_deadline, verify_binding, AccountDirectory, SignatureValidator, WalletBinding,
    DEFAULT_MAX_DEADLINE_WINDOW,
};

#[derive(Debug)]
pub struct IdentityStore {
    agents: Vec<Agent>,
    /// (controller, operator) pairs holding delegated-all authority.
    operators: HashSet<(Identity, Identity)>,
    accounts: AccountDirectory,
    max_deadline_window: u64,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::with_deadline_window(DEFAULT_MAX_DEADLINE_WINDOW)
    }

    pub fn with_deadline_window(max_deadline_window: u64) -> Self {
        Self {
            agents: Vec::new(),
            operators: HashSet::new(),
            accounts: AccountDirectory::new(),
            max_deadline_window,
        }
    }

    pub fn max_deadline_window(&self) -> u64 {
        self.max_deadline_window
    }

    /// Register a new agent controlled by `caller`.
    pub fn mint(
        &mut self,
        caller: Identity,
        uri: Option<String>,
        metadata: Vec<MetadataEntry>,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<AgentId> {
        if caller.is_zero() {
            return Err(RegistryError::InvalidInput(
                "the zero identity cannot control an agent".to_string(),
            ));
        }
        for entry in &metadata {
            reject_reserved_key(&entry.key)?;
        }

        let id = AgentId(self.agents.len() as u64);
        let mut agent = Agent {
            id,
            controller: caller,
            uri,
            metadata: metadata
                .into_iter()
                .map(|entry| (entry.key, entry.value))
                .collect::<BTreeMap<_, _>>(),
            verified_wallet: None,
            single_delegate: None,
            registered_at: now,
        };
        agent.set_wallet(Some(caller));

        journal.record(
            now,
            RegistryEvent::Registered {
                agent_id: id,
                controller: caller,
                uri: agent.uri.clone(),
                metadata: agent.metadata.clone(),
            },
        );
        self.agents.push(agent);

        info!(agent = %id, controller = %caller.short_id(), "Agent registered");
        Ok(id)
    }

    pub fn set_metadata(
        &mut self,
        caller: &Identity,
        agent_id: AgentId,
        key: String,
        value: Vec<u8>,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<()> {
        self.authorize(caller, agent_id)?;
        reject_reserved_key(&key)?;

        let agent = self.agent_mut(agent_id)?;
        agent.metadata.insert(key.clone(), value.clone());
        journal.record(
            now,
            RegistryEvent::MetadataSet {
                agent_id,
                key,
                value,
            },
        );
        Ok(())
    }

    pub fn set_uri(
        &mut self,
        caller: &Identity,
        agent_id: AgentId,
        uri: String,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<()> {
        self.authorize(caller, agent_id)?;

        let agent = self.agent_mut(agent_id)?;
        agent.uri = Some(uri.clone());
        journal.record(
            now,
            RegistryEvent::UriUpdated {
                agent_id,
                uri,
                updated_by: *caller,
            },
        );
        Ok(())
    }

    /// Metadata value for `key`; empty when unset.
    pub fn metadata(&self, agent_id: AgentId, key: &str) -> RegistryResult<Vec<u8>> {
        let agent = self.agent_ref(agent_id)?;
        Ok(agent.metadata.get(key).cloned().unwrap_or_default())
    }

    /// Agent URI; empty when unset.
    pub fn uri(&self, agent_id: AgentId) -> RegistryResult<String> {
        let agent = self.agent_ref(agent_id)?;
        Ok(agent.uri.clone().unwrap_or_default())
    }

    /// Replace the verified wallet after checking the deadline and proof of control.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_and_set_wallet(
        &mut self,
        caller: &Identity,
        agent_id: AgentId,
        new_wallet: Identity,
        deadline: Timestamp,
        proof: &[u8],
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<()> {
        self.authorize(caller, agent_id)?;
        if new_wallet.is_zero() {
            return Err(RegistryError::InvalidInput(
                "wallet must not be the zero identity".to_string(),
            ));
        }
        check_deadline(deadline, now, self.max_deadline_window)?;

        let binding = WalletBinding {
            agent_id,
            new_wallet,
            controller: self.agent_ref(agent_id)?.controller,
            deadline,
        };
        verify_binding(&self.accounts, &binding, proof)?;

        self.agent_mut(agent_id)?.set_wallet(Some(new_wallet));
        journal.record(
            now,
            RegistryEvent::WalletVerified {
                agent_id,
                wallet: new_wallet,
                deadline,
            },
        );

        info!(agent = %agent_id, wallet = %new_wallet.short_id(), "Verified wallet updated");
        Ok(())
    }

    /// Hand control to `to`. The verified wallet survives only a self-transfer.
    pub fn transfer(
        &mut self,
        caller: &Identity,
        agent_id: AgentId,
        to: Identity,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<()> {
        self.authorize(caller, agent_id)?;
        if to.is_zero() {
            return Err(RegistryError::InvalidInput(
                "cannot transfer to the zero identity".to_string(),
            ));
        }

        let agent = self.agent_mut(agent_id)?;
        let from = agent.controller;
        let wallet_cleared = to != from;

        agent.controller = to;
        agent.single_delegate = None;
        if wallet_cleared {
            agent.set_wallet(None);
        }

        journal.record(
            now,
            RegistryEvent::Transferred {
                agent_id,
                from,
                to,
                wallet_cleared,
            },
        );

        info!(
            agent = %agent_id,
            from = %from.short_id(),
            to = %to.short_id(),
            wallet_cleared,
            "Agent transferred"
        );
        Ok(())
    }

    /// Grant or clear delegated-single authority over one agent.
    pub fn approve(
        &mut self,
        caller: &Identity,
        agent_id: AgentId,
        delegate: Option<Identity>,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<()> {
        let controller = self.agent_ref(agent_id)?.controller;
        if *caller != controller && !self.has_delegated_all(&controller, caller) {
            return Err(RegistryError::Unauthorized(format!(
                "{} cannot approve delegates for {}",
                caller.short_id(),
                agent_id
            )));
        }
        if delegate.is_some_and(|d| d == controller || d.is_zero()) {
            return Err(RegistryError::InvalidInput(
                "delegate must differ from the controller and the zero identity".to_string(),
            ));
        }

        self.agent_mut(agent_id)?.single_delegate = delegate;
        journal.record(
            now,
            RegistryEvent::Approval {
                agent_id,
                controller,
                delegate,
            },
        );
        Ok(())
    }

    /// Grant or revoke delegated-all authority of `operator` over the caller's agents.
    pub fn set_approval_for_all(
        &mut self,
        caller: &Identity,
        operator: Identity,
        approved: bool,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<()> {
        if operator.is_zero() || operator == *caller {
            return Err(RegistryError::InvalidInput(
                "operator must differ from the caller and the zero identity".to_string(),
            ));
        }

        if approved {
            self.operators.insert((*caller, operator));
        } else {
            self.operators.remove(&(*caller, operator));
        }
        journal.record(
            now,
            RegistryEvent::ApprovalForAll {
                controller: *caller,
                operator,
                approved,
            },
        );
        Ok(())
    }

    /// Install a signature-validation callback for `address`.
    pub fn register_programmable_account(
        &mut self,
        address: Identity,
        validator: Arc<dyn SignatureValidator>,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<()> {
        self.accounts.register(address, validator)?;
        journal.record(now, RegistryEvent::ProgrammableAccountRegistered { address });
        debug!(address = %address.short_id(), "Programmable account registered");
        Ok(())
    }

    pub fn agent(&self, agent_id: AgentId) -> RegistryResult<Agent> {
        self.agent_ref(agent_id).cloned()
    }

    pub fn verified_wallet(&self, agent_id: AgentId) -> RegistryResult<Option<Identity>> {
        Ok(self.agent_ref(agent_id)?.verified_wallet)
    }

    pub fn agent_count(&self) -> u64 {
        self.agents.len() as u64
    }

    /// Whether `operator` may act for every agent `controller` holds.
    pub fn is_operator(&self, controller: &Identity, operator: &Identity) -> bool {
        self.has_delegated_all(controller, operator)
    }

    pub fn is_programmable(&self, address: &Identity) -> bool {
        self.accounts.is_programmable(address)
    }

    fn agent_ref(&self, agent_id: AgentId) -> RegistryResult<&Agent> {
        usize::try_from(agent_id.value())
            .ok()
            .and_then(|index| self.agents.get(index))
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))
    }

    fn agent_mut(&mut self, agent_id: AgentId) -> RegistryResult<&mut Agent> {
        usize::try_from(agent_id.value())
            .ok()
            .and_then(|index| self.agents.get_mut(index))
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorityOracle for IdentityStore {
    fn controller_of(&self, agent_id: AgentId) -> Option<Identity> {
        self.agent_ref(agent_id).ok().map(|agent| agent.controller)
    }

    fn has_delegated_all(&self, controller: &Identity, operator: &Identity) -> bool {
        self.operators.contains(&(*controller, *operator))
    }

    fn single_delegate(&self, agent_id: AgentId) -> Option<Identity> {
        self.agent_ref(agent_id)
            .ok()
            .and_then(|agent| agent.single_delegate)
    }
}

fn reject_reserved_key(key: &str) -> RegistryResult<()> {
    if key == WALLET_METADATA_KEY {
        Err(RegistryError::InvalidInput(format!(
            "metadata key '{}' is reserved",
            WALLET_METADATA_KEY
        )))
    } else {
        Ok(())
    }
}
