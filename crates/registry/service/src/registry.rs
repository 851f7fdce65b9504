//! The shared registry.
//!
//! All state sits behind one write lock. A mutating call validates and commits
//! inside a single critical section, so a failed call leaves no trace and the
//! journal entry lands together with the state change it describes.

use parking_lot::RwLock;
use registry_feedback::{
    FeedbackEntry, FeedbackLedger, FeedbackQuery, FeedbackSubmission, FeedbackSummary,
    FeedbackView,
};
use registry_identity::{Agent, IdentityStore, MetadataEntry, SignatureValidator};
use registry_types::{
    AdminConfig, AgentId, AuthorityOracle, EventJournal, Hash32, Identity, JournalEntry,
    RegistryError, RegistryEvent, RegistryResult, Timestamp,
};
use registry_validation::{
    ValidationKey, ValidationLedger, ValidationRecord, ValidationRequest, ValidationResponse,
    ValidationStatus, ValidationSummary,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::settings::{RegistrySettings, SettingsError};

#[derive(Debug)]
struct RegistryState {
    identity: IdentityStore,
    feedback: FeedbackLedger,
    validation: ValidationLedger,
    config: AdminConfig,
    clock: Timestamp,
    journal: EventJournal,
}

/// Agent trust registry: identity store, feedback ledger and validation
/// ledger under one administrator. Share it through an `Arc`.
#[derive(Debug)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    /// Registry with default settings administered by `admin`.
    pub fn new(admin: Identity) -> Self {
        Self::with_parts(IdentityStore::new(), AdminConfig::new(admin))
    }

    pub fn from_settings(settings: &RegistrySettings) -> Result<Self, SettingsError> {
        let config = settings.admin_config()?;
        info!(
            admin = %settings.admin.short_id(),
            max_responders = settings.max_responders,
            trusted_validators = settings.trusted_validators.len(),
            "Registry initialized from settings"
        );
        Ok(Self::with_parts(
            IdentityStore::with_deadline_window(settings.max_deadline_window),
            config,
        ))
    }

    fn with_parts(identity: IdentityStore, config: AdminConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                identity,
                feedback: FeedbackLedger::new(),
                validation: ValidationLedger::new(),
                config,
                clock: Timestamp::GENESIS,
                journal: EventJournal::new(),
            }),
        }
    }

    // Logical clock

    pub fn now(&self) -> Timestamp {
        self.state.read().clock
    }

    /// Move the clock forward by `delta`. Returns the new reading.
    pub fn advance_clock(&self, delta: u64) -> Timestamp {
        let mut state = self.state.write();
        state.clock = state.clock.saturating_add(delta);
        state.clock
    }

    /// Set the clock. It never moves backwards.
    pub fn set_clock(&self, at: Timestamp) -> RegistryResult<()> {
        let mut state = self.state.write();
        if at < state.clock {
            return Err(RegistryError::InvalidInput(format!(
                "clock cannot move back from {} to {}",
                state.clock, at
            )));
        }
        state.clock = at;
        Ok(())
    }

    // Identity

    pub fn register(
        &self,
        caller: Identity,
        uri: Option<String>,
        metadata: Vec<MetadataEntry>,
    ) -> RegistryResult<AgentId> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state
            .identity
            .mint(caller, uri, metadata, state.clock, &mut state.journal)
    }

    pub fn set_metadata(
        &self,
        caller: Identity,
        agent_id: AgentId,
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> RegistryResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.identity.set_metadata(
            &caller,
            agent_id,
            key.into(),
            value.into(),
            state.clock,
            &mut state.journal,
        )
    }

    pub fn metadata(&self, agent_id: AgentId, key: &str) -> RegistryResult<Vec<u8>> {
        self.state.read().identity.metadata(agent_id, key)
    }

    pub fn set_uri(
        &self,
        caller: Identity,
        agent_id: AgentId,
        uri: impl Into<String>,
    ) -> RegistryResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state
            .identity
            .set_uri(&caller, agent_id, uri.into(), state.clock, &mut state.journal)
    }

    pub fn uri(&self, agent_id: AgentId) -> RegistryResult<String> {
        self.state.read().identity.uri(agent_id)
    }

    pub fn verify_and_set_wallet(
        &self,
        caller: Identity,
        agent_id: AgentId,
        new_wallet: Identity,
        deadline: Timestamp,
        proof: &[u8],
    ) -> RegistryResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.identity.verify_and_set_wallet(
            &caller,
            agent_id,
            new_wallet,
            deadline,
            proof,
            state.clock,
            &mut state.journal,
        )
    }

    pub fn transfer(
        &self,
        caller: Identity,
        agent_id: AgentId,
        to: Identity,
    ) -> RegistryResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state
            .identity
            .transfer(&caller, agent_id, to, state.clock, &mut state.journal)
    }

    pub fn approve(
        &self,
        caller: Identity,
        agent_id: AgentId,
        delegate: Option<Identity>,
    ) -> RegistryResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state
            .identity
            .approve(&caller, agent_id, delegate, state.clock, &mut state.journal)
    }

    pub fn set_approval_for_all(
        &self,
        caller: Identity,
        operator: Identity,
        approved: bool,
    ) -> RegistryResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state
            .identity
            .set_approval_for_all(&caller, operator, approved, state.clock, &mut state.journal)
    }

    pub fn register_programmable_account(
        &self,
        address: Identity,
        validator: Arc<dyn SignatureValidator>,
    ) -> RegistryResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.identity.register_programmable_account(
            address,
            validator,
            state.clock,
            &mut state.journal,
        )
    }

    pub fn controller_of(&self, agent_id: AgentId) -> RegistryResult<Identity> {
        self.state
            .read()
            .identity
            .controller_of(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))
    }

    pub fn verified_wallet(&self, agent_id: AgentId) -> RegistryResult<Option<Identity>> {
        self.state.read().identity.verified_wallet(agent_id)
    }

    pub fn single_delegate(&self, agent_id: AgentId) -> RegistryResult<Option<Identity>> {
        Ok(self.state.read().identity.agent(agent_id)?.single_delegate)
    }

    pub fn is_operator(&self, controller: &Identity, operator: &Identity) -> bool {
        self.state.read().identity.is_operator(controller, operator)
    }

    /// Whether `caller` holds authority over `agent_id`.
    pub fn is_authorized(&self, caller: &Identity, agent_id: AgentId) -> RegistryResult<bool> {
        self.state.read().identity.is_authorized(caller, agent_id)
    }

    pub fn agent_exists(&self, agent_id: AgentId) -> bool {
        self.state.read().identity.exists(agent_id)
    }

    /// Whether `address` signs wallet bindings through a registered validator.
    pub fn is_programmable(&self, address: &Identity) -> bool {
        self.state.read().identity.is_programmable(address)
    }

    pub fn agent(&self, agent_id: AgentId) -> RegistryResult<Agent> {
        self.state.read().identity.agent(agent_id)
    }

    pub fn agent_count(&self) -> u64 {
        self.state.read().identity.agent_count()
    }

    // Feedback

    pub fn give_feedback(
        &self,
        caller: Identity,
        submission: FeedbackSubmission,
    ) -> RegistryResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.feedback.give_feedback(
            &state.identity,
            &state.config,
            caller,
            submission,
            state.clock,
            &mut state.journal,
        )
    }

    pub fn revoke_feedback(
        &self,
        caller: Identity,
        agent_id: AgentId,
        index: u64,
    ) -> RegistryResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state
            .feedback
            .revoke_feedback(caller, agent_id, index, state.clock, &mut state.journal)
    }

    /// Append a response to a feedback entry. Returns the caller's response count for it.
    pub fn append_response(
        &self,
        caller: Identity,
        agent_id: AgentId,
        client: Identity,
        index: u64,
        response_uri: impl Into<String>,
        response_hash: Hash32,
    ) -> RegistryResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.feedback.append_response(
            &state.config,
            caller,
            agent_id,
            client,
            index,
            response_uri.into(),
            response_hash,
            state.clock,
            &mut state.journal,
        )
    }

    pub fn feedback_summary(
        &self,
        agent_id: AgentId,
        clients: &[Identity],
        tag1: &str,
        tag2: &str,
    ) -> FeedbackSummary {
        let summary = self.state.read().feedback.summary(agent_id, clients, tag1, tag2);
        debug!(agent = %agent_id, count = summary.count, "Feedback summary computed");
        summary
    }

    pub fn read_all_feedback(&self, agent_id: AgentId, query: &FeedbackQuery) -> Vec<FeedbackView> {
        self.state.read().feedback.read_all(agent_id, query)
    }

    pub fn read_feedback(
        &self,
        agent_id: AgentId,
        client: &Identity,
        index: u64,
    ) -> RegistryResult<FeedbackEntry> {
        self.state.read().feedback.read_feedback(agent_id, client, index)
    }

    pub fn clients(&self, agent_id: AgentId) -> Vec<Identity> {
        self.state.read().feedback.clients(agent_id)
    }

    pub fn last_index(&self, agent_id: AgentId, client: &Identity) -> u64 {
        self.state.read().feedback.last_index(agent_id, client)
    }

    pub fn response_count(
        &self,
        agent_id: AgentId,
        client: &Identity,
        index: u64,
        responders: &[Identity],
    ) -> u64 {
        self.state
            .read()
            .feedback
            .response_count(agent_id, client, index, responders)
    }

    pub fn responders(&self, agent_id: AgentId, client: &Identity, index: u64) -> Vec<Identity> {
        self.state.read().feedback.responders(agent_id, client, index)
    }

    // Validation

    pub fn validation_request(
        &self,
        caller: Identity,
        request: ValidationRequest,
    ) -> RegistryResult<ValidationKey> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.validation.validation_request(
            &state.identity,
            &state.config,
            caller,
            request,
            state.clock,
            &mut state.journal,
        )
    }

    pub fn validation_response(
        &self,
        caller: Identity,
        agent_id: AgentId,
        request_hash: Hash32,
        response: ValidationResponse,
    ) -> RegistryResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.validation.validation_response(
            caller,
            agent_id,
            request_hash,
            response,
            state.clock,
            &mut state.journal,
        )
    }

    pub fn validation_status(
        &self,
        agent_id: AgentId,
        request_hash: Hash32,
    ) -> RegistryResult<ValidationStatus> {
        self.state.read().validation.status(agent_id, request_hash)
    }

    pub fn validation_record(
        &self,
        agent_id: AgentId,
        request_hash: Hash32,
    ) -> RegistryResult<ValidationRecord> {
        self.state
            .read()
            .validation
            .record(agent_id, request_hash)
            .cloned()
    }

    pub fn validation_summary(
        &self,
        agent_id: AgentId,
        validators: &[Identity],
        tag: &str,
    ) -> ValidationSummary {
        let summary = self.state.read().validation.summary(agent_id, validators, tag);
        debug!(agent = %agent_id, count = summary.count, "Validation summary computed");
        summary
    }

    pub fn agent_validations(&self, agent_id: AgentId) -> Vec<Hash32> {
        self.state.read().validation.agent_validations(agent_id)
    }

    pub fn validator_requests(&self, validator: &Identity) -> Vec<ValidationKey> {
        self.state.read().validation.validator_requests(validator)
    }

    // Administration

    pub fn admin(&self) -> Identity {
        self.state.read().config.admin()
    }

    pub fn admin_config(&self) -> AdminConfig {
        self.state.read().config.clone()
    }

    pub fn trusted_validators(&self) -> Vec<Identity> {
        self.state.read().config.trusted_validators()
    }

    pub fn add_trusted_validator(
        &self,
        caller: Identity,
        validator: Identity,
    ) -> RegistryResult<()> {
        self.administer(|config| {
            config.add_trusted_validator(&caller, validator)?;
            Ok(RegistryEvent::TrustedValidatorAdded { validator })
        })
    }

    pub fn remove_trusted_validator(
        &self,
        caller: Identity,
        validator: Identity,
    ) -> RegistryResult<()> {
        self.administer(|config| {
            config.remove_trusted_validator(&caller, &validator)?;
            Ok(RegistryEvent::TrustedValidatorRemoved { validator })
        })
    }

    pub fn set_min_feedback_clock(
        &self,
        caller: Identity,
        threshold: Timestamp,
    ) -> RegistryResult<()> {
        self.administer(|config| {
            config.set_min_feedback_clock(&caller, threshold)?;
            Ok(RegistryEvent::MinFeedbackClockSet { threshold })
        })
    }

    pub fn set_max_responders(&self, caller: Identity, cap: usize) -> RegistryResult<()> {
        self.administer(|config| {
            config.set_max_responders(&caller, cap)?;
            Ok(RegistryEvent::MaxRespondersSet { cap })
        })
    }

    pub fn transfer_admin(&self, caller: Identity, new_admin: Identity) -> RegistryResult<()> {
        self.administer(|config| {
            config.transfer_admin(&caller, new_admin)?;
            Ok(RegistryEvent::AdminTransferred {
                from: caller,
                to: new_admin,
            })
        })
    }

    fn administer<F>(&self, change: F) -> RegistryResult<()>
    where
        F: FnOnce(&mut AdminConfig) -> RegistryResult<RegistryEvent>,
    {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let event = change(&mut state.config)?;
        info!(event = ?event, "Registry settings changed");
        state.journal.record(state.clock, event);
        Ok(())
    }

    // Journal

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state.read().journal.entries().to_vec()
    }

    /// Entries with a sequence number greater than `seq`.
    pub fn journal_since(&self, seq: u64) -> Vec<JournalEntry> {
        self.state.read().journal.since(seq).to_vec()
    }

    /// Entries concerning one agent, in journal order.
    pub fn agent_journal(&self, agent_id: AgentId) -> Vec<JournalEntry> {
        self.state
            .read()
            .journal
            .entries()
            .iter()
            .filter(|entry| entry.event.agent_id() == Some(agent_id))
            .cloned()
            .collect()
    }

    pub fn journal_len(&self) -> usize {
        self.state.read().journal.len()
    }

    pub fn export_journal_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self.state.read().journal.entries())
    }
}
