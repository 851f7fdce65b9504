//! Validation ledger.
//!
//! Each (agent, request hash) moves Unassigned -> Pending -> Responded. The
//! assigned validator answers exactly once; any repeat response fails.

use registry_types::{
    truncating_average, AdminConfig, AgentId, AppendLog, AuthorityOracle, EventJournal, Hash32,
    Identity, RegistryError, RegistryEvent, RegistryResult, Timestamp, MAX_SCORE,
};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::record::{
    ValidationKey, ValidationRecord, ValidationRequest, ValidationResponse, ValidationState,
    ValidationStatus, ValidationSummary,
};

#[derive(Debug, Default)]
pub struct ValidationLedger {
    records: HashMap<ValidationKey, ValidationRecord>,
    by_agent: HashMap<AgentId, AppendLog<Hash32>>,
    by_validator: HashMap<Identity, AppendLog<ValidationKey>>,
}

impl ValidationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a whitelisted validator to assess an agent the caller controls.
    pub fn validation_request(
        &mut self,
        oracle: &dyn AuthorityOracle,
        config: &AdminConfig,
        caller: Identity,
        request: ValidationRequest,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<ValidationKey> {
        let ValidationRequest {
            validator,
            agent_id,
            request_uri,
            request_hash,
        } = request;

        if validator.is_zero() {
            return Err(RegistryError::InvalidInput(
                "validator must not be the zero identity".to_string(),
            ));
        }
        if !config.is_trusted_validator(&validator) {
            warn!(validator = %validator.short_id(), "Request to untrusted validator rejected");
            return Err(RegistryError::Unauthorized(format!(
                "validator {} is not trusted",
                validator.short_id()
            )));
        }
        oracle.authorize(&caller, agent_id)?;
        let key = ValidationKey::new(agent_id, request_hash);
        if self.records.contains_key(&key) {
            return Err(RegistryError::AlreadyDone(format!(
                "request {} already exists for {}",
                request_hash, agent_id
            )));
        }

        journal.record(
            now,
            RegistryEvent::ValidationRequested {
                agent_id,
                requester: caller,
                validator,
                request_uri: request_uri.clone(),
                request_hash,
            },
        );
        self.records.insert(
            key,
            ValidationRecord {
                key,
                validator,
                requester: caller,
                request_uri,
                state: ValidationState::Pending,
                last_update: now,
            },
        );
        self.by_agent.entry(agent_id).or_default().insert(request_hash);
        self.by_validator.entry(validator).or_default().insert(key);

        info!(
            agent = %agent_id,
            validator = %validator.short_id(),
            request = %request_hash,
            "Validation requested"
        );
        Ok(key)
    }

    /// Record the assigned validator's single response.
    pub fn validation_response(
        &mut self,
        caller: Identity,
        agent_id: AgentId,
        request_hash: Hash32,
        response: ValidationResponse,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<()> {
        let key = ValidationKey::new(agent_id, request_hash);
        let record = self.records.get_mut(&key).ok_or_else(|| {
            RegistryError::NotFound(format!("request {} for {}", request_hash, agent_id))
        })?;

        if record.validator != caller {
            return Err(RegistryError::Unauthorized(format!(
                "{} is not the validator assigned to request {}",
                caller.short_id(),
                request_hash
            )));
        }
        if response.response > MAX_SCORE {
            return Err(RegistryError::InvalidInput(format!(
                "response {} exceeds {}",
                response.response, MAX_SCORE
            )));
        }
        if let ValidationState::Responded(_) = record.state {
            return Err(RegistryError::AlreadyDone(format!(
                "request {} for {} already has a response",
                request_hash, agent_id
            )));
        }

        journal.record(
            now,
            RegistryEvent::ValidationResponded {
                agent_id,
                validator: caller,
                request_hash,
                response: response.response,
                response_uri: response.response_uri.clone(),
                response_hash: response.response_hash,
                tag: response.tag.clone(),
            },
        );
        let score = response.response;
        record.state = ValidationState::Responded(response);
        record.last_update = now;

        info!(
            agent = %agent_id,
            request = %request_hash,
            response = score,
            "Validation responded"
        );
        Ok(())
    }

    pub fn status(
        &self,
        agent_id: AgentId,
        request_hash: Hash32,
    ) -> RegistryResult<ValidationStatus> {
        self.record(agent_id, request_hash).map(ValidationRecord::status)
    }

    pub fn record(
        &self,
        agent_id: AgentId,
        request_hash: Hash32,
    ) -> RegistryResult<&ValidationRecord> {
        self.records
            .get(&ValidationKey::new(agent_id, request_hash))
            .ok_or_else(|| {
                RegistryError::NotFound(format!("request {} for {}", request_hash, agent_id))
            })
    }

    /// Count and truncating average of responded records matching the filters.
    ///
    /// Linear in the agent's validations times the validator filter length.
    pub fn summary(
        &self,
        agent_id: AgentId,
        validators: &[Identity],
        tag: &str,
    ) -> ValidationSummary {
        let (count, total) = self
            .by_agent
            .get(&agent_id)
            .into_iter()
            .flat_map(|hashes| hashes.iter())
            .filter_map(|hash| self.records.get(&ValidationKey::new(agent_id, *hash)))
            .filter(|record| validators.is_empty() || validators.contains(&record.validator))
            .filter_map(ValidationRecord::outcome)
            .filter(|outcome| tag.is_empty() || outcome.tag == tag)
            .fold((0u64, 0u64), |(count, total), outcome| {
                (count + 1, total + u64::from(outcome.response))
            });

        ValidationSummary {
            count,
            average_response: truncating_average(total, count),
        }
    }

    /// Request hashes for an agent, in request order.
    pub fn agent_validations(&self, agent_id: AgentId) -> Vec<Hash32> {
        self.by_agent
            .get(&agent_id)
            .map(AppendLog::to_vec)
            .unwrap_or_default()
    }

    /// Every key assigned to a validator, in request order.
    pub fn validator_requests(&self, validator: &Identity) -> Vec<ValidationKey> {
        self.by_validator
            .get(validator)
            .map(AppendLog::to_vec)
            .unwrap_or_default()
    }
}
