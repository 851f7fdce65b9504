//! Administrator-owned registry settings.
//!
//! The trusted validator whitelist, the feedback clock gate and the responder
//! cap all live here, owned by one administrative principal. Setters only
//! store the value; the caller is responsible for journaling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::error::{RegistryError, RegistryResult};
use crate::ids::{Identity, Timestamp};

/// Default cap on distinct responders per feedback entry.
pub const DEFAULT_MAX_RESPONDERS: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminConfig {
    admin: Identity,
    trusted_validators: BTreeSet<Identity>,
    /// Feedback is accepted only once the clock has passed this value. Zero disables the gate.
    min_feedback_clock: Timestamp,
    max_responders: usize,
}

impl AdminConfig {
    pub fn new(admin: Identity) -> Self {
        Self {
            admin,
            trusted_validators: BTreeSet::new(),
            min_feedback_clock: Timestamp::GENESIS,
            max_responders: DEFAULT_MAX_RESPONDERS,
        }
    }

    pub fn admin(&self) -> Identity {
        self.admin
    }

    pub fn min_feedback_clock(&self) -> Timestamp {
        self.min_feedback_clock
    }

    pub fn max_responders(&self) -> usize {
        self.max_responders
    }

    pub fn is_trusted_validator(&self, validator: &Identity) -> bool {
        self.trusted_validators.contains(validator)
    }

    pub fn trusted_validators(&self) -> Vec<Identity> {
        self.trusted_validators.iter().copied().collect()
    }

    /// Whether the global feedback gate is open at `now`.
    pub fn feedback_open_at(&self, now: Timestamp) -> bool {
        self.min_feedback_clock == Timestamp::GENESIS || now > self.min_feedback_clock
    }

    pub fn ensure_admin(&self, caller: &Identity) -> RegistryResult<()> {
        if *caller == self.admin {
            Ok(())
        } else {
            warn!(caller = %caller.short_id(), "administrative call rejected");
            Err(RegistryError::Unauthorized(format!(
                "{} is not the registry administrator",
                caller.short_id()
            )))
        }
    }

    pub fn add_trusted_validator(
        &mut self,
        caller: &Identity,
        validator: Identity,
    ) -> RegistryResult<()> {
        self.ensure_admin(caller)?;
        if validator.is_zero() {
            return Err(RegistryError::InvalidInput(
                "validator must not be the zero identity".to_string(),
            ));
        }
        if self.trusted_validators.contains(&validator) {
            return Err(RegistryError::InvalidInput(format!(
                "validator {} is already trusted",
                validator.short_id()
            )));
        }
        self.trusted_validators.insert(validator);
        Ok(())
    }

    pub fn remove_trusted_validator(
        &mut self,
        caller: &Identity,
        validator: &Identity,
    ) -> RegistryResult<()> {
        self.ensure_admin(caller)?;
        if !self.trusted_validators.remove(validator) {
            return Err(RegistryError::NotFound(format!(
                "validator {} is not trusted",
                validator.short_id()
            )));
        }
        Ok(())
    }

    pub fn set_min_feedback_clock(
        &mut self,
        caller: &Identity,
        threshold: Timestamp,
    ) -> RegistryResult<()> {
        self.ensure_admin(caller)?;
        self.min_feedback_clock = threshold;
        Ok(())
    }

    pub fn set_max_responders(&mut self, caller: &Identity, cap: usize) -> RegistryResult<()> {
        self.ensure_admin(caller)?;
        if cap == 0 {
            return Err(RegistryError::InvalidInput(
                "responder cap must be at least 1".to_string(),
            ));
        }
        self.max_responders = cap;
        Ok(())
    }

    pub fn transfer_admin(&mut self, caller: &Identity, new_admin: Identity) -> RegistryResult<()> {
        self.ensure_admin(caller)?;
        if new_admin.is_zero() {
            return Err(RegistryError::InvalidInput(
                "administrator must not be the zero identity".to_string(),
            ));
        }
        self.admin = new_admin;
        Ok(())
    }
}
