//! Authority oracle: "does caller X hold authority over agent Y?"
//!
//! The feedback and validation ledgers consume this trait rather than the
//! identity store directly, so delegation semantics live in exactly one place.

use crate::error::{RegistryError, RegistryResult};
use crate::ids::{AgentId, Identity};

/// Read-only identity queries needed to authorize ledger mutations.
pub trait AuthorityOracle {
    /// Current controller, or `None` if the agent was never minted.
    fn controller_of(&self, agent_id: AgentId) -> Option<Identity>;

    /// Whether `operator` holds delegated-all authority over `controller`.
    fn has_delegated_all(&self, controller: &Identity, operator: &Identity) -> bool;

    /// Delegated-single authority for one agent, if any.
    fn single_delegate(&self, agent_id: AgentId) -> Option<Identity>;

    /// Resolve authority of `caller` over `agent_id`.
    ///
    /// Returns `NotFound` for an unminted agent. Succeeds with `true` iff the
    /// caller is the controller, a delegated-all operator of the controller,
    /// or the agent's delegated-single authority.
    fn is_authorized(&self, caller: &Identity, agent_id: AgentId) -> RegistryResult<bool> {
        let controller = self
            .controller_of(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))?;

        if *caller == controller || self.has_delegated_all(&controller, caller) {
            return Ok(true);
        }

        Ok(self
            .single_delegate(agent_id)
            .is_some_and(|delegate| delegate == *caller))
    }

    /// Like [`AuthorityOracle::is_authorized`] but fails with `Unauthorized`.
    fn authorize(&self, caller: &Identity, agent_id: AgentId) -> RegistryResult<()> {
        if self.is_authorized(caller, agent_id)? {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized(format!(
                "{} holds no authority over {}",
                caller.short_id(),
                agent_id
            )))
        }
    }

    fn exists(&self, agent_id: AgentId) -> bool {
        self.controller_of(agent_id).is_some()
    }
}
