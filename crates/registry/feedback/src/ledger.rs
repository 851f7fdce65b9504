//! Feedback ledger.
//!
//! Entries are scoped per (agent, client): indices start at 1 and grow by one
//! per accepted submission, so two clients can never collide. Third-party
//! responses are bounded by the administrator's responder cap.

use registry_types::{
    truncating_average, AdminConfig, AgentId, AppendLog, AuthorityOracle, EventJournal, Hash32,
    Identity, RegistryError, RegistryEvent, RegistryResult, Timestamp, MAX_SCORE,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::entry::{FeedbackEntry, FeedbackQuery, FeedbackSubmission, FeedbackSummary, FeedbackView};

#[derive(Debug, Default)]
struct AgentFeedback {
    clients: AppendLog<Identity>,
    entries: HashMap<Identity, Vec<FeedbackEntry>>,
}

impl AgentFeedback {
    fn entries_of(&self, client: &Identity) -> &[FeedbackEntry] {
        self.entries.get(client).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct EntryKey {
    agent_id: AgentId,
    client: Identity,
    index: u64,
}

#[derive(Debug, Default)]
struct ResponseRecord {
    responders: AppendLog<Identity>,
    counts: HashMap<Identity, u64>,
}

#[derive(Debug, Default)]
pub struct FeedbackLedger {
    agents: HashMap<AgentId, AgentFeedback>,
    responses: HashMap<EntryKey, ResponseRecord>,
}

impl FeedbackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record feedback from `caller`. Returns the per-(agent, caller) index.
    ///
    /// The agent's controller and its delegates may never rate it.
    pub fn give_feedback(
        &mut self,
        oracle: &dyn AuthorityOracle,
        config: &AdminConfig,
        caller: Identity,
        submission: FeedbackSubmission,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<u64> {
        let agent_id = submission.agent_id;
        let self_feedback = oracle.is_authorized(&caller, agent_id)?;

        if submission.score > MAX_SCORE {
            return Err(RegistryError::InvalidInput(format!(
                "score {} exceeds {}",
                submission.score, MAX_SCORE
            )));
        }
        if self_feedback {
            warn!(agent = %agent_id, caller = %caller.short_id(), "Self-feedback rejected");
            return Err(RegistryError::Unauthorized(format!(
                "{} holds authority over {} and cannot rate it",
                caller.short_id(),
                agent_id
            )));
        }
        if !config.feedback_open_at(now) {
            return Err(RegistryError::NotYetValid(format!(
                "feedback opens after {}, clock is {}",
                config.min_feedback_clock(),
                now
            )));
        }

        let agent = self.agents.entry(agent_id).or_default();
        agent.clients.insert(caller);
        let entries = agent.entries.entry(caller).or_default();
        let index = entries.len() as u64 + 1;

        let FeedbackSubmission {
            score,
            tag1,
            tag2,
            endpoint,
            payload_uri,
            payload_hash,
            ..
        } = submission;

        journal.record(
            now,
            RegistryEvent::NewFeedback {
                agent_id,
                client: caller,
                index,
                score,
                tag1: tag1.clone(),
                tag2: tag2.clone(),
                endpoint: endpoint.clone(),
                payload_uri: payload_uri.clone(),
                payload_hash,
            },
        );
        entries.push(FeedbackEntry {
            agent_id,
            client: caller,
            index,
            score,
            tag1,
            tag2,
            endpoint,
            payload_uri,
            payload_hash,
            revoked: false,
            submitted_at: now,
        });

        info!(agent = %agent_id, client = %caller.short_id(), index, score, "Feedback recorded");
        Ok(index)
    }

    /// Revoke the caller's own entry. Lookup is scoped to the caller, so
    /// someone else's index is simply out of range.
    pub fn revoke_feedback(
        &mut self,
        caller: Identity,
        agent_id: AgentId,
        index: u64,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<()> {
        let entry = self.entry_mut(agent_id, &caller, index)?;
        if entry.revoked {
            return Err(RegistryError::AlreadyDone(format!(
                "feedback {} of {} on {} is already revoked",
                index,
                caller.short_id(),
                agent_id
            )));
        }
        entry.revoked = true;

        journal.record(
            now,
            RegistryEvent::FeedbackRevoked {
                agent_id,
                client: caller,
                index,
            },
        );
        info!(agent = %agent_id, client = %caller.short_id(), index, "Feedback revoked");
        Ok(())
    }

    /// Attach a response to an entry. Anyone may respond; distinct responders
    /// per entry are capped, repeat responses from admitted responders are not.
    #[allow(clippy::too_many_arguments)]
    pub fn append_response(
        &mut self,
        config: &AdminConfig,
        caller: Identity,
        agent_id: AgentId,
        client: Identity,
        index: u64,
        response_uri: String,
        response_hash: Hash32,
        now: Timestamp,
        journal: &mut EventJournal,
    ) -> RegistryResult<u64> {
        let entry = self.entry_ref(agent_id, &client, index)?;
        if entry.revoked {
            return Err(RegistryError::AlreadyDone(format!(
                "feedback {} of {} on {} is revoked",
                index,
                client.short_id(),
                agent_id
            )));
        }
        if response_uri.is_empty() {
            return Err(RegistryError::InvalidInput(
                "response uri must not be empty".to_string(),
            ));
        }

        let key = EntryKey {
            agent_id,
            client,
            index,
        };
        let cap = config.max_responders();
        if let Some(record) = self.responses.get(&key) {
            if !record.responders.contains(&caller) && record.responders.len() >= cap {
                warn!(agent = %agent_id, index, cap, "Responder cap reached");
                return Err(RegistryError::CapacityExceeded(format!(
                    "feedback {} on {} already has {} responders",
                    index, agent_id, cap
                )));
            }
        }

        let record = self.responses.entry(key).or_default();
        record.responders.insert(caller);
        let count = record.counts.entry(caller).or_insert(0);
        *count += 1;
        let count = *count;

        journal.record(
            now,
            RegistryEvent::ResponseAppended {
                agent_id,
                client,
                index,
                responder: caller,
                response_uri,
                response_hash,
            },
        );
        debug!(
            agent = %agent_id,
            index,
            responder = %caller.short_id(),
            count,
            "Response appended"
        );
        Ok(count)
    }

    /// Count and truncating average of non-revoked entries matching the filters.
    pub fn summary(
        &self,
        agent_id: AgentId,
        clients: &[Identity],
        tag1: &str,
        tag2: &str,
    ) -> FeedbackSummary {
        let (count, total) = self
            .matching(agent_id, clients, tag1, tag2, false)
            .fold((0u64, 0u64), |(count, total), entry| {
                (count + 1, total + u64::from(entry.score))
            });

        FeedbackSummary {
            count,
            average_score: truncating_average(total, count),
        }
    }

    /// Matching entries in client-then-index order.
    pub fn read_all(&self, agent_id: AgentId, query: &FeedbackQuery) -> Vec<FeedbackView> {
        self.matching(
            agent_id,
            &query.clients,
            &query.tag1,
            &query.tag2,
            query.include_revoked,
        )
        .map(FeedbackEntry::view)
        .collect()
    }

    pub fn read_feedback(
        &self,
        agent_id: AgentId,
        client: &Identity,
        index: u64,
    ) -> RegistryResult<FeedbackEntry> {
        self.entry_ref(agent_id, client, index).cloned()
    }

    /// Every client that ever rated the agent, in first-submission order.
    pub fn clients(&self, agent_id: AgentId) -> Vec<Identity> {
        self.agents
            .get(&agent_id)
            .map(|agent| agent.clients.to_vec())
            .unwrap_or_default()
    }

    /// Highest index assigned to `client` for the agent; 0 if none.
    pub fn last_index(&self, agent_id: AgentId, client: &Identity) -> u64 {
        self.agents
            .get(&agent_id)
            .map(|agent| agent.entries_of(client).len() as u64)
            .unwrap_or(0)
    }

    /// Total responses on an entry, restricted to `responders` when non-empty.
    pub fn response_count(
        &self,
        agent_id: AgentId,
        client: &Identity,
        index: u64,
        responders: &[Identity],
    ) -> u64 {
        let key = EntryKey {
            agent_id,
            client: *client,
            index,
        };
        let Some(record) = self.responses.get(&key) else {
            return 0;
        };

        if responders.is_empty() {
            record.counts.values().sum()
        } else {
            responders
                .iter()
                .filter_map(|responder| record.counts.get(responder))
                .sum()
        }
    }

    /// Distinct responders on an entry, in admission order.
    pub fn responders(&self, agent_id: AgentId, client: &Identity, index: u64) -> Vec<Identity> {
        let key = EntryKey {
            agent_id,
            client: *client,
            index,
        };
        self.responses
            .get(&key)
            .map(|record| record.responders.to_vec())
            .unwrap_or_default()
    }

    fn matching<'a>(
        &'a self,
        agent_id: AgentId,
        clients: &'a [Identity],
        tag1: &'a str,
        tag2: &'a str,
        include_revoked: bool,
    ) -> impl Iterator<Item = &'a FeedbackEntry> + 'a {
        let agent = self.agents.get(&agent_id);
        let scan: Vec<Identity> = match agent {
            Some(_) if !clients.is_empty() => clients.to_vec(),
            Some(agent) => agent.clients.to_vec(),
            None => Vec::new(),
        };

        scan.into_iter()
            .flat_map(move |client| {
                agent
                    .map(|agent| agent.entries_of(&client))
                    .unwrap_or(&[])
                    .iter()
            })
            .filter(move |entry| include_revoked || !entry.revoked)
            .filter(move |entry| entry.matches_tags(tag1, tag2))
    }

    fn entry_ref(
        &self,
        agent_id: AgentId,
        client: &Identity,
        index: u64,
    ) -> RegistryResult<&FeedbackEntry> {
        let entries = self
            .agents
            .get(&agent_id)
            .map(|agent| agent.entries_of(client))
            .unwrap_or(&[]);
        slot(entries, index)
            .map(|slot| &entries[slot])
            .ok_or_else(|| out_of_range(agent_id, client, index))
    }

    fn entry_mut(
        &mut self,
        agent_id: AgentId,
        client: &Identity,
        index: u64,
    ) -> RegistryResult<&mut FeedbackEntry> {
        let entries = self
            .agents
            .get_mut(&agent_id)
            .and_then(|agent| agent.entries.get_mut(client));
        match entries {
            Some(entries) => match slot(entries, index) {
                Some(slot) => Ok(&mut entries[slot]),
                None => Err(out_of_range(agent_id, client, index)),
            },
            None => Err(out_of_range(agent_id, client, index)),
        }
    }
}

/// Vector position for a 1-based feedback index.
fn slot(entries: &[FeedbackEntry], index: u64) -> Option<usize> {
    if index == 0 || index > entries.len() as u64 {
        None
    } else {
        Some((index - 1) as usize)
    }
}

fn out_of_range(agent_id: AgentId, client: &Identity, index: u64) -> RegistryError {
    RegistryError::OutOfRange(format!(
        "no feedback {} from {} on {}",
        index,
        client.short_id(),
        agent_id
    ))
}
