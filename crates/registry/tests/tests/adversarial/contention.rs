//! Adversarial: many threads racing on one registry.

use registry_service::{ErrorKind, FeedbackSubmission, ValidationRequest, ValidationResponse};
use registry_tests::*;
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_mints_get_distinct_ids() {
    let registry = Arc::new(registry_with_validators(&[]).unwrap());

    let handles: Vec<_> = (0..8u8)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..25)
                    .map(|_| registry.register(identity(n + 1), None, vec![]).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .map(|id| id.value())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..200).collect::<Vec<_>>());
    assert_eq!(registry.journal_len(), 200);
}

#[test]
fn concurrent_feedback_keeps_indices_gapless() {
    let registry = Arc::new(registry_with_validators(&[]).unwrap());
    let agent = registry.register(identity(1), None, vec![]).unwrap();
    let client = identity(2);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..10 {
                    registry
                        .give_feedback(client, FeedbackSubmission::new(agent, 50))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.last_index(agent, &client), 40);
    assert_eq!(registry.clients(agent), vec![client]);
    let seqs: Vec<_> = registry.journal().iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (1..=41).collect::<Vec<_>>());
}

#[test]
fn racing_responses_commit_exactly_once() {
    let validator = identity(50);
    let registry = Arc::new(registry_with_validators(&[validator]).unwrap());
    let owner = identity(1);
    let agent = registry.register(owner, None, vec![]).unwrap();
    registry
        .validation_request(
            owner,
            ValidationRequest {
                validator,
                agent_id: agent,
                request_uri: "ipfs://r".to_string(),
                request_hash: hash(1),
            },
        )
        .unwrap();

    let handles: Vec<_> = (0..6u8)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let response = ValidationResponse::new(n * 10);
                registry.validation_response(validator, agent, hash(1), response)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|err| err.kind() == ErrorKind::AlreadyDone));
    assert!(registry.validation_status(agent, hash(1)).unwrap().has_responded());
}

#[test]
fn responder_cap_holds_under_contention() {
    let registry = Arc::new(registry_with_validators(&[]).unwrap());
    registry.set_max_responders(ADMIN, 3).unwrap();
    let agent = registry.register(identity(1), None, vec![]).unwrap();
    let client = identity(2);
    registry
        .give_feedback(client, FeedbackSubmission::new(agent, 60))
        .unwrap();

    let handles: Vec<_> = (10..20u8)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry
                    .append_response(identity(n), agent, client, 1, "ipfs://r", hash(n))
                    .map_err(|err| err.kind())
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    assert_eq!(registry.responders(agent, &client, 1).len(), 3);
}
