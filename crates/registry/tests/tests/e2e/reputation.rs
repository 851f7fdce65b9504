//! E2E: clients rate an agent, revoke, and third parties respond.

use registry_service::{ErrorKind, FeedbackQuery, FeedbackSubmission, FeedbackSummary};
use registry_tests::*;

#[test]
fn summary_tracks_revocation() {
    let registry = registry_with_validators(&[]).unwrap();
    let alice = identity(1);
    let bob = identity(2);
    let charlie = identity(3);

    let agent = registry.register(alice, None, vec![]).unwrap();
    assert_eq!(
        registry
            .give_feedback(bob, FeedbackSubmission::new(agent, 80).with_tags("quality", ""))
            .unwrap(),
        1
    );
    assert_eq!(
        registry
            .give_feedback(charlie, FeedbackSubmission::new(agent, 90))
            .unwrap(),
        1
    );

    assert_eq!(
        registry.feedback_summary(agent, &[], "", ""),
        FeedbackSummary { count: 2, average_score: 85 }
    );

    registry.revoke_feedback(bob, agent, 1).unwrap();
    assert_eq!(
        registry.feedback_summary(agent, &[], "", ""),
        FeedbackSummary { count: 1, average_score: 90 }
    );

    let entry = registry.read_feedback(agent, &bob, 1).unwrap();
    assert!(entry.revoked);
    assert_eq!(entry.score, 80);
    assert_eq!(entry.tag1, "quality");
}

#[test]
fn listing_filters_and_orders_rows() {
    let registry = registry_with_validators(&[]).unwrap();
    let agent = registry.register(identity(1), None, vec![]).unwrap();
    let bob = identity(2);
    let carol = identity(3);

    registry
        .give_feedback(carol, FeedbackSubmission::new(agent, 70).with_tags("speed", "api"))
        .unwrap();
    registry
        .give_feedback(bob, FeedbackSubmission::new(agent, 60).with_tags("speed", "ui"))
        .unwrap();
    registry
        .give_feedback(carol, FeedbackSubmission::new(agent, 50).with_tags("cost", "api"))
        .unwrap();
    registry.revoke_feedback(carol, agent, 2).unwrap();

    let rows = registry.read_all_feedback(agent, &FeedbackQuery::all());
    let keys: Vec<_> = rows.iter().map(|r| (r.client, r.index)).collect();
    assert_eq!(keys, vec![(carol, 1), (bob, 1)]);

    let rows = registry.read_all_feedback(agent, &FeedbackQuery::all().including_revoked());
    let keys: Vec<_> = rows.iter().map(|r| (r.client, r.index)).collect();
    assert_eq!(keys, vec![(carol, 1), (carol, 2), (bob, 1)]);

    let query = FeedbackQuery {
        clients: vec![bob],
        tag1: "speed".to_string(),
        ..FeedbackQuery::all()
    };
    let rows = registry.read_all_feedback(agent, &query);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].score, 60);

    assert_eq!(
        registry.feedback_summary(agent, &[], "", "api"),
        FeedbackSummary { count: 1, average_score: 70 }
    );
    assert_eq!(registry.clients(agent), vec![carol, bob]);
    assert_eq!(registry.last_index(agent, &carol), 2);
}

#[test]
fn controller_responds_but_cannot_rate() {
    let registry = registry_with_validators(&[]).unwrap();
    let owner = identity(1);
    let client = identity(2);
    let agent = registry.register(owner, None, vec![]).unwrap();

    let err = registry
        .give_feedback(owner, FeedbackSubmission::new(agent, 100))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    registry
        .give_feedback(client, FeedbackSubmission::new(agent, 40))
        .unwrap();
    let count = registry
        .append_response(owner, agent, client, 1, "ipfs://rebuttal", hash(1))
        .unwrap();
    assert_eq!(count, 1);
    let count = registry
        .append_response(owner, agent, client, 1, "ipfs://follow-up", hash(2))
        .unwrap();
    assert_eq!(count, 2);

    assert_eq!(registry.responders(agent, &client, 1), vec![owner]);
    assert_eq!(registry.response_count(agent, &client, 1, &[]), 2);
    assert_eq!(registry.response_count(agent, &client, 1, &[identity(9)]), 0);
}

#[test]
fn responder_cap_admits_only_existing_responders() {
    let registry = registry_with_validators(&[]).unwrap();
    registry.set_max_responders(ADMIN, 2).unwrap();
    let agent = registry.register(identity(1), None, vec![]).unwrap();
    let client = identity(2);
    registry
        .give_feedback(client, FeedbackSubmission::new(agent, 75))
        .unwrap();

    for responder in [10, 11] {
        registry
            .append_response(identity(responder), agent, client, 1, "ipfs://r", hash(0))
            .unwrap();
    }
    let err = registry
        .append_response(identity(12), agent, client, 1, "ipfs://r", hash(0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);

    registry
        .append_response(identity(10), agent, client, 1, "ipfs://r", hash(0))
        .unwrap();
    assert_eq!(registry.responders(agent, &client, 1).len(), 2);
    assert_eq!(registry.response_count(agent, &client, 1, &[]), 3);
}

#[test]
fn response_rejections() {
    let registry = registry_with_validators(&[]).unwrap();
    let agent = registry.register(identity(1), None, vec![]).unwrap();
    let client = identity(2);
    registry
        .give_feedback(client, FeedbackSubmission::new(agent, 75))
        .unwrap();

    let kind = |index: u64, uri: &str| {
        registry
            .append_response(identity(9), agent, client, index, uri, hash(0))
            .map_err(|err| err.kind())
    };
    assert_eq!(kind(0, "ipfs://r"), Err(ErrorKind::OutOfRange));
    assert_eq!(kind(2, "ipfs://r"), Err(ErrorKind::OutOfRange));
    assert_eq!(kind(1, ""), Err(ErrorKind::InvalidInput));

    registry.revoke_feedback(client, agent, 1).unwrap();
    assert_eq!(kind(1, "ipfs://r"), Err(ErrorKind::AlreadyDone));
}

#[test]
fn feedback_gate_opens_after_threshold() {
    let registry = registry_with_validators(&[]).unwrap();
    let agent = registry.register(identity(1), None, vec![]).unwrap();
    registry.set_min_feedback_clock(ADMIN, registry.now().saturating_add(10)).unwrap();

    let err = registry
        .give_feedback(identity(2), FeedbackSubmission::new(agent, 50))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotYetValid);

    registry.advance_clock(10);
    assert!(registry
        .give_feedback(identity(2), FeedbackSubmission::new(agent, 50))
        .is_err());

    registry.advance_clock(1);
    assert_eq!(
        registry
            .give_feedback(identity(2), FeedbackSubmission::new(agent, 50))
            .unwrap(),
        1
    );
}
