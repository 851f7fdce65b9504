//! Property tests: per-client indices are gapless and averages truncate.

use proptest::prelude::*;
use registry_service::{FeedbackQuery, FeedbackSubmission, FeedbackSummary};
use registry_tests::*;

fn arb_submissions() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((2u8..6, 0u8..=100), 1..40)
}

proptest! {
    #[test]
    fn indices_are_gapless_per_client(submissions in arb_submissions()) {
        let registry = registry_with_validators(&[]).unwrap();
        let agent = registry.register(identity(1), None, vec![]).unwrap();

        for (client, score) in &submissions {
            let index = registry
                .give_feedback(identity(*client), FeedbackSubmission::new(agent, *score))
                .unwrap();
            prop_assert_eq!(index, registry.last_index(agent, &identity(*client)));
        }

        for client in 2u8..6 {
            let expected = submissions.iter().filter(|(c, _)| *c == client).count() as u64;
            prop_assert_eq!(registry.last_index(agent, &identity(client)), expected);
        }
        let rows = registry.read_all_feedback(agent, &FeedbackQuery::all());
        prop_assert_eq!(rows.len(), submissions.len());
    }

    #[test]
    fn summary_is_floor_of_mean_over_unrevoked(
        submissions in arb_submissions(),
        revoke_first in any::<bool>(),
    ) {
        let registry = registry_with_validators(&[]).unwrap();
        let agent = registry.register(identity(1), None, vec![]).unwrap();
        for (client, score) in &submissions {
            registry
                .give_feedback(identity(*client), FeedbackSubmission::new(agent, *score))
                .unwrap();
        }

        let mut kept: Vec<u64> = submissions.iter().map(|(_, s)| u64::from(*s)).collect();
        if revoke_first {
            registry.revoke_feedback(identity(submissions[0].0), agent, 1).unwrap();
            kept.remove(0);
        }

        let expected = if kept.is_empty() {
            FeedbackSummary::default()
        } else {
            FeedbackSummary {
                count: kept.len() as u64,
                average_score: (kept.iter().sum::<u64>() / kept.len() as u64) as u8,
            }
        };
        prop_assert_eq!(registry.feedback_summary(agent, &[], "", ""), expected);
    }
}
