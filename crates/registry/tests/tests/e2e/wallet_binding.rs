//! E2E: binding a verified wallet with a deadline-bound proof.

use registry_service::{ErrorKind, Identity, SignatureValidator, Timestamp, WALLET_METADATA_KEY};
use registry_tests::*;
use std::sync::Arc;

struct Multisig {
    approval: Vec<u8>,
}

impl SignatureValidator for Multisig {
    fn is_valid_signature(&self, _digest: &[u8; 32], proof: &[u8]) -> bool {
        proof == self.approval.as_slice()
    }
}

#[test]
fn key_wallet_binds_with_signature() {
    let registry = registry_with_validators(&[]).unwrap();
    let owner = identity(1);
    let agent = registry.register(owner, None, vec![]).unwrap();
    let wallet = KeyWallet::from_seed([42u8; 32]);

    registry.advance_clock(100);
    wallet.bind(&registry, agent, Timestamp(200)).unwrap();

    assert_eq!(registry.verified_wallet(agent).unwrap(), Some(wallet.identity()));
    assert_eq!(
        registry.metadata(agent, WALLET_METADATA_KEY).unwrap(),
        wallet.identity().as_bytes().to_vec()
    );
}

#[test]
fn deadline_window_is_enforced() {
    let registry = registry_with_validators(&[]).unwrap();
    let agent = registry.register(identity(1), None, vec![]).unwrap();
    let wallet = KeyWallet::from_seed(rand::random());
    registry.set_clock(Timestamp(1_000)).unwrap();

    let err = wallet.bind(&registry, agent, Timestamp(999)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Expired);
    let err = wallet.bind(&registry, agent, Timestamp(1_301)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotYetValid);

    wallet.bind(&registry, agent, Timestamp(1_000)).unwrap();
    wallet.bind(&registry, agent, Timestamp(1_300)).unwrap();
}

#[test]
fn proof_is_bound_to_controller() {
    let registry = registry_with_validators(&[]).unwrap();
    let owner = identity(1);
    let agent = registry.register(owner, None, vec![]).unwrap();
    let wallet = KeyWallet::from_seed([7u8; 32]);

    let proof = wallet.prove(agent, identity(9), Timestamp(10));
    let err = registry
        .verify_and_set_wallet(owner, agent, wallet.identity(), Timestamp(10), &proof)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(registry.verified_wallet(agent).unwrap(), Some(owner));
}

#[test]
fn programmable_account_validates_its_own_proof() {
    let registry = registry_with_validators(&[]).unwrap();
    let owner = identity(1);
    let agent = registry.register(owner, None, vec![]).unwrap();
    let account = Identity::from_bytes([0x5a; 32]);
    assert!(!registry.is_programmable(&account));
    registry
        .register_programmable_account(
            account,
            Arc::new(Multisig {
                approval: b"2-of-3".to_vec(),
            }),
        )
        .unwrap();
    assert!(registry.is_programmable(&account));

    let err = registry
        .verify_and_set_wallet(owner, agent, account, Timestamp(5), b"1-of-3")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    registry
        .verify_and_set_wallet(owner, agent, account, Timestamp(5), b"2-of-3")
        .unwrap();
    assert_eq!(registry.verified_wallet(agent).unwrap(), Some(account));
}

#[test]
fn self_transfer_keeps_wallet_but_sale_clears_it() {
    let registry = registry_with_validators(&[]).unwrap();
    let owner = identity(1);
    let agent = registry.register(owner, None, vec![]).unwrap();
    let wallet = KeyWallet::from_seed([3u8; 32]);
    wallet.bind(&registry, agent, Timestamp(10)).unwrap();

    registry.transfer(owner, agent, owner).unwrap();
    assert_eq!(registry.verified_wallet(agent).unwrap(), Some(wallet.identity()));

    registry.transfer(owner, agent, identity(2)).unwrap();
    assert_eq!(registry.verified_wallet(agent).unwrap(), None);
}
