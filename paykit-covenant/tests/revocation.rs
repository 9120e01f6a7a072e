//! Revocation and spender policy tests

use paykit_covenant::test_utils::{
    assert_continues, assert_rejected, payee_key, payer_key, public_key, revoke_tx, spend_tx,
    standard_params, stranger_key,
};
use paykit_covenant::{
    Amount, ContractParameters, ContractState, ContractStatus, Covenant, CovenantConfig,
    CovenantError, Destination, ErrorKind, PayeeIdentity, PayerIdentity, SpenderPolicy, Transition,
};

fn deploy(params: ContractParameters) -> (Covenant, ContractState) {
    Covenant::deploy(params, 100, CovenantConfig::default()).unwrap()
}

#[test]
fn payer_revokes_at_any_time() {
    let (c, s) = deploy(standard_params().with_expiration(150));
    for height in [100, 101, 150, 151, 10_000, u32::MAX] {
        let tx = revoke_tx(&c, &s, height, &payer_key());
        assert_eq!(c.evaluate(&s, &tx).unwrap(), Transition::Revoked);
    }
}

#[test]
fn revoke_requires_payer_signature() {
    let (c, s) = deploy(standard_params());
    for key in [payee_key(), stranger_key()] {
        let tx = revoke_tx(&c, &s, 101, &key);
        assert_rejected(c.evaluate(&s, &tx), ErrorKind::Authorization);
    }
}

#[test]
fn revoke_ignores_allowance_and_outputs() {
    let (c, s) = deploy(standard_params());
    // Spend the whole window first, then revoke with arbitrary outputs
    let tx = spend_tx(&c, &s, 101, Amount::from_sats(3000), &payee_key());
    let next = assert_continues(c.evaluate(&s, &tx));

    let tx = revoke_tx(&c, &next, 101, &payer_key());
    assert_eq!(c.evaluate(&next, &tx).unwrap(), Transition::Revoked);
}

#[test]
fn committed_payer_hash_admits_matching_key() {
    let payer = public_key(&payer_key());
    let params = ContractParameters {
        payer: PayerIdentity::Committed {
            key_hash: payer.key_hash(),
            destination: Destination::KeyHash([0x33; 32]),
        },
        ..standard_params()
    };
    let (c, s) = deploy(params);

    let tx = revoke_tx(&c, &s, 101, &payer_key());
    assert_eq!(tx.outputs[0].destination, Destination::KeyHash([0x33; 32]));
    assert_eq!(c.evaluate(&s, &tx).unwrap(), Transition::Revoked);

    let tx = revoke_tx(&c, &s, 101, &stranger_key());
    assert_rejected(c.evaluate(&s, &tx), ErrorKind::Authorization);
}

#[test]
fn revoked_instance_is_terminal() {
    let (c, s) = deploy(standard_params());
    let status = ContractStatus::Active(s)
        .apply(&c, &revoke_tx(&c, &s, 101, &payer_key()))
        .unwrap();
    assert_eq!(status, ContractStatus::Revoked);

    let spend = spend_tx(&c, &s, 102, Amount::from_sats(1000), &payee_key());
    assert_eq!(status.apply(&c, &spend).unwrap_err(), CovenantError::Revoked);
    let revoke = revoke_tx(&c, &s, 102, &payer_key());
    assert_eq!(status.apply(&c, &revoke).unwrap_err(), CovenantError::Revoked);
}

#[test]
fn restricted_spender_rejects_other_keys() {
    let (c, s) = deploy(standard_params());
    for key in [payer_key(), stranger_key()] {
        let tx = spend_tx(&c, &s, 101, Amount::from_sats(1000), &key);
        assert_rejected(c.evaluate(&s, &tx), ErrorKind::Authorization);
    }
}

#[test]
fn unrestricted_spender_still_pays_payee() {
    let payee = Destination::KeyHash([0x44; 32]);
    let params = ContractParameters {
        payee: PayeeIdentity::Destination(payee),
        spender: SpenderPolicy::SpenderUnrestricted,
        ..standard_params()
    };
    let (c, s) = deploy(params);

    let tx = spend_tx(&c, &s, 101, Amount::from_sats(1000), &stranger_key());
    assert_eq!(tx.outputs[0].destination, payee);
    assert_continues(c.evaluate(&s, &tx));
}

#[test]
fn restricted_policy_requires_payee_key() {
    let params = ContractParameters {
        payee: PayeeIdentity::Destination(Destination::KeyHash([0x44; 32])),
        spender: SpenderPolicy::SpenderMustBePayee,
        ..standard_params()
    };
    let err = Covenant::deploy(params, 100, CovenantConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameters);
}
