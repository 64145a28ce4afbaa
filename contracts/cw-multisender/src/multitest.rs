use assert_matches::assert_matches;
use cosmwasm_std::Uint256;

use crate::error::ContractError;

use self::suite::{SuiteBuilder, COIN};


const AMOUNTS: [u128; 3] = [1_050_000_000, 1_050_000_000, 3_050_000_000];

#[test]
fn send_exact_value() {
    let mut suite = SuiteBuilder::new().with_funds("owner", 100 * COIN).build();
    let owner = suite.owner.clone();
    let total: u128 = AMOUNTS.iter().sum();
    let value = total + 3 * suite.reserve;

    let transfers = suite.transfers(&AMOUNTS);
    suite.send(&owner, 1, total, transfers, value).unwrap();

    for (i, amount) in AMOUNTS.iter().enumerate() {
        let recipient = suite.addr(&format!("recipient{}", i));
        assert_eq!(*amount, suite.balance(&recipient));
    }
    assert_eq!(100 * COIN - value, suite.balance(&owner));
    assert_eq!(3 * suite.reserve, suite.contract_balance());
    assert_eq!(Uint256::one(), suite.counter().unwrap());
}

#[test]
fn excess_is_refunded() {
    let mut suite = SuiteBuilder::new().with_funds("owner", 100 * COIN).build();
    let owner = suite.owner.clone();
    let total: u128 = AMOUNTS.iter().sum();
    let value = total + 3 * suite.reserve + 2 * COIN;

    let transfers = suite.transfers(&AMOUNTS);
    let res = suite.send(&owner, 7, total, transfers, value).unwrap();

    let wasm = res.events.iter().find(|ev| ev.ty == "wasm").unwrap();
    let refunded = wasm
        .attributes
        .iter()
        .find(|attr| attr.key == "refunded")
        .unwrap();
    assert_eq!("true", refunded.value);

    // only amounts and reserves leave the sender
    assert_eq!(
        100 * COIN - total - 3 * suite.reserve,
        suite.balance(&owner)
    );
    assert_eq!(3 * suite.reserve, suite.contract_balance());
}

#[test]
fn excess_is_kept_when_policy_off() {
    let mut suite = SuiteBuilder::new()
        .with_send_excesses_to_sender(0)
        .with_funds("sender", 100 * COIN)
        .build();
    let sender = suite.addr("sender");
    let total: u128 = AMOUNTS.iter().sum();
    let value = total + 3 * suite.reserve + 2 * COIN;

    let transfers = suite.transfers(&AMOUNTS);
    suite.send(&sender, 1, total, transfers, value).unwrap();

    assert_eq!(100 * COIN - value, suite.balance(&sender));
    assert_eq!(3 * suite.reserve + 2 * COIN, suite.contract_balance());
}

#[test]
fn anyone_can_send() {
    let mut suite = SuiteBuilder::new().with_funds("sender", 10 * COIN).build();
    let sender = suite.addr("sender");

    let transfers = suite.transfers(&[COIN]);
    suite
        .send(&sender, 1, COIN, transfers, COIN + suite.reserve)
        .unwrap();

    assert_eq!(COIN, suite.balance(&suite.addr("recipient0")));
    assert_eq!(9 * COIN - suite.reserve, suite.balance(&sender));
}

#[test]
fn counter_counts_batches() {
    let mut suite = SuiteBuilder::new().with_funds("owner", 100 * COIN).build();
    let owner = suite.owner.clone();

    for query_id in 0..3 {
        let transfers = suite.transfers(&[COIN, COIN]);
        suite
            .send(&owner, query_id, 2 * COIN, transfers, 2 * COIN + 2 * suite.reserve)
            .unwrap();
    }
    assert_eq!(Uint256::from(3u8), suite.counter().unwrap());
}

#[test]
fn underfunded_batch_moves_nothing() {
    let mut suite = SuiteBuilder::new().with_funds("owner", 100 * COIN).build();
    let owner = suite.owner.clone();
    let total: u128 = AMOUNTS.iter().sum();

    // amounts are covered, the reserve of the last transfer is not
    let value = total + 2 * suite.reserve;
    let transfers = suite.transfers(&AMOUNTS);
    let err = suite
        .send(&owner, 1, total, transfers, value)
        .unwrap_err();

    assert_matches!(
        err.downcast::<ContractError>().unwrap(),
        ContractError::InsufficientFunds { .. }
    );
    assert_eq!(100 * COIN, suite.balance(&owner));
    assert_eq!(0, suite.balance(&suite.addr("recipient0")));
    assert_eq!(0, suite.contract_balance());
    assert_eq!(Uint256::zero(), suite.counter().unwrap());
}

#[test]
fn zero_amount_transfer_keeps_reserve() {
    let mut suite = SuiteBuilder::new().with_funds("owner", 10 * COIN).build();
    let owner = suite.owner.clone();

    let transfers = suite.transfers(&[COIN, 0]);
    suite
        .send(&owner, 1, COIN, transfers, COIN + 2 * suite.reserve)
        .unwrap();

    assert_eq!(COIN, suite.balance(&suite.addr("recipient0")));
    assert_eq!(0, suite.balance(&suite.addr("recipient1")));
    assert_eq!(2 * suite.reserve, suite.contract_balance());
    assert_eq!(Uint256::one(), suite.counter().unwrap());
}

#[test]
fn custom_forward_reserve() {
    let mut suite = SuiteBuilder::new()
        .with_forward_reserve(1_000)
        .with_funds("owner", 10 * COIN)
        .build();
    let owner = suite.owner.clone();

    let transfers = suite.transfers(&[COIN, COIN]);
    suite
        .send(&owner, 1, 2 * COIN, transfers, 2 * COIN + 2_000)
        .unwrap();

    assert_eq!(2_000, suite.contract_balance());
    assert_eq!(8 * COIN - 2_000, suite.balance(&owner));
}

#[test]
fn admin_operations_require_owner() {
    let mut suite = SuiteBuilder::new().build();
    let stranger = suite.addr("stranger");

    let err = suite.change_owner(&stranger, &stranger).unwrap_err();
    assert_eq!(
        ContractError::Unauthorized {},
        err.downcast::<ContractError>().unwrap()
    );

    let err = suite
        .change_send_excesses_to_sender(&stranger, 0)
        .unwrap_err();
    assert_eq!(
        ContractError::Unauthorized {},
        err.downcast::<ContractError>().unwrap()
    );

    let err = suite.reset_counter(&stranger, 0).unwrap_err();
    assert_eq!(
        ContractError::Unauthorized {},
        err.downcast::<ContractError>().unwrap()
    );

    assert_eq!(suite.owner, suite.owner().unwrap());
    assert_eq!(1, suite.send_excesses_to_sender().unwrap());
}

#[test]
fn ownership_moves_with_change_owner() {
    let mut suite = SuiteBuilder::new().build();
    let owner = suite.owner.clone();
    let next = suite.addr("next-owner");

    suite.change_owner(&owner, &next).unwrap();
    assert_eq!(next, suite.owner().unwrap());

    let err = suite.reset_counter(&owner, 0).unwrap_err();
    assert_eq!(
        ContractError::Unauthorized {},
        err.downcast::<ContractError>().unwrap()
    );
    suite.reset_counter(&next, 0).unwrap();
}

#[test]
fn excess_policy_accepts_only_zero_or_one() {
    let mut suite = SuiteBuilder::new().build();
    let owner = suite.owner.clone();

    suite.change_send_excesses_to_sender(&owner, 0).unwrap();
    assert_eq!(0, suite.send_excesses_to_sender().unwrap());

    let err = suite
        .change_send_excesses_to_sender(&owner, 2)
        .unwrap_err();
    assert_eq!(
        ContractError::InvalidFlag { value: 2 },
        err.downcast::<ContractError>().unwrap()
    );
    assert_eq!(0, suite.send_excesses_to_sender().unwrap());
}

#[test]
fn reset_counter_ignores_value() {
    let mut suite = SuiteBuilder::new().with_funds("owner", 10 * COIN).build();
    let owner = suite.owner.clone();

    let transfers = suite.transfers(&[COIN]);
    suite
        .send(&owner, 1, COIN, transfers, COIN + suite.reserve)
        .unwrap();
    assert_eq!(Uint256::one(), suite.counter().unwrap());

    suite.reset_counter(&owner, 42).unwrap();
    assert_eq!(Uint256::zero(), suite.counter().unwrap());
}

#[test]
fn deploy_is_acknowledged() {
    let mut suite = SuiteBuilder::new().with_funds("owner", 10 * COIN).build();
    let owner = suite.owner.clone();

    suite.deploy(&owner, COIN).unwrap();
    suite.raw(&owner, vec![]).unwrap();

    assert_eq!(COIN, suite.contract_balance());
    assert_eq!(Uint256::zero(), suite.counter().unwrap());
    assert_eq!(Uint256::zero(), suite.id().unwrap());
}

#[test]
fn unknown_operation_is_rejected() {
    let mut suite = SuiteBuilder::new().build();
    let owner = suite.owner.clone();

    // opcode 9, query id 0
    let mut body = vec![0, 0, 0, 9];
    body.extend_from_slice(&[0; 8]);
    let err = suite.raw(&owner, body).unwrap_err();
    assert_eq!(
        ContractError::UnknownOperation { op: 9 },
        err.downcast::<ContractError>().unwrap()
    );
}

#[test]
fn missing_funds_are_rejected() {
    let mut suite = SuiteBuilder::new().with_funds("owner", 10 * COIN).build();
    let owner = suite.owner.clone();

    let transfers = suite.transfers(&[COIN]);
    let err = suite.send(&owner, 1, 0, transfers, 0).unwrap_err();
    assert_matches!(
        err.downcast::<ContractError>().unwrap(),
        ContractError::Payment(_)
    );
    assert_eq!(10 * COIN, suite.balance(&owner));
}

#[test]
fn truncated_admin_body_from_stranger_is_unauthorized() {
    let mut suite = SuiteBuilder::new().build();
    let stranger = suite.addr("stranger");

    // reset counter opcode without query id or value
    let err = suite.raw(&stranger, vec![0, 0, 0, 4]).unwrap_err();
    assert_eq!(
        ContractError::Unauthorized {},
        err.downcast::<ContractError>().unwrap()
    );
}
