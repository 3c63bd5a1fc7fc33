//! `approve_operator` / `set_operator_approval` / `terminate_operator` (§4.C, §6).

mod helpers;

use helpers::Scenario;
use rail_ledger::{Address, LedgerError};
use test_case::test_case;

#[test]
fn approve_operator_sets_flag_and_allowances() {
    let mut s = Scenario::new();
    let payer = Address::new_unique();
    let operator = Address::new_unique();

    s.approve_operator(payer, operator, 10, 1000);
    let approval = s.approval(payer, operator);
    assert!(approval.is_approved);
    assert_eq!(approval.rate_allowance, 10);
    assert_eq!(approval.lockup_allowance, 1000);
}

#[test]
fn terminate_operator_zeros_allowances_but_spares_existing_rails() {
    let mut s = Scenario::new();
    let payer = Address::new_unique();
    let payee = Address::new_unique();
    let operator = Address::new_unique();

    s.deposit(payer, 1000).unwrap();
    s.approve_operator(payer, operator, 10, 1000);
    let rail = s.create_rail(operator, payer, payee).unwrap();
    s.modify_rail_lockup(rail, operator, 10, 0).unwrap();
    s.modify_rail_payment(rail, operator, 5, 0).unwrap();

    s.ledger.terminate_operator(s.token, operator, payer).unwrap();
    let approval = s.approval(payer, operator);
    assert!(!approval.is_approved);
    assert_eq!(approval.rate_allowance, 0);
    assert_eq!(approval.lockup_allowance, 0);

    // The rail created under the old approval is untouched; it keeps
    // settling at its recorded rate.
    let rail_state = s.rail(rail);
    assert_eq!(rail_state.payment_rate, 5);
    assert!(rail_state.is_active);
}

#[test]
fn create_rail_without_approval_is_rejected() {
    let mut s = Scenario::new();
    let payer = Address::new_unique();
    let payee = Address::new_unique();
    let operator = Address::new_unique();

    let err = s.create_rail(operator, payer, payee).unwrap_err();
    assert_eq!(err, LedgerError::OperatorNotApproved);
}

#[test_case(10, 3, 2, true; "decrease below a stale usage is admitted")]
#[test_case(10, 20, 25, false; "increase beyond allowance is rejected")]
fn allowance_admit_or_reject_on_rate_change(
    initial_allowance: u128,
    updated_allowance: u128,
    new_rate: u128,
    should_succeed: bool,
) {
    let mut s = Scenario::new();
    let payer = Address::new_unique();
    let payee = Address::new_unique();
    let operator = Address::new_unique();

    s.deposit(payer, 10_000).unwrap();
    s.approve_operator(payer, operator, initial_allowance, 10_000);
    let rail = s.create_rail(operator, payer, payee).unwrap();
    s.modify_rail_lockup(rail, operator, 5, 0).unwrap();
    s.modify_rail_payment(rail, operator, 10, 0).unwrap();

    s.ledger
        .set_operator_approval(s.token, operator, true, updated_allowance, 10_000, payer);

    let result = s.modify_rail_payment(rail, operator, new_rate, 0);
    assert_eq!(result.is_ok(), should_succeed);
    if !should_succeed {
        assert_eq!(result.unwrap_err(), LedgerError::AllowanceExceeded);
    }
}

#[test]
fn allowance_decrease_saturates_usage_to_zero_not_negative() {
    let mut s = Scenario::new();
    let payer = Address::new_unique();
    let payee = Address::new_unique();
    let operator = Address::new_unique();

    s.deposit(payer, 10_000).unwrap();
    s.approve_operator(payer, operator, 10, 10_000);
    let rail = s.create_rail(operator, payer, payee).unwrap();
    s.modify_rail_lockup(rail, operator, 5, 0).unwrap();
    s.modify_rail_payment(rail, operator, 10, 0).unwrap();
    assert_eq!(s.approval(payer, operator).rate_usage, 10);

    s.ledger.set_operator_approval(s.token, operator, true, 3, 10_000, payer);
    s.modify_rail_payment(rail, operator, 2, 0).unwrap();
    assert_eq!(s.approval(payer, operator).rate_usage, 2);
}
