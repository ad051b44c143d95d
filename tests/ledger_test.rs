use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use lenddesk_core::errors::Error;
use lenddesk_core::ledger::{
    LedgerServiceTrait, LedgerError, NewLedgerTransaction, TransactionType,
};
use lenddesk_core::loans::{LoanError, LoanServiceTrait, LoanUpdate, NewLoan};
use lenddesk_core::users::Role;

mod common;

fn new_transaction(
    loan_id: &str,
    transaction_type: TransactionType,
    amount: Decimal,
) -> NewLedgerTransaction {
    NewLedgerTransaction {
        loan_id: loan_id.to_string(),
        transaction_type,
        amount,
        description: None,
        bonus_percentage: None,
        transaction_date: Utc::now().naive_utc(),
    }
}

#[test]
fn bonus_and_withdrawal_update_balance_and_aggregates() {
    let ctx = common::setup();
    let user = common::create_user(&ctx, "alice@example.com", Role::User);
    let loans = common::loan_service(&ctx);
    let ledger = common::ledger_service(&ctx);

    let loan = loans
        .create_loan(NewLoan {
            user_id: user.id.clone(),
            principal_amount: dec!(10000),
            monthly_rate: dec!(0.01),
        })
        .unwrap();

    assert_eq!(loan.current_balance, dec!(10000));
    assert_eq!(loan.account_number.len(), 12);

    let mut bonus = new_transaction(&loan.id, TransactionType::Bonus, dec!(50));
    bonus.bonus_percentage = Some(dec!(0.005));
    ledger.add_transaction(bonus).unwrap();

    let after_bonus = loans.get_loan(&loan.id).unwrap();
    assert_eq!(after_bonus.current_balance, dec!(10050));
    assert_eq!(after_bonus.total_bonuses, dec!(50));

    ledger
        .add_transaction(new_transaction(
            &loan.id,
            TransactionType::Withdrawal,
            dec!(200),
        ))
        .unwrap();

    let after_withdrawal = loans.get_loan(&loan.id).unwrap();
    assert_eq!(after_withdrawal.current_balance, dec!(9850));
    assert_eq!(after_withdrawal.total_withdrawals, dec!(200));
    assert_eq!(after_withdrawal.total_bonuses, dec!(50));
}

#[test]
fn balance_is_derivable_from_the_transaction_history() {
    let ctx = common::setup();
    let user = common::create_user(&ctx, "derive@example.com", Role::User);
    let loans = common::loan_service(&ctx);
    let ledger = common::ledger_service(&ctx);

    let loan = loans
        .create_loan(NewLoan {
            user_id: user.id,
            principal_amount: dec!(2500.50),
            monthly_rate: dec!(0.015),
        })
        .unwrap();

    let amounts = [
        (TransactionType::MonthlyPayment, dec!(25.01)),
        (TransactionType::Bonus, dec!(12.5)),
        (TransactionType::Withdrawal, dec!(100)),
        (TransactionType::MonthlyPayment, dec!(25.01)),
    ];
    for (transaction_type, amount) in amounts {
        ledger
            .add_transaction(new_transaction(&loan.id, transaction_type, amount))
            .unwrap();
    }

    let replayed: Decimal = ledger
        .list_transactions(&loan.id, None)
        .unwrap()
        .iter()
        .map(|t| t.transaction_type.balance_delta(t.amount))
        .sum();

    let stored = loans.get_loan(&loan.id).unwrap();
    assert_eq!(stored.current_balance, loan.principal_amount + replayed);
    assert_eq!(stored.current_balance, dec!(2463.02));
}

#[test]
fn one_loan_per_user_is_enforced() {
    let ctx = common::setup();
    let user = common::create_user(&ctx, "bob@example.com", Role::User);
    let loans = common::loan_service(&ctx);

    let first = loans
        .create_loan(NewLoan {
            user_id: user.id.clone(),
            principal_amount: dec!(1000),
            monthly_rate: dec!(0.02),
        })
        .unwrap();

    let err = loans
        .create_loan(NewLoan {
            user_id: user.id.clone(),
            principal_amount: dec!(9999),
            monthly_rate: dec!(0.03),
        })
        .unwrap_err();
    assert!(matches!(err, Error::Loan(LoanError::DuplicateLoan(_))));

    // The existing loan is untouched
    let unchanged = loans.get_loan_by_user(&user.id).unwrap();
    assert_eq!(unchanged.id, first.id);
    assert_eq!(unchanged.principal_amount, dec!(1000));
    assert_eq!(unchanged.monthly_rate, dec!(0.02));
}

#[test]
fn transaction_validation_rejects_bad_input() {
    let ctx = common::setup();
    let user = common::create_user(&ctx, "carol@example.com", Role::User);
    let loans = common::loan_service(&ctx);
    let ledger = common::ledger_service(&ctx);

    let loan = loans
        .create_loan(NewLoan {
            user_id: user.id,
            principal_amount: dec!(500),
            monthly_rate: dec!(0),
        })
        .unwrap();

    let err = ledger
        .add_transaction(new_transaction(
            &loan.id,
            TransactionType::MonthlyPayment,
            dec!(0),
        ))
        .unwrap_err();
    assert!(matches!(err, Error::Ledger(LedgerError::InvalidData(_))));

    let mut payment = new_transaction(&loan.id, TransactionType::MonthlyPayment, dec!(5));
    payment.bonus_percentage = Some(dec!(0.005));
    let err = ledger.add_transaction(payment).unwrap_err();
    assert!(matches!(err, Error::Ledger(LedgerError::InvalidData(_))));

    let err = ledger
        .add_transaction(new_transaction(
            "no-such-loan",
            TransactionType::MonthlyPayment,
            dec!(5),
        ))
        .unwrap_err();
    assert!(matches!(err, Error::Ledger(LedgerError::NotFound(_))));
}

#[test]
fn withdrawal_cannot_drive_the_balance_negative() {
    let ctx = common::setup();
    let user = common::create_user(&ctx, "dave@example.com", Role::User);
    let loans = common::loan_service(&ctx);
    let ledger = common::ledger_service(&ctx);

    let loan = loans
        .create_loan(NewLoan {
            user_id: user.id,
            principal_amount: dec!(100),
            monthly_rate: dec!(0.01),
        })
        .unwrap();

    let err = ledger
        .add_transaction(new_transaction(
            &loan.id,
            TransactionType::Withdrawal,
            dec!(100.01),
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Ledger(LedgerError::InsufficientFunds(_))
    ));

    // Nothing was applied
    let unchanged = loans.get_loan(&loan.id).unwrap();
    assert_eq!(unchanged.current_balance, dec!(100));
    assert_eq!(unchanged.total_withdrawals, dec!(0));
}

#[test]
fn partial_update_writes_only_the_provided_fields() {
    let ctx = common::setup();
    let user = common::create_user(&ctx, "erin@example.com", Role::User);
    let loans = common::loan_service(&ctx);

    let loan = loans
        .create_loan(NewLoan {
            user_id: user.id,
            principal_amount: dec!(3000),
            monthly_rate: dec!(0.01),
        })
        .unwrap();

    let updated = loans
        .update_loan_fields(LoanUpdate {
            id: loan.id.clone(),
            monthly_rate: Some(dec!(0.02)),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(updated.monthly_rate, dec!(0.02));
    assert_eq!(updated.principal_amount, dec!(3000));
    assert_eq!(updated.current_balance, dec!(3000));

    // The escape hatch: a direct balance overwrite is accepted as-is, even
    // below zero
    let overwritten = loans
        .update_loan_fields(LoanUpdate {
            id: loan.id.clone(),
            current_balance: Some(dec!(-42)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(overwritten.current_balance, dec!(-42));

    let err = loans
        .update_loan_fields(LoanUpdate {
            id: loan.id,
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::Loan(LoanError::InvalidData(_))));
}

#[test]
fn delete_cascades_to_transactions() {
    let ctx = common::setup();
    let user = common::create_user(&ctx, "frank@example.com", Role::User);
    let loans = common::loan_service(&ctx);
    let ledger = common::ledger_service(&ctx);

    let loan = loans
        .create_loan(NewLoan {
            user_id: user.id,
            principal_amount: dec!(800),
            monthly_rate: dec!(0.01),
        })
        .unwrap();
    ledger
        .add_transaction(new_transaction(
            &loan.id,
            TransactionType::MonthlyPayment,
            dec!(8),
        ))
        .unwrap();

    loans.delete_loan(&loan.id).unwrap();

    let err = loans.get_loan(&loan.id).unwrap_err();
    assert!(matches!(err, Error::Loan(LoanError::NotFound(_))));
    assert!(ledger.list_transactions(&loan.id, None).unwrap().is_empty());
}

#[test]
fn loan_summaries_carry_transaction_aggregates() {
    let ctx = common::setup();
    let alice = common::create_user(&ctx, "alice2@example.com", Role::User);
    let bob = common::create_user(&ctx, "bob2@example.com", Role::User);
    let loans = common::loan_service(&ctx);
    let ledger = common::ledger_service(&ctx);

    let with_history = loans
        .create_loan(NewLoan {
            user_id: alice.id,
            principal_amount: dec!(1000),
            monthly_rate: dec!(0.01),
        })
        .unwrap();
    // Zero-principal loans have no disbursement row
    let empty = loans
        .create_loan(NewLoan {
            user_id: bob.id,
            principal_amount: dec!(0),
            monthly_rate: dec!(0.01),
        })
        .unwrap();

    ledger
        .add_transaction(new_transaction(
            &with_history.id,
            TransactionType::MonthlyPayment,
            dec!(10),
        ))
        .unwrap();

    let summaries = loans.list_loans_with_summary().unwrap();
    assert_eq!(summaries.len(), 2);

    let s1 = summaries
        .iter()
        .find(|s| s.loan.id == with_history.id)
        .unwrap();
    // Disbursement plus the payment
    assert_eq!(s1.transaction_count, 2);
    assert!(s1.last_transaction_date.is_some());

    let s2 = summaries.iter().find(|s| s.loan.id == empty.id).unwrap();
    assert_eq!(s2.transaction_count, 0);
    assert!(s2.last_transaction_date.is_none());
}

#[test]
fn transactions_list_most_recent_first() {
    let ctx = common::setup();
    let user = common::create_user(&ctx, "grace@example.com", Role::User);
    let loans = common::loan_service(&ctx);
    let ledger = common::ledger_service(&ctx);

    let loan = loans
        .create_loan(NewLoan {
            user_id: user.id,
            principal_amount: dec!(0),
            monthly_rate: dec!(0.01),
        })
        .unwrap();

    let base = Utc::now().naive_utc();
    for days_ago in [3i64, 1, 2] {
        let mut tx = new_transaction(&loan.id, TransactionType::MonthlyPayment, dec!(1));
        tx.transaction_date = base - chrono::Duration::days(days_ago);
        tx.description = Some(format!("{} days ago", days_ago));
        ledger.add_transaction(tx).unwrap();
    }

    let listed = ledger.list_transactions(&loan.id, None).unwrap();
    let descriptions: Vec<_> = listed
        .iter()
        .map(|t| t.description.clone().unwrap())
        .collect();
    assert_eq!(descriptions, ["1 days ago", "2 days ago", "3 days ago"]);

    let limited = ledger.list_transactions(&loan.id, Some(2)).unwrap();
    assert_eq!(limited.len(), 2);
}

#[test]
fn concurrent_adds_preserve_the_total() {
    let ctx = common::setup();
    let user = common::create_user(&ctx, "heidi@example.com", Role::User);
    let loans = common::loan_service(&ctx);

    let loan = loans
        .create_loan(NewLoan {
            user_id: user.id,
            principal_amount: dec!(1000),
            monthly_rate: dec!(0.01),
        })
        .unwrap();

    let threads = 8;
    let adds_per_thread = 5;
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let pool = ctx.pool.clone();
            let loan_id = loan.id.clone();
            std::thread::spawn(move || {
                let ledger = lenddesk_core::ledger::LedgerService::new(std::sync::Arc::new(
                    lenddesk_core::ledger::LedgerRepository::new(pool),
                ));
                for _ in 0..adds_per_thread {
                    ledger
                        .add_transaction(NewLedgerTransaction {
                            loan_id: loan_id.clone(),
                            transaction_type: TransactionType::MonthlyPayment,
                            amount: dec!(10),
                            description: None,
                            bonus_percentage: None,
                            transaction_date: Utc::now().naive_utc(),
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let final_loan = loans.get_loan(&loan.id).unwrap();
    let expected = dec!(1000) + dec!(10) * Decimal::from(threads * adds_per_thread);
    assert_eq!(final_loan.current_balance, expected);
}
