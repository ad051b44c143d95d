use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;

use lenddesk_core::errors::{Error, Result};
use lenddesk_core::gateway::{AuthContext, Authenticator, Gateway};
use lenddesk_core::ledger::{NewLedgerTransaction, TransactionType};
use lenddesk_core::loans::NewLoan;
use lenddesk_core::users::Role;
use lenddesk_core::workflows::{NewWithdrawalRequest, RequestStatus, Urgency};

mod common;

/// Token table standing in for the host's session layer
struct StaticAuthenticator {
    tokens: HashMap<String, AuthContext>,
}

impl StaticAuthenticator {
    fn new(entries: &[(&str, &str, Role)]) -> Self {
        let tokens = entries
            .iter()
            .map(|(token, user_id, role)| {
                (
                    token.to_string(),
                    AuthContext {
                        user_id: user_id.to_string(),
                        role: *role,
                    },
                )
            })
            .collect();
        Self { tokens }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<AuthContext> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| Error::Authorization("Unknown token".to_string()))
    }
}

struct GatewayFixture {
    gateway: Gateway,
    admin_id: String,
    member_id: String,
    _ctx: common::TestContext,
}

fn setup_gateway() -> GatewayFixture {
    let ctx = common::setup();
    let admin = common::create_user(&ctx, "admin@example.com", Role::Admin);
    let member = common::create_user(&ctx, "member@example.com", Role::User);

    let authenticator = StaticAuthenticator::new(&[
        ("admin-token", admin.id.as_str(), Role::Admin),
        ("member-token", member.id.as_str(), Role::User),
    ]);
    let gateway = Gateway::with_pool(ctx.pool.clone(), Arc::new(authenticator));

    GatewayFixture {
        gateway,
        admin_id: admin.id,
        member_id: member.id,
        _ctx: ctx,
    }
}

fn new_loan(user_id: &str, principal: rust_decimal::Decimal) -> NewLoan {
    NewLoan {
        user_id: user_id.to_string(),
        principal_amount: principal,
        monthly_rate: dec!(0.01),
    }
}

#[tokio::test]
async fn unknown_tokens_and_non_admins_are_refused() {
    let fx = setup_gateway();

    let err = fx
        .gateway
        .create_loan("bogus-token", new_loan(&fx.member_id, dec!(1000)))
        .await
        .unwrap_err();
    assert_eq!(err.status, 403);
    assert_eq!(err.code, "AUTHORIZATION_ERROR");

    let err = fx
        .gateway
        .create_loan("member-token", new_loan(&fx.member_id, dec!(1000)))
        .await
        .unwrap_err();
    assert_eq!(err.status, 403);
    assert_eq!(err.code, "AUTHORIZATION_ERROR");

    let err = fx.gateway.list_users("member-token").await.unwrap_err();
    assert_eq!(err.status, 403);

    let err = fx
        .gateway
        .list_withdrawal_requests("member-token", None)
        .await
        .unwrap_err();
    assert_eq!(err.status, 403);
}

#[tokio::test]
async fn domain_errors_keep_their_boundary_codes() {
    let fx = setup_gateway();

    // No loan yet
    let err = fx.gateway.get_my_loan("member-token").await.unwrap_err();
    assert_eq!(err.status, 404);
    assert_eq!(err.code, "NOT_FOUND");

    fx.gateway
        .create_loan("admin-token", new_loan(&fx.member_id, dec!(1000)))
        .await
        .unwrap();

    // Second loan for the same user
    let err = fx
        .gateway
        .create_loan("admin-token", new_loan(&fx.member_id, dec!(500)))
        .await
        .unwrap_err();
    assert_eq!(err.status, 409);
    assert_eq!(err.code, "CONFLICT");

    // Bad payload
    let loan = fx.gateway.get_my_loan("member-token").await.unwrap();
    let err = fx
        .gateway
        .add_transaction(
            "admin-token",
            NewLedgerTransaction {
                loan_id: loan.id.clone(),
                transaction_type: TransactionType::MonthlyPayment,
                amount: dec!(0),
                description: None,
                bonus_percentage: None,
                transaction_date: Utc::now().naive_utc(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "VALIDATION_ERROR");

    // Overdraw
    let err = fx
        .gateway
        .add_transaction(
            "admin-token",
            NewLedgerTransaction {
                loan_id: loan.id,
                transaction_type: TransactionType::Withdrawal,
                amount: dec!(5000),
                description: None,
                bonus_percentage: None,
                transaction_date: Utc::now().naive_utc(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "INSUFFICIENT_FUNDS");

    let body = err.body();
    assert_eq!(body["error"]["code"], "INSUFFICIENT_FUNDS");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn withdrawal_requests_are_filed_for_the_caller() {
    let fx = setup_gateway();
    fx.gateway
        .create_loan("admin-token", new_loan(&fx.member_id, dec!(2000)))
        .await
        .unwrap();

    // A spoofed user_id in the payload is ignored
    let request = fx
        .gateway
        .submit_withdrawal(
            "member-token",
            NewWithdrawalRequest {
                user_id: fx.admin_id.clone(),
                amount: dec!(300),
                reason: None,
                urgency: Urgency::High,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(request.user_id, fx.member_id);

    let mine = fx
        .gateway
        .my_withdrawal_requests("member-token")
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, request.id);
}

#[tokio::test]
async fn review_to_processed_funnels_through_completion() {
    let fx = setup_gateway();
    let loan = fx
        .gateway
        .create_loan("admin-token", new_loan(&fx.member_id, dec!(2000)))
        .await
        .unwrap();

    let request = fx
        .gateway
        .submit_withdrawal(
            "member-token",
            NewWithdrawalRequest {
                user_id: String::new(),
                amount: dec!(450),
                reason: Some("Tuition".to_string()),
                urgency: Urgency::Normal,
                notes: None,
            },
        )
        .await
        .unwrap();

    fx.gateway
        .review_withdrawal("admin-token", &request.id, RequestStatus::Approved, None)
        .await
        .unwrap();

    // The status edit and the completion verb reach the same guarded path
    let processed = fx
        .gateway
        .review_withdrawal("admin-token", &request.id, RequestStatus::Processed, None)
        .await
        .unwrap();
    assert_eq!(processed.status, RequestStatus::Processed);

    let err = fx
        .gateway
        .complete_withdrawal("admin-token", &request.id)
        .await
        .unwrap_err();
    assert_eq!(err.status, 409);
    assert_eq!(err.code, "INVALID_TRANSITION");

    let updated = fx.gateway.get_my_loan("member-token").await.unwrap();
    assert_eq!(updated.current_balance, dec!(1550));
    assert_eq!(updated.id, loan.id);
}

#[tokio::test]
async fn transaction_reads_are_limited_to_the_owner() {
    let fx = setup_gateway();
    let ctx = &fx._ctx;
    let other = common::create_user(ctx, "other@example.com", Role::User);

    let loan = fx
        .gateway
        .create_loan("admin-token", new_loan(&other.id, dec!(100)))
        .await
        .unwrap();

    let err = fx
        .gateway
        .list_transactions("member-token", &loan.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.status, 403);

    // Admins read any loan's history
    let listed = fx
        .gateway
        .list_transactions("admin-token", &loan.id, None)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn user_reads_are_cached_until_a_write_invalidates() {
    let fx = setup_gateway();

    // Self-read allowed, cross-read refused
    let me = fx
        .gateway
        .get_user("member-token", &fx.member_id)
        .await
        .unwrap();
    assert!(!me.account_verified);
    let err = fx
        .gateway
        .get_user("member-token", &fx.admin_id)
        .await
        .unwrap_err();
    assert_eq!(err.status, 403);

    fx.gateway
        .set_user_verified("admin-token", &fx.member_id, true)
        .await
        .unwrap();

    // The write dropped the cached copy, so the flag is visible immediately
    let me = fx
        .gateway
        .get_user("member-token", &fx.member_id)
        .await
        .unwrap();
    assert!(me.account_verified);
}

#[tokio::test]
async fn approving_verification_through_the_gateway_updates_the_directory() {
    let fx = setup_gateway();

    let request = fx
        .gateway
        .submit_verification("member-token")
        .await
        .unwrap();
    assert_eq!(request.user_id, fx.member_id);

    // Duplicate submission while one is pending
    let err = fx
        .gateway
        .submit_verification("member-token")
        .await
        .unwrap_err();
    assert_eq!(err.status, 409);
    assert_eq!(err.code, "CONFLICT");

    // Warm the cache with the unverified record
    fx.gateway
        .get_user("member-token", &fx.member_id)
        .await
        .unwrap();

    let err = fx
        .gateway
        .review_verification("member-token", &request.id, RequestStatus::Approved, None)
        .await
        .unwrap_err();
    assert_eq!(err.status, 403);

    fx.gateway
        .review_verification("admin-token", &request.id, RequestStatus::Approved, None)
        .await
        .unwrap();

    let me = fx
        .gateway
        .get_user("member-token", &fx.member_id)
        .await
        .unwrap();
    assert!(me.account_verified);
}

#[tokio::test]
async fn loan_summary_cache_is_dropped_on_financial_writes() {
    let fx = setup_gateway();
    fx.gateway
        .create_loan("admin-token", new_loan(&fx.member_id, dec!(1000)))
        .await
        .unwrap();

    let before = fx
        .gateway
        .list_loans_with_summary("admin-token")
        .await
        .unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].transaction_count, 1);

    let loan_id = before[0].loan.id.clone();
    fx.gateway
        .add_transaction(
            "admin-token",
            NewLedgerTransaction {
                loan_id,
                transaction_type: TransactionType::Bonus,
                amount: dec!(25),
                description: None,
                bonus_percentage: Some(dec!(0.025)),
                transaction_date: Utc::now().naive_utc(),
            },
        )
        .await
        .unwrap();

    let after = fx
        .gateway
        .list_loans_with_summary("admin-token")
        .await
        .unwrap();
    assert_eq!(after[0].transaction_count, 2);
    assert_eq!(after[0].loan.current_balance, dec!(1025));
}
