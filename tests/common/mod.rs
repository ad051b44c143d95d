#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use lenddesk_core::db::{self, DbPool};
use lenddesk_core::ledger::{LedgerRepository, LedgerService};
use lenddesk_core::loans::{LoanRepository, LoanService, LoanServiceTrait};
use lenddesk_core::users::{NewUser, Role, User, UserRepository, UserService, UserServiceTrait};
use lenddesk_core::workflows::{WorkflowRepository, WorkflowService};

/// A fresh migrated database in a temp dir, dropped with the context
pub struct TestContext {
    pub pool: Arc<DbPool>,
    _data_dir: TempDir,
}

pub fn setup() -> TestContext {
    let data_dir = tempfile::tempdir().expect("create temp dir");
    let db_path = db::init(data_dir.path().to_str().unwrap()).expect("initialize database");
    let pool = db::create_pool(&db_path).expect("create database pool");
    db::run_migrations(&pool).expect("run migrations");

    TestContext {
        pool,
        _data_dir: data_dir,
    }
}

pub fn user_service(ctx: &TestContext) -> UserService {
    UserService::new(Arc::new(UserRepository::new(ctx.pool.clone())))
}

pub fn loan_service(ctx: &TestContext) -> LoanService {
    LoanService::new(Arc::new(LoanRepository::new(ctx.pool.clone())))
}

pub fn ledger_service(ctx: &TestContext) -> LedgerService {
    LedgerService::new(Arc::new(LedgerRepository::new(ctx.pool.clone())))
}

pub fn workflow_service(ctx: &TestContext) -> WorkflowService {
    let users: Arc<dyn UserServiceTrait> =
        Arc::new(UserService::new(Arc::new(UserRepository::new(ctx.pool.clone()))));
    let loans: Arc<dyn LoanServiceTrait> =
        Arc::new(LoanService::new(Arc::new(LoanRepository::new(ctx.pool.clone()))));
    WorkflowService::new(
        Arc::new(WorkflowRepository::new(ctx.pool.clone())),
        users,
        loans,
    )
}

pub fn create_user(ctx: &TestContext, email: &str, role: Role) -> User {
    user_service(ctx)
        .create_user(NewUser {
            id: None,
            email: email.to_string(),
            name: email.split('@').next().unwrap().to_string(),
            role,
        })
        .expect("create user")
}
