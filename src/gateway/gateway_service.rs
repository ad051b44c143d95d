use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::READ_CACHE_TTL_SECS;
use crate::db::DbPool;
use crate::ledger::{
    LedgerRepository, LedgerService, LedgerServiceTrait, LedgerTransaction,
    NewLedgerTransaction,
};
use crate::loans::{
    Loan, LoanRepository, LoanService, LoanServiceTrait, LoanSummary, LoanUpdate, NewLoan,
};
use crate::users::{User, UserRepository, UserService, UserServiceTrait};
use crate::workflows::{
    MeetingRequest, MeetingSchedule, NewMeetingRequest, NewVerificationRequest,
    NewWithdrawalRequest, RequestStatus, VerificationRequest, WithdrawalRequest,
    WorkflowRepository, WorkflowService, WorkflowServiceTrait,
};

use super::gateway_cache::TtlCache;
use super::gateway_model::{ApiError, ApiResult, AuthContext};
use super::gateway_traits::Authenticator;

const LOAN_SUMMARY_CACHE_KEY: &str = "all";

/// The boundary facade the UI host calls.
///
/// Authenticates the caller, authorizes against the account directory,
/// dispatches to the domain services and maps internal errors to boundary
/// error kinds. Plain reads go through a TTL cache; anything feeding a
/// workflow transition reads the store directly.
pub struct Gateway {
    authenticator: Arc<dyn Authenticator>,
    user_service: Arc<dyn UserServiceTrait>,
    loan_service: Arc<dyn LoanServiceTrait>,
    ledger_service: Arc<dyn LedgerServiceTrait>,
    workflow_service: Arc<dyn WorkflowServiceTrait>,
    user_cache: TtlCache<User>,
    loan_summary_cache: TtlCache<Vec<LoanSummary>>,
}

impl Gateway {
    /// Creates a new Gateway instance with injected dependencies
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        user_service: Arc<dyn UserServiceTrait>,
        loan_service: Arc<dyn LoanServiceTrait>,
        ledger_service: Arc<dyn LedgerServiceTrait>,
        workflow_service: Arc<dyn WorkflowServiceTrait>,
    ) -> Self {
        let ttl = Duration::from_secs(READ_CACHE_TTL_SECS);
        Self {
            authenticator,
            user_service,
            loan_service,
            ledger_service,
            workflow_service,
            user_cache: TtlCache::new(ttl),
            loan_summary_cache: TtlCache::new(ttl),
        }
    }

    /// Composition root over one connection pool
    pub fn with_pool(pool: Arc<DbPool>, authenticator: Arc<dyn Authenticator>) -> Self {
        let user_service: Arc<dyn UserServiceTrait> =
            Arc::new(UserService::new(Arc::new(UserRepository::new(pool.clone()))));
        let loan_service: Arc<dyn LoanServiceTrait> =
            Arc::new(LoanService::new(Arc::new(LoanRepository::new(pool.clone()))));
        let ledger_service: Arc<dyn LedgerServiceTrait> = Arc::new(LedgerService::new(
            Arc::new(LedgerRepository::new(pool.clone())),
        ));
        let workflow_service: Arc<dyn WorkflowServiceTrait> = Arc::new(WorkflowService::new(
            Arc::new(WorkflowRepository::new(pool)),
            user_service.clone(),
            loan_service.clone(),
        ));

        Self::new(
            authenticator,
            user_service,
            loan_service,
            ledger_service,
            workflow_service,
        )
    }

    async fn caller(&self, token: &str) -> ApiResult<AuthContext> {
        Ok(self.authenticator.authenticate(token).await?)
    }

    async fn admin_caller(&self, token: &str) -> ApiResult<AuthContext> {
        let ctx = self.caller(token).await?;
        if !ctx.is_admin() {
            return Err(ApiError::forbidden(format!(
                "User {} lacks the admin role",
                ctx.user_id
            )));
        }
        Ok(ctx)
    }

    fn invalidate_loan_reads(&self) {
        self.loan_summary_cache.invalidate(LOAN_SUMMARY_CACHE_KEY);
    }

    // -- loans (POST /loans, PATCH /loans/{id}, DELETE /loans/{id}) --------

    pub async fn create_loan(&self, token: &str, new_loan: NewLoan) -> ApiResult<Loan> {
        self.admin_caller(token).await?;
        let loan = self.loan_service.create_loan(new_loan)?;
        self.invalidate_loan_reads();
        Ok(loan)
    }

    pub async fn update_loan(&self, token: &str, update: LoanUpdate) -> ApiResult<Loan> {
        self.admin_caller(token).await?;
        let loan = self.loan_service.update_loan_fields(update)?;
        self.invalidate_loan_reads();
        Ok(loan)
    }

    /// Executes unconditionally; any confirmation step lives with the caller
    pub async fn delete_loan(&self, token: &str, loan_id: &str) -> ApiResult<()> {
        self.admin_caller(token).await?;
        self.loan_service.delete_loan(loan_id)?;
        self.invalidate_loan_reads();
        Ok(())
    }

    pub async fn list_loans_with_summary(&self, token: &str) -> ApiResult<Vec<LoanSummary>> {
        self.admin_caller(token).await?;
        if let Some(cached) = self.loan_summary_cache.get(LOAN_SUMMARY_CACHE_KEY) {
            debug!("Serving loan summaries from cache");
            return Ok(cached);
        }
        let summaries = self.loan_service.list_loans_with_summary()?;
        self.loan_summary_cache
            .insert(LOAN_SUMMARY_CACHE_KEY, summaries.clone());
        Ok(summaries)
    }

    pub async fn get_my_loan(&self, token: &str) -> ApiResult<Loan> {
        let ctx = self.caller(token).await?;
        Ok(self.loan_service.get_loan_by_user(&ctx.user_id)?)
    }

    // -- transactions (POST/GET /loans/{id}/transactions) ------------------

    pub async fn add_transaction(
        &self,
        token: &str,
        new_transaction: NewLedgerTransaction,
    ) -> ApiResult<LedgerTransaction> {
        self.admin_caller(token).await?;
        let transaction = self.ledger_service.add_transaction(new_transaction)?;
        self.invalidate_loan_reads();
        Ok(transaction)
    }

    pub async fn list_transactions(
        &self,
        token: &str,
        loan_id: &str,
        limit: Option<i64>,
    ) -> ApiResult<Vec<LedgerTransaction>> {
        let ctx = self.caller(token).await?;
        if !ctx.is_admin() {
            let loan = self.loan_service.get_loan(loan_id)?;
            if loan.user_id != ctx.user_id {
                return Err(ApiError::forbidden("Loan belongs to another user"));
            }
        }
        Ok(self.ledger_service.list_transactions(loan_id, limit)?)
    }

    // -- users (GET /users, GET /users/{id}, PATCH /users/{id}/verified) ---

    pub async fn list_users(&self, token: &str) -> ApiResult<Vec<User>> {
        self.admin_caller(token).await?;
        Ok(self.user_service.list_users()?)
    }

    pub async fn get_user(&self, token: &str, user_id: &str) -> ApiResult<User> {
        let ctx = self.caller(token).await?;
        if !ctx.is_admin() && ctx.user_id != user_id {
            return Err(ApiError::forbidden("Cannot read another user's record"));
        }
        if let Some(cached) = self.user_cache.get(user_id) {
            return Ok(cached);
        }
        let user = self.user_service.get_user(user_id)?;
        self.user_cache.insert(user_id, user.clone());
        Ok(user)
    }

    /// Manual admin toggle; bypasses the verification workflow
    pub async fn set_user_verified(
        &self,
        token: &str,
        user_id: &str,
        verified: bool,
    ) -> ApiResult<User> {
        self.admin_caller(token).await?;
        let user = self.user_service.set_verified(user_id, verified)?;
        self.user_cache.invalidate(user_id);
        Ok(user)
    }

    // -- verification requests ---------------------------------------------

    pub async fn submit_verification(&self, token: &str) -> ApiResult<VerificationRequest> {
        let ctx = self.caller(token).await?;
        Ok(self
            .workflow_service
            .submit_verification(NewVerificationRequest {
                user_id: ctx.user_id,
            })?)
    }

    pub async fn review_verification(
        &self,
        token: &str,
        request_id: &str,
        target: RequestStatus,
        admin_notes: Option<String>,
    ) -> ApiResult<VerificationRequest> {
        let ctx = self.admin_caller(token).await?;
        let request = self.workflow_service.transition_verification(
            request_id,
            target,
            &ctx.user_id,
            admin_notes,
        )?;
        // Approval flips the directory flag; drop any cached copy
        self.user_cache.invalidate(&request.user_id);
        Ok(request)
    }

    pub async fn list_verification_requests(
        &self,
        token: &str,
        status_filter: Option<RequestStatus>,
    ) -> ApiResult<Vec<VerificationRequest>> {
        self.admin_caller(token).await?;
        Ok(self
            .workflow_service
            .list_verification_requests(status_filter)?)
    }

    pub async fn my_verification_requests(
        &self,
        token: &str,
    ) -> ApiResult<Vec<VerificationRequest>> {
        let ctx = self.caller(token).await?;
        Ok(self
            .workflow_service
            .list_verification_requests_for_user(&ctx.user_id)?)
    }

    // -- withdrawal requests -----------------------------------------------

    pub async fn submit_withdrawal(
        &self,
        token: &str,
        mut new: NewWithdrawalRequest,
    ) -> ApiResult<WithdrawalRequest> {
        let ctx = self.caller(token).await?;
        // The request is always filed for the authenticated caller
        new.user_id = ctx.user_id;
        Ok(self.workflow_service.submit_withdrawal(new)?)
    }

    /// Status review edit (`PUT /withdrawal-requests/{id}`). A target of
    /// `PROCESSED` funnels into the same guarded completion as
    /// `complete_withdrawal`.
    pub async fn review_withdrawal(
        &self,
        token: &str,
        request_id: &str,
        target: RequestStatus,
        admin_notes: Option<String>,
    ) -> ApiResult<WithdrawalRequest> {
        let ctx = self.admin_caller(token).await?;
        let request = self.workflow_service.transition_withdrawal(
            request_id,
            target,
            &ctx.user_id,
            admin_notes,
        )?;
        if target == RequestStatus::Processed {
            self.invalidate_loan_reads();
        }
        Ok(request)
    }

    /// Completion verb (`POST /withdrawal-requests/{id}/complete`)
    pub async fn complete_withdrawal(
        &self,
        token: &str,
        request_id: &str,
    ) -> ApiResult<WithdrawalRequest> {
        let ctx = self.admin_caller(token).await?;
        let request = self
            .workflow_service
            .complete_withdrawal(request_id, &ctx.user_id)?;
        self.invalidate_loan_reads();
        Ok(request)
    }

    pub async fn list_withdrawal_requests(
        &self,
        token: &str,
        status_filter: Option<RequestStatus>,
    ) -> ApiResult<Vec<WithdrawalRequest>> {
        self.admin_caller(token).await?;
        Ok(self
            .workflow_service
            .list_withdrawal_requests(status_filter)?)
    }

    pub async fn my_withdrawal_requests(&self, token: &str) -> ApiResult<Vec<WithdrawalRequest>> {
        let ctx = self.caller(token).await?;
        Ok(self
            .workflow_service
            .list_withdrawal_requests_for_user(&ctx.user_id)?)
    }

    // -- meeting requests --------------------------------------------------

    pub async fn submit_meeting(
        &self,
        token: &str,
        mut new: NewMeetingRequest,
    ) -> ApiResult<MeetingRequest> {
        let ctx = self.caller(token).await?;
        new.user_id = ctx.user_id;
        Ok(self.workflow_service.submit_meeting(new)?)
    }

    pub async fn review_meeting(
        &self,
        token: &str,
        request_id: &str,
        target: RequestStatus,
        schedule: MeetingSchedule,
        admin_notes: Option<String>,
    ) -> ApiResult<MeetingRequest> {
        let ctx = self.admin_caller(token).await?;
        Ok(self.workflow_service.transition_meeting(
            request_id,
            target,
            &ctx.user_id,
            schedule,
            admin_notes,
        )?)
    }

    pub async fn list_meeting_requests(
        &self,
        token: &str,
        status_filter: Option<RequestStatus>,
    ) -> ApiResult<Vec<MeetingRequest>> {
        self.admin_caller(token).await?;
        Ok(self.workflow_service.list_meeting_requests(status_filter)?)
    }

    pub async fn my_meeting_requests(&self, token: &str) -> ApiResult<Vec<MeetingRequest>> {
        let ctx = self.caller(token).await?;
        Ok(self
            .workflow_service
            .list_meeting_requests_for_user(&ctx.user_id)?)
    }
}
