use chrono::Utc;
use log::{debug, error};
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::ledger::{NewLedgerTransaction, TransactionType};
use crate::loans::LoanServiceTrait;
use crate::users::UserServiceTrait;
use crate::workflows::WorkflowError;

use super::workflows_machine::TransitionTable;
use super::workflows_model::*;
use super::workflows_traits::{WorkflowRepositoryTrait, WorkflowServiceTrait};

/// The workflow engine: submissions, guarded transitions and their
/// side-effect hooks.
pub struct WorkflowService {
    workflow_repository: Arc<dyn WorkflowRepositoryTrait>,
    user_service: Arc<dyn UserServiceTrait>,
    loan_service: Arc<dyn LoanServiceTrait>,
}

impl WorkflowService {
    /// Creates a new WorkflowService instance with injected dependencies
    pub fn new(
        workflow_repository: Arc<dyn WorkflowRepositoryTrait>,
        user_service: Arc<dyn UserServiceTrait>,
        loan_service: Arc<dyn LoanServiceTrait>,
    ) -> Self {
        Self {
            workflow_repository,
            user_service,
            loan_service,
        }
    }

    /// Transitions require the admin role, whoever the caller is
    fn ensure_admin(&self, actor_id: &str) -> Result<()> {
        match self.user_service.is_admin(actor_id) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::Authorization(format!(
                "User {} lacks the admin role",
                actor_id
            ))),
            Err(_) => Err(Error::Authorization(format!(
                "Unknown reviewer {}",
                actor_id
            ))),
        }
    }
}

impl WorkflowServiceTrait for WorkflowService {
    // -- verification ------------------------------------------------------

    fn submit_verification(&self, new: NewVerificationRequest) -> Result<VerificationRequest> {
        new.validate()?;
        // The user must exist; terminal requests stay behind, one live
        // request at a time
        self.user_service.get_user(&new.user_id)?;
        if self.workflow_repository.has_pending_verification(&new.user_id)? {
            return Err(WorkflowError::DuplicatePending(format!(
                "User {} already has a pending verification request",
                new.user_id
            ))
            .into());
        }
        debug!("Submitting verification request for user {}", new.user_id);
        self.workflow_repository.create_verification(&new)
    }

    fn transition_verification(
        &self,
        request_id: &str,
        target: RequestStatus,
        reviewer_id: &str,
        admin_notes: Option<String>,
    ) -> Result<VerificationRequest> {
        self.ensure_admin(reviewer_id)?;

        let current = self.workflow_repository.get_verification(request_id)?;
        let table = TransitionTable::for_kind(RequestKind::Verification);
        table.check(current.status, target)?;

        let committed = self.workflow_repository.commit_verification_review(
            request_id,
            current.status,
            target,
            reviewer_id,
            admin_notes,
        )?;

        if target == RequestStatus::Approved {
            // Idempotent, so a replayed hook cannot corrupt the directory
            self.user_service.set_verified(&committed.user_id, true)?;
        }

        Ok(committed)
    }

    fn get_verification_request(&self, request_id: &str) -> Result<VerificationRequest> {
        self.workflow_repository.get_verification(request_id)
    }

    fn list_verification_requests(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<VerificationRequest>> {
        self.workflow_repository.list_verifications(status_filter)
    }

    fn list_verification_requests_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<VerificationRequest>> {
        self.workflow_repository.list_verifications_for_user(user_id)
    }

    // -- withdrawal --------------------------------------------------------

    fn submit_withdrawal(&self, new: NewWithdrawalRequest) -> Result<WithdrawalRequest> {
        new.validate()?;
        // Resolve the owning loan now so review never races a missing loan
        let loan = self.loan_service.get_loan_by_user(&new.user_id)?;
        debug!(
            "Submitting withdrawal request of {} for user {} (loan {})",
            new.amount, new.user_id, loan.id
        );
        self.workflow_repository.create_withdrawal(&new, &loan.id)
    }

    /// Drives a withdrawal request through its table. On `Approved ->
    /// Processed` the status CAS and the ledger debit commit in one store
    /// transaction, so the request is processed at most once and a failed
    /// debit rolls the status back to `APPROVED`.
    fn transition_withdrawal(
        &self,
        request_id: &str,
        target: RequestStatus,
        reviewer_id: &str,
        admin_notes: Option<String>,
    ) -> Result<WithdrawalRequest> {
        self.ensure_admin(reviewer_id)?;

        let current = self.workflow_repository.get_withdrawal(request_id)?;
        let table = TransitionTable::for_kind(RequestKind::Withdrawal);
        table.check(current.status, target)?;

        if target == RequestStatus::Processed {
            let debit = NewLedgerTransaction {
                loan_id: current.loan_id.clone(),
                transaction_type: TransactionType::Withdrawal,
                amount: current.amount,
                description: Some(format!("Withdrawal request {}", current.id)),
                bonus_percentage: None,
                transaction_date: Utc::now().naive_utc(),
            };

            return self
                .workflow_repository
                .commit_withdrawal_processing(request_id, reviewer_id, admin_notes, &debit)
                .map_err(|e| {
                    error!(
                        "Processing withdrawal request {} failed, rolled back: {}",
                        request_id, e
                    );
                    e
                });
        }

        self.workflow_repository.commit_withdrawal_review(
            request_id,
            current.status,
            target,
            reviewer_id,
            admin_notes,
        )
    }

    fn complete_withdrawal(
        &self,
        request_id: &str,
        reviewer_id: &str,
    ) -> Result<WithdrawalRequest> {
        self.transition_withdrawal(request_id, RequestStatus::Processed, reviewer_id, None)
    }

    fn get_withdrawal_request(&self, request_id: &str) -> Result<WithdrawalRequest> {
        self.workflow_repository.get_withdrawal(request_id)
    }

    fn list_withdrawal_requests(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<WithdrawalRequest>> {
        self.workflow_repository.list_withdrawals(status_filter)
    }

    fn list_withdrawal_requests_for_user(&self, user_id: &str) -> Result<Vec<WithdrawalRequest>> {
        self.workflow_repository.list_withdrawals_for_user(user_id)
    }

    // -- meeting -----------------------------------------------------------

    fn submit_meeting(&self, new: NewMeetingRequest) -> Result<MeetingRequest> {
        new.validate()?;
        self.user_service.get_user(&new.user_id)?;
        debug!("Submitting meeting request for user {}", new.user_id);
        self.workflow_repository.create_meeting(&new)
    }

    fn transition_meeting(
        &self,
        request_id: &str,
        target: RequestStatus,
        reviewer_id: &str,
        schedule: MeetingSchedule,
        admin_notes: Option<String>,
    ) -> Result<MeetingRequest> {
        self.ensure_admin(reviewer_id)?;

        let current = self.workflow_repository.get_meeting(request_id)?;
        let table = TransitionTable::for_kind(RequestKind::Meeting);
        table.check(current.status, target)?;

        if target == RequestStatus::Scheduled {
            if schedule.scheduled_date.is_none()
                || schedule
                    .scheduled_time
                    .as_deref()
                    .map_or(true, |t| t.trim().is_empty())
            {
                return Err(WorkflowError::InvalidData(
                    "Scheduling a meeting requires a date and a time".to_string(),
                )
                .into());
            }
            if current.meeting_type == MeetingType::Video
                && schedule
                    .meeting_link
                    .as_deref()
                    .map_or(true, |l| l.trim().is_empty())
            {
                return Err(WorkflowError::InvalidData(
                    "Video meetings require a meeting link".to_string(),
                )
                .into());
            }
        }

        self.workflow_repository.commit_meeting_review(
            request_id,
            current.status,
            target,
            &schedule,
            admin_notes,
        )
    }

    fn get_meeting_request(&self, request_id: &str) -> Result<MeetingRequest> {
        self.workflow_repository.get_meeting(request_id)
    }

    fn list_meeting_requests(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<MeetingRequest>> {
        self.workflow_repository.list_meetings(status_filter)
    }

    fn list_meeting_requests_for_user(&self, user_id: &str) -> Result<Vec<MeetingRequest>> {
        self.workflow_repository.list_meetings_for_user(user_id)
    }
}
