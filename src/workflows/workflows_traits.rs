use super::workflows_model::*;
use crate::errors::Result;
use crate::ledger::NewLedgerTransaction;

/// Trait defining the contract for workflow repository operations.
pub trait WorkflowRepositoryTrait: Send + Sync {
    fn create_verification(&self, new: &NewVerificationRequest) -> Result<VerificationRequest>;
    fn has_pending_verification(&self, user_id: &str) -> Result<bool>;
    fn get_verification(&self, request_id: &str) -> Result<VerificationRequest>;
    fn list_verifications(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<VerificationRequest>>;
    fn list_verifications_for_user(&self, user_id: &str) -> Result<Vec<VerificationRequest>>;
    fn commit_verification_review(
        &self,
        request_id: &str,
        expected: RequestStatus,
        target: RequestStatus,
        reviewer: &str,
        notes: Option<String>,
    ) -> Result<VerificationRequest>;

    fn create_withdrawal(
        &self,
        new: &NewWithdrawalRequest,
        loan_id: &str,
    ) -> Result<WithdrawalRequest>;
    fn get_withdrawal(&self, request_id: &str) -> Result<WithdrawalRequest>;
    fn list_withdrawals(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<WithdrawalRequest>>;
    fn list_withdrawals_for_user(&self, user_id: &str) -> Result<Vec<WithdrawalRequest>>;
    fn commit_withdrawal_review(
        &self,
        request_id: &str,
        expected: RequestStatus,
        target: RequestStatus,
        reviewer: &str,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest>;
    fn commit_withdrawal_processing(
        &self,
        request_id: &str,
        reviewer: &str,
        notes: Option<String>,
        debit: &NewLedgerTransaction,
    ) -> Result<WithdrawalRequest>;

    fn create_meeting(&self, new: &NewMeetingRequest) -> Result<MeetingRequest>;
    fn get_meeting(&self, request_id: &str) -> Result<MeetingRequest>;
    fn list_meetings(&self, status_filter: Option<RequestStatus>)
        -> Result<Vec<MeetingRequest>>;
    fn list_meetings_for_user(&self, user_id: &str) -> Result<Vec<MeetingRequest>>;
    fn commit_meeting_review(
        &self,
        request_id: &str,
        expected: RequestStatus,
        target: RequestStatus,
        schedule: &MeetingSchedule,
        notes: Option<String>,
    ) -> Result<MeetingRequest>;
}

/// Trait defining the contract for workflow-engine operations.
pub trait WorkflowServiceTrait: Send + Sync {
    fn submit_verification(&self, new: NewVerificationRequest) -> Result<VerificationRequest>;
    fn transition_verification(
        &self,
        request_id: &str,
        target: RequestStatus,
        reviewer_id: &str,
        admin_notes: Option<String>,
    ) -> Result<VerificationRequest>;
    fn get_verification_request(&self, request_id: &str) -> Result<VerificationRequest>;
    fn list_verification_requests(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<VerificationRequest>>;
    fn list_verification_requests_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<VerificationRequest>>;

    fn submit_withdrawal(&self, new: NewWithdrawalRequest) -> Result<WithdrawalRequest>;
    fn transition_withdrawal(
        &self,
        request_id: &str,
        target: RequestStatus,
        reviewer_id: &str,
        admin_notes: Option<String>,
    ) -> Result<WithdrawalRequest>;
    fn complete_withdrawal(
        &self,
        request_id: &str,
        reviewer_id: &str,
    ) -> Result<WithdrawalRequest>;
    fn get_withdrawal_request(&self, request_id: &str) -> Result<WithdrawalRequest>;
    fn list_withdrawal_requests(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<WithdrawalRequest>>;
    fn list_withdrawal_requests_for_user(&self, user_id: &str)
        -> Result<Vec<WithdrawalRequest>>;

    fn submit_meeting(&self, new: NewMeetingRequest) -> Result<MeetingRequest>;
    fn transition_meeting(
        &self,
        request_id: &str,
        target: RequestStatus,
        reviewer_id: &str,
        schedule: MeetingSchedule,
        admin_notes: Option<String>,
    ) -> Result<MeetingRequest>;
    fn get_meeting_request(&self, request_id: &str) -> Result<MeetingRequest>;
    fn list_meeting_requests(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<MeetingRequest>>;
    fn list_meeting_requests_for_user(&self, user_id: &str) -> Result<Vec<MeetingRequest>>;
}
