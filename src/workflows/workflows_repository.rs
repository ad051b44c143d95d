use chrono::Utc;
use diesel::prelude::*;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::{Error, Result};
use crate::ledger::ledger_repository::apply_transaction;
use crate::ledger::NewLedgerTransaction;
use crate::schema::{meeting_requests, verification_requests, withdrawal_requests};
use crate::workflows::WorkflowError;

use super::workflows_machine::TransitionTable;
use super::workflows_model::*;
use super::workflows_traits::WorkflowRepositoryTrait;

/// Repository for the three request-workflow tables.
///
/// Every review commit is a compare-and-swap on `(id, expected status)`; a
/// zero-row update means either the request is gone or another reviewer got
/// there first, and the two cases are told apart by re-reading the row.
pub struct WorkflowRepository {
    pool: Arc<DbPool>,
}

impl WorkflowRepository {
    /// Creates a new WorkflowRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    fn cas_conflict(
        &self,
        kind: RequestKind,
        current: &str,
        target: RequestStatus,
    ) -> WorkflowError {
        WorkflowError::InvalidTransition {
            kind,
            from: RequestStatus::from_str(current).unwrap_or(RequestStatus::Pending),
            to: target,
        }
    }
}

impl WorkflowRepositoryTrait for WorkflowRepository {
    // -- verification ------------------------------------------------------

    fn create_verification(&self, new: &NewVerificationRequest) -> Result<VerificationRequest> {
        let mut conn = get_connection(&self.pool)?;

        let row = VerificationRequestDB {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id.clone(),
            status: TransitionTable::initial().as_str().to_string(),
            admin_notes: None,
            reviewer_id: None,
            requested_at: Utc::now().naive_utc(),
            reviewed_at: None,
        };

        diesel::insert_into(verification_requests::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(row.into())
    }

    fn has_pending_verification(&self, user: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;

        let count: i64 = verification_requests::table
            .filter(verification_requests::user_id.eq(user))
            .filter(verification_requests::status.eq(RequestStatus::Pending.as_str()))
            .count()
            .get_result(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(count > 0)
    }

    fn get_verification(&self, request_id: &str) -> Result<VerificationRequest> {
        let mut conn = get_connection(&self.pool)?;

        let row = verification_requests::table
            .find(request_id)
            .first::<VerificationRequestDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => WorkflowError::NotFound(format!(
                    "Verification request {} not found",
                    request_id
                )),
                _ => WorkflowError::DatabaseError(e.to_string()),
            })?;

        Ok(row.into())
    }

    fn list_verifications(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<VerificationRequest>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = verification_requests::table.into_boxed();
        if let Some(s) = status_filter {
            query = query.filter(verification_requests::status.eq(s.as_str()));
        }

        let rows = query
            .order(verification_requests::requested_at.desc())
            .load::<VerificationRequestDB>(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(rows.into_iter().map(VerificationRequest::from).collect())
    }

    fn list_verifications_for_user(&self, user: &str) -> Result<Vec<VerificationRequest>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = verification_requests::table
            .filter(verification_requests::user_id.eq(user))
            .order(verification_requests::requested_at.desc())
            .load::<VerificationRequestDB>(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(rows.into_iter().map(VerificationRequest::from).collect())
    }

    fn commit_verification_review(
        &self,
        request_id: &str,
        expected: RequestStatus,
        target: RequestStatus,
        reviewer: &str,
        notes: Option<String>,
    ) -> Result<VerificationRequest> {
        let mut conn = get_connection(&self.pool)?;

        let changeset = VerificationReviewChangeset {
            status: target.as_str().to_string(),
            reviewer_id: Some(reviewer.to_string()),
            admin_notes: notes,
            reviewed_at: Some(Utc::now().naive_utc()),
        };
        let affected = diesel::update(
            verification_requests::table
                .find(request_id)
                .filter(verification_requests::status.eq(expected.as_str())),
        )
        .set(&changeset)
        .execute(&mut conn)
        .map_err(WorkflowError::from)?;

        if affected == 0 {
            let current = self.get_verification(request_id)?;
            return Err(self
                .cas_conflict(RequestKind::Verification, current.status.as_str(), target)
                .into());
        }

        self.get_verification(request_id)
    }

    // -- withdrawal --------------------------------------------------------

    fn create_withdrawal(
        &self,
        new: &NewWithdrawalRequest,
        loan: &str,
    ) -> Result<WithdrawalRequest> {
        let mut conn = get_connection(&self.pool)?;

        let row = WithdrawalRequestDB {
            id: uuid::Uuid::new_v4().to_string(),
            loan_id: loan.to_string(),
            user_id: new.user_id.clone(),
            amount: new.amount.to_string(),
            reason: new.reason.clone(),
            urgency: new.urgency.as_str().to_string(),
            notes: new.notes.clone(),
            status: TransitionTable::initial().as_str().to_string(),
            admin_notes: None,
            reviewer_id: None,
            created_at: Utc::now().naive_utc(),
            reviewed_at: None,
            completed_at: None,
        };

        diesel::insert_into(withdrawal_requests::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(row.into())
    }

    fn get_withdrawal(&self, request_id: &str) -> Result<WithdrawalRequest> {
        let mut conn = get_connection(&self.pool)?;

        let row = withdrawal_requests::table
            .find(request_id)
            .first::<WithdrawalRequestDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => WorkflowError::NotFound(format!(
                    "Withdrawal request {} not found",
                    request_id
                )),
                _ => WorkflowError::DatabaseError(e.to_string()),
            })?;

        Ok(row.into())
    }

    fn list_withdrawals(
        &self,
        status_filter: Option<RequestStatus>,
    ) -> Result<Vec<WithdrawalRequest>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = withdrawal_requests::table.into_boxed();
        if let Some(s) = status_filter {
            query = query.filter(withdrawal_requests::status.eq(s.as_str()));
        }

        let rows = query
            .order(withdrawal_requests::created_at.desc())
            .load::<WithdrawalRequestDB>(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(rows.into_iter().map(WithdrawalRequest::from).collect())
    }

    fn list_withdrawals_for_user(&self, user: &str) -> Result<Vec<WithdrawalRequest>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = withdrawal_requests::table
            .filter(withdrawal_requests::user_id.eq(user))
            .order(withdrawal_requests::created_at.desc())
            .load::<WithdrawalRequestDB>(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(rows.into_iter().map(WithdrawalRequest::from).collect())
    }

    /// Commits an approve/reject decision. Processing an approved request is
    /// the financial path and goes through `commit_withdrawal_processing`.
    fn commit_withdrawal_review(
        &self,
        request_id: &str,
        expected: RequestStatus,
        target: RequestStatus,
        reviewer: &str,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let mut conn = get_connection(&self.pool)?;

        let changeset = WithdrawalReviewChangeset {
            status: target.as_str().to_string(),
            reviewer_id: Some(reviewer.to_string()),
            admin_notes: notes,
            reviewed_at: Some(Utc::now().naive_utc()),
            completed_at: None,
        };
        let affected = diesel::update(
            withdrawal_requests::table
                .find(request_id)
                .filter(withdrawal_requests::status.eq(expected.as_str())),
        )
        .set(&changeset)
        .execute(&mut conn)
        .map_err(WorkflowError::from)?;

        if affected == 0 {
            let current = self.get_withdrawal(request_id)?;
            return Err(self
                .cas_conflict(RequestKind::Withdrawal, current.status.as_str(), target)
                .into());
        }

        self.get_withdrawal(request_id)
    }

    /// Marks an approved request `PROCESSED` and books its ledger debit in
    /// one IMMEDIATE transaction: the status CAS and the balance mutation
    /// commit or roll back together, so a `PROCESSED` request always has its
    /// debit and a failed debit leaves the request `APPROVED`.
    fn commit_withdrawal_processing(
        &self,
        request_id: &str,
        reviewer: &str,
        notes: Option<String>,
        debit: &NewLedgerTransaction,
    ) -> Result<WithdrawalRequest> {
        let mut conn = get_connection(&self.pool)?;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            let changeset = WithdrawalReviewChangeset {
                status: RequestStatus::Processed.as_str().to_string(),
                reviewer_id: Some(reviewer.to_string()),
                admin_notes: notes,
                reviewed_at: None,
                completed_at: Some(Utc::now().naive_utc()),
            };
            let affected = diesel::update(
                withdrawal_requests::table
                    .find(request_id)
                    .filter(withdrawal_requests::status.eq(RequestStatus::Approved.as_str())),
            )
            .set(&changeset)
            .execute(conn)
            .map_err(WorkflowError::from)?;

            if affected == 0 {
                let row = withdrawal_requests::table
                    .find(request_id)
                    .first::<WithdrawalRequestDB>(conn)
                    .map_err(|e| match e {
                        diesel::result::Error::NotFound => WorkflowError::NotFound(format!(
                            "Withdrawal request {} not found",
                            request_id
                        )),
                        _ => WorkflowError::DatabaseError(e.to_string()),
                    })?;
                return Err(self
                    .cas_conflict(RequestKind::Withdrawal, &row.status, RequestStatus::Processed)
                    .into());
            }

            apply_transaction(conn, debit)?;

            let row = withdrawal_requests::table
                .find(request_id)
                .first::<WithdrawalRequestDB>(conn)
                .map_err(WorkflowError::from)?;
            Ok(row.into())
        })
    }

    // -- meeting -----------------------------------------------------------

    fn create_meeting(&self, new: &NewMeetingRequest) -> Result<MeetingRequest> {
        let mut conn = get_connection(&self.pool)?;

        let now = Utc::now().naive_utc();
        let row = MeetingRequestDB {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id.clone(),
            purpose: new.purpose.clone(),
            topics: new.topics.clone(),
            notes: new.notes.clone(),
            preferred_date: new.preferred_date,
            preferred_time: new.preferred_time.clone(),
            meeting_type: new.meeting_type.as_str().to_string(),
            urgency: new.urgency.as_str().to_string(),
            status: TransitionTable::initial().as_str().to_string(),
            scheduled_date: None,
            scheduled_time: None,
            meeting_link: None,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(meeting_requests::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(row.into())
    }

    fn get_meeting(&self, request_id: &str) -> Result<MeetingRequest> {
        let mut conn = get_connection(&self.pool)?;

        let row = meeting_requests::table
            .find(request_id)
            .first::<MeetingRequestDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => WorkflowError::NotFound(format!(
                    "Meeting request {} not found",
                    request_id
                )),
                _ => WorkflowError::DatabaseError(e.to_string()),
            })?;

        Ok(row.into())
    }

    fn list_meetings(&self, status_filter: Option<RequestStatus>) -> Result<Vec<MeetingRequest>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = meeting_requests::table.into_boxed();
        if let Some(s) = status_filter {
            query = query.filter(meeting_requests::status.eq(s.as_str()));
        }

        let rows = query
            .order(meeting_requests::created_at.desc())
            .load::<MeetingRequestDB>(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(rows.into_iter().map(MeetingRequest::from).collect())
    }

    fn list_meetings_for_user(&self, user: &str) -> Result<Vec<MeetingRequest>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = meeting_requests::table
            .filter(meeting_requests::user_id.eq(user))
            .order(meeting_requests::created_at.desc())
            .load::<MeetingRequestDB>(&mut conn)
            .map_err(WorkflowError::from)?;

        Ok(rows.into_iter().map(MeetingRequest::from).collect())
    }

    fn commit_meeting_review(
        &self,
        request_id: &str,
        expected: RequestStatus,
        target: RequestStatus,
        schedule: &MeetingSchedule,
        notes: Option<String>,
    ) -> Result<MeetingRequest> {
        let mut conn = get_connection(&self.pool)?;

        // Schedule fields only carry values on the scheduling edge; on any
        // other edge they are `None` and stay untouched
        let changeset = MeetingReviewChangeset {
            status: target.as_str().to_string(),
            admin_notes: notes,
            scheduled_date: schedule.scheduled_date,
            scheduled_time: schedule.scheduled_time.clone(),
            meeting_link: schedule.meeting_link.clone(),
            updated_at: Utc::now().naive_utc(),
        };
        let affected = diesel::update(
            meeting_requests::table
                .find(request_id)
                .filter(meeting_requests::status.eq(expected.as_str())),
        )
        .set(&changeset)
        .execute(&mut conn)
        .map_err(WorkflowError::from)?;

        if affected == 0 {
            let current = self.get_meeting(request_id)?;
            return Err(self
                .cas_conflict(RequestKind::Meeting, current.status.as_str(), target)
                .into());
        }

        self.get_meeting(request_id)
    }
}
