use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::parse_stored_decimal;
use crate::workflows::WorkflowError;

/// The request kinds the engine runs. Each kind owns a transition table in
/// `workflows_machine`; adding a kind means adding a table, not new branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    Verification,
    Withdrawal,
    Meeting,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestKind::Verification => "VERIFICATION",
            RequestKind::Withdrawal => "WITHDRAWAL",
            RequestKind::Meeting => "MEETING",
        };
        write!(f, "{}", s)
    }
}

/// Status shared across all request kinds. Which statuses a kind can reach,
/// and in what order, is defined solely by its transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
    Scheduled,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Processed => "PROCESSED",
            RequestStatus::Scheduled => "SCHEDULED",
            RequestStatus::Completed => "COMPLETED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(RequestStatus::Pending),
            "APPROVED" => Ok(RequestStatus::Approved),
            "REJECTED" => Ok(RequestStatus::Rejected),
            "PROCESSED" => Ok(RequestStatus::Processed),
            "SCHEDULED" => Ok(RequestStatus::Scheduled),
            "COMPLETED" => Ok(RequestStatus::Completed),
            "CANCELLED" => Ok(RequestStatus::Cancelled),
            other => Err(WorkflowError::InvalidData(format!(
                "Unknown request status: {}",
                other
            ))),
        }
    }
}

/// Urgency attached to withdrawal and meeting requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "LOW",
            Urgency::Normal => "NORMAL",
            Urgency::High => "HIGH",
            Urgency::Urgent => "URGENT",
        }
    }
}

impl FromStr for Urgency {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Urgency::Low),
            "NORMAL" => Ok(Urgency::Normal),
            "HIGH" => Ok(Urgency::High),
            "URGENT" => Ok(Urgency::Urgent),
            other => Err(WorkflowError::InvalidData(format!(
                "Unknown urgency: {}",
                other
            ))),
        }
    }
}

/// How a requested meeting is held. Video meetings require a link before
/// they can be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingType {
    #[default]
    Video,
    Phone,
    InPerson,
}

impl MeetingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingType::Video => "VIDEO",
            MeetingType::Phone => "PHONE",
            MeetingType::InPerson => "IN_PERSON",
        }
    }
}

impl FromStr for MeetingType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VIDEO" => Ok(MeetingType::Video),
            "PHONE" => Ok(MeetingType::Phone),
            "IN_PERSON" => Ok(MeetingType::InPerson),
            other => Err(WorkflowError::InvalidData(format!(
                "Unknown meeting type: {}",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Verification requests
// ---------------------------------------------------------------------------

/// Domain model for an account-verification request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: String,
    pub user_id: String,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub reviewer_id: Option<String>,
    pub requested_at: NaiveDateTime,
    pub reviewed_at: Option<NaiveDateTime>,
}

/// Input model for submitting a verification request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVerificationRequest {
    pub user_id: String,
}

impl NewVerificationRequest {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.user_id.trim().is_empty() {
            return Err(WorkflowError::InvalidData(
                "User ID cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for verification requests
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::verification_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VerificationRequestDB {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub admin_notes: Option<String>,
    pub reviewer_id: Option<String>,
    pub requested_at: NaiveDateTime,
    pub reviewed_at: Option<NaiveDateTime>,
}

/// Changeset for a verification review. `admin_notes` is `None` when the
/// reviewer left no note, and a `None` field is not written, so earlier
/// notes survive.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::verification_requests)]
pub struct VerificationReviewChangeset {
    pub status: String,
    pub reviewer_id: Option<String>,
    pub admin_notes: Option<String>,
    pub reviewed_at: Option<NaiveDateTime>,
}

impl From<VerificationRequestDB> for VerificationRequest {
    fn from(db: VerificationRequestDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            status: RequestStatus::from_str(&db.status).unwrap_or(RequestStatus::Pending),
            admin_notes: db.admin_notes,
            reviewer_id: db.reviewer_id,
            requested_at: db.requested_at,
            reviewed_at: db.reviewed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Withdrawal requests
// ---------------------------------------------------------------------------

/// Domain model for a withdrawal request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub id: String,
    pub loan_id: String,
    pub user_id: String,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub urgency: Urgency,
    pub notes: Option<String>,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub reviewer_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub reviewed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

/// Input model for submitting a withdrawal request. The owning loan is
/// resolved from the user at submit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWithdrawalRequest {
    pub user_id: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewWithdrawalRequest {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.user_id.trim().is_empty() {
            return Err(WorkflowError::InvalidData(
                "User ID cannot be empty".to_string(),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(WorkflowError::InvalidData(
                "Withdrawal amount must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for withdrawal requests
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::withdrawal_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WithdrawalRequestDB {
    pub id: String,
    pub loan_id: String,
    pub user_id: String,
    pub amount: String,
    pub reason: Option<String>,
    pub urgency: String,
    pub notes: Option<String>,
    pub status: String,
    pub admin_notes: Option<String>,
    pub reviewer_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub reviewed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

/// Changeset for a withdrawal review; `None` fields are left untouched.
/// `reviewed_at` marks the admin decision, `completed_at` the financial
/// completion.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::withdrawal_requests)]
pub struct WithdrawalReviewChangeset {
    pub status: String,
    pub reviewer_id: Option<String>,
    pub admin_notes: Option<String>,
    pub reviewed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

impl From<WithdrawalRequestDB> for WithdrawalRequest {
    fn from(db: WithdrawalRequestDB) -> Self {
        Self {
            id: db.id,
            loan_id: db.loan_id,
            user_id: db.user_id,
            amount: parse_stored_decimal(&db.amount, "amount"),
            reason: db.reason,
            urgency: Urgency::from_str(&db.urgency).unwrap_or_default(),
            notes: db.notes,
            status: RequestStatus::from_str(&db.status).unwrap_or(RequestStatus::Pending),
            admin_notes: db.admin_notes,
            reviewer_id: db.reviewer_id,
            created_at: db.created_at,
            reviewed_at: db.reviewed_at,
            completed_at: db.completed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Meeting requests
// ---------------------------------------------------------------------------

/// Domain model for a meeting request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRequest {
    pub id: String,
    pub user_id: String,
    pub purpose: String,
    pub topics: Option<String>,
    pub notes: Option<String>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub meeting_type: MeetingType,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
    pub meeting_link: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for submitting a meeting request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeetingRequest {
    pub user_id: String,
    pub purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub meeting_type: MeetingType,
    #[serde(default)]
    pub urgency: Urgency,
}

impl NewMeetingRequest {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.user_id.trim().is_empty() {
            return Err(WorkflowError::InvalidData(
                "User ID cannot be empty".to_string(),
            ));
        }
        if self.purpose.trim().is_empty() {
            return Err(WorkflowError::InvalidData(
                "Meeting purpose cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scheduling payload supplied with a meeting review
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSchedule {
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
    pub meeting_link: Option<String>,
}

/// Database model for meeting requests
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::meeting_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MeetingRequestDB {
    pub id: String,
    pub user_id: String,
    pub purpose: String,
    pub topics: Option<String>,
    pub notes: Option<String>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub meeting_type: String,
    pub urgency: String,
    pub status: String,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
    pub meeting_link: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Changeset for a meeting review; `None` fields are left untouched, so a
/// later completion or cancellation keeps the schedule and notes written at
/// scheduling time.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::meeting_requests)]
pub struct MeetingReviewChangeset {
    pub status: String,
    pub admin_notes: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
    pub meeting_link: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl From<MeetingRequestDB> for MeetingRequest {
    fn from(db: MeetingRequestDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            purpose: db.purpose,
            topics: db.topics,
            notes: db.notes,
            preferred_date: db.preferred_date,
            preferred_time: db.preferred_time,
            meeting_type: MeetingType::from_str(&db.meeting_type).unwrap_or_default(),
            urgency: Urgency::from_str(&db.urgency).unwrap_or_default(),
            status: RequestStatus::from_str(&db.status).unwrap_or(RequestStatus::Pending),
            scheduled_date: db.scheduled_date,
            scheduled_time: db.scheduled_time,
            meeting_link: db.meeting_link,
            admin_notes: db.admin_notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
