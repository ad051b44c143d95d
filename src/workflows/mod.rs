// Module declarations
pub(crate) mod workflows_errors;
pub(crate) mod workflows_machine;
pub(crate) mod workflows_model;
pub(crate) mod workflows_repository;
pub(crate) mod workflows_service;
pub(crate) mod workflows_traits;

// Re-export the public interface
pub use workflows_errors::WorkflowError;
pub use workflows_machine::TransitionTable;
pub use workflows_model::{
    MeetingRequest, MeetingSchedule, MeetingType, NewMeetingRequest, NewVerificationRequest,
    NewWithdrawalRequest, RequestKind, RequestStatus, Urgency, VerificationRequest,
    WithdrawalRequest,
};
pub use workflows_repository::WorkflowRepository;
pub use workflows_service::WorkflowService;
pub use workflows_traits::{WorkflowRepositoryTrait, WorkflowServiceTrait};
