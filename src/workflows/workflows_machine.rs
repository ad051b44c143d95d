use super::workflows_errors::WorkflowError;
use super::workflows_model::{RequestKind, RequestStatus};

use RequestStatus::*;

/// Transition table for one request kind. The table is the single source of
/// truth: a (from, to) pair not listed here is rejected, never ignored.
#[derive(Debug)]
pub struct TransitionTable {
    pub kind: RequestKind,
    transitions: &'static [(RequestStatus, RequestStatus)],
}

const VERIFICATION_TABLE: TransitionTable = TransitionTable {
    kind: RequestKind::Verification,
    transitions: &[(Pending, Approved), (Pending, Rejected)],
};

const WITHDRAWAL_TABLE: TransitionTable = TransitionTable {
    kind: RequestKind::Withdrawal,
    transitions: &[
        (Pending, Approved),
        (Pending, Rejected),
        // The financial side effect fires on this edge, exactly once
        (Approved, Processed),
    ],
};

const MEETING_TABLE: TransitionTable = TransitionTable {
    kind: RequestKind::Meeting,
    transitions: &[
        (Pending, Scheduled),
        (Pending, Cancelled),
        (Scheduled, Completed),
        (Scheduled, Cancelled),
    ],
};

impl TransitionTable {
    pub fn for_kind(kind: RequestKind) -> &'static TransitionTable {
        match kind {
            RequestKind::Verification => &VERIFICATION_TABLE,
            RequestKind::Withdrawal => &WITHDRAWAL_TABLE,
            RequestKind::Meeting => &MEETING_TABLE,
        }
    }

    /// Every request of every kind starts here
    pub fn initial() -> RequestStatus {
        Pending
    }

    pub fn permits(&self, from: RequestStatus, to: RequestStatus) -> bool {
        self.transitions.iter().any(|&(f, t)| f == from && t == to)
    }

    /// A status with no outgoing edges is terminal
    pub fn is_terminal(&self, status: RequestStatus) -> bool {
        !self.transitions.iter().any(|&(f, _)| f == status)
    }

    pub fn check(&self, from: RequestStatus, to: RequestStatus) -> Result<(), WorkflowError> {
        if self.permits(from, to) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                kind: self.kind,
                from,
                to,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [RequestStatus; 7] = [
        Pending, Approved, Rejected, Processed, Scheduled, Completed, Cancelled,
    ];

    const ALL_KINDS: [RequestKind; 3] = [
        RequestKind::Verification,
        RequestKind::Withdrawal,
        RequestKind::Meeting,
    ];

    fn expected(kind: RequestKind) -> Vec<(RequestStatus, RequestStatus)> {
        match kind {
            RequestKind::Verification => vec![(Pending, Approved), (Pending, Rejected)],
            RequestKind::Withdrawal => vec![
                (Pending, Approved),
                (Pending, Rejected),
                (Approved, Processed),
            ],
            RequestKind::Meeting => vec![
                (Pending, Scheduled),
                (Pending, Cancelled),
                (Scheduled, Completed),
                (Scheduled, Cancelled),
            ],
        }
    }

    #[test]
    fn every_listed_transition_is_permitted() {
        for kind in ALL_KINDS {
            let table = TransitionTable::for_kind(kind);
            for (from, to) in expected(kind) {
                assert!(table.permits(from, to), "{kind}: {from} -> {to}");
                assert!(table.check(from, to).is_ok());
            }
        }
    }

    #[test]
    fn every_unlisted_pair_is_rejected() {
        for kind in ALL_KINDS {
            let table = TransitionTable::for_kind(kind);
            let allowed = expected(kind);
            for from in ALL_STATUSES {
                for to in ALL_STATUSES {
                    if allowed.contains(&(from, to)) {
                        continue;
                    }
                    let err = table.check(from, to).unwrap_err();
                    match err {
                        WorkflowError::InvalidTransition {
                            kind: k,
                            from: f,
                            to: t,
                        } => {
                            assert_eq!(k, kind);
                            assert_eq!(f, from);
                            assert_eq!(t, to);
                        }
                        other => panic!("unexpected error: {other}"),
                    }
                }
            }
        }
    }

    #[test]
    fn processed_is_terminal_for_withdrawals() {
        let table = TransitionTable::for_kind(RequestKind::Withdrawal);
        assert!(table.is_terminal(Processed));
        assert!(table.is_terminal(Rejected));
        assert!(!table.is_terminal(Pending));
        assert!(!table.is_terminal(Approved));
    }

    #[test]
    fn terminal_states_per_kind() {
        let verification = TransitionTable::for_kind(RequestKind::Verification);
        assert!(verification.is_terminal(Approved));
        assert!(verification.is_terminal(Rejected));

        let meeting = TransitionTable::for_kind(RequestKind::Meeting);
        assert!(meeting.is_terminal(Completed));
        assert!(meeting.is_terminal(Cancelled));
        assert!(!meeting.is_terminal(Scheduled));
    }

    #[test]
    fn no_pending_to_processed_shortcut() {
        let table = TransitionTable::for_kind(RequestKind::Withdrawal);
        assert!(!table.permits(Pending, Processed));
    }
}
