use crate::error::TypesError;

/// The snapshot state machine (spec §4.1). Values are the integers SQL
/// comparisons rely on (`state >= RECORDED`, etc.) — do not renumber without
/// checking every `ORDER BY`/`WHERE state >=` in `wayreel-store`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i64)]
pub enum SnapshotState {
    Queued = 0,
    Invalid = 1,
    Scouted = 2,
    Aborted = 3,
    Recorded = 4,
    Rejected = 5,
    Approved = 6,
    Published = 7,
    Withheld = 8,
}

impl SnapshotState {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(v: i64) -> Result<Self, TypesError> {
        Ok(match v {
            0 => Self::Queued,
            1 => Self::Invalid,
            2 => Self::Scouted,
            3 => Self::Aborted,
            4 => Self::Recorded,
            5 => Self::Rejected,
            6 => Self::Approved,
            7 => Self::Published,
            8 => Self::Withheld,
            other => return Err(TypesError::UnknownState(other)),
        })
    }

    /// Whether `self -> to` is one of the transitions spec §4.1 allows.
    /// `record_again` distinguishes the human-verdict APPROVED/RECORDED ->
    /// SCOUTED bump from any other backward move, which is never allowed.
    pub fn can_transition_to(self, to: Self, record_again: bool) -> bool {
        use SnapshotState::*;
        match (self, to) {
            (Queued, Scouted) => true,
            (Queued, Invalid) => true,
            (Scouted, Recorded) => true,
            (Scouted, Aborted) => true,
            (Recorded, Approved) => true,
            (Recorded, Rejected) => true,
            (Recorded, Scouted) => record_again,
            (Recorded, Published) => true, // approval disabled
            (Approved, Published) => true,
            (Approved, Scouted) => record_again,
            (Published, Recorded) => true, // re-record after cooldown
            _ => false,
        }
    }
}

impl std::fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Invalid => "INVALID",
            Self::Scouted => "SCOUTED",
            Self::Aborted => "ABORTED",
            Self::Recorded => "RECORDED",
            Self::Rejected => "REJECTED",
            Self::Approved => "APPROVED",
            Self::Published => "PUBLISHED",
            Self::Withheld => "WITHHELD",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_i64() {
        for v in 0..=8 {
            let s = SnapshotState::from_i64(v).unwrap();
            assert_eq!(s.as_i64(), v);
        }
    }

    #[test]
    fn unknown_value_is_rejected() {
        assert!(SnapshotState::from_i64(9).is_err());
    }

    #[test]
    fn record_again_is_the_only_backward_move() {
        assert!(SnapshotState::Recorded.can_transition_to(SnapshotState::Scouted, true));
        assert!(!SnapshotState::Recorded.can_transition_to(SnapshotState::Scouted, false));
        assert!(SnapshotState::Approved.can_transition_to(SnapshotState::Scouted, true));
        assert!(!SnapshotState::Published.can_transition_to(SnapshotState::Queued, true));
    }

    #[test]
    fn forward_path_is_allowed() {
        assert!(SnapshotState::Queued.can_transition_to(SnapshotState::Scouted, false));
        assert!(SnapshotState::Scouted.can_transition_to(SnapshotState::Recorded, false));
        assert!(SnapshotState::Recorded.can_transition_to(SnapshotState::Approved, false));
        assert!(SnapshotState::Approved.can_transition_to(SnapshotState::Published, false));
    }
}
