use std::fmt;

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Agent,
    Mission,
    Target,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Mission => "mission",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which lifecycle rule rejected a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("assigned")]
    MissionAssigned,
    #[error("already assigned or missing")]
    AlreadyAssignedOrMissing,
    #[error("mission completed")]
    MissionCompleted,
    #[error("target or mission completed")]
    TargetOrMissionCompleted,
    #[error("not found or already complete")]
    TargetMissingOrComplete,
    #[error("target completed")]
    TargetCompleted,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },
    #[error("invariant violation: {0}")]
    InvariantViolation(Violation),
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub(crate) fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn violation(&self) -> Option<Violation> {
        match self {
            Self::InvariantViolation(violation) => Some(*violation),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Lock contention that outlived the busy timeout. The caller may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Persistence(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

impl From<Violation> for StoreError {
    fn from(violation: Violation) -> Self {
        Self::InvariantViolation(violation)
    }
}
