//! Tournament error types.

use thiserror::Error;
use uuid::Uuid;

use super::status::TournamentStatus;
use crate::store::StoreError;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Tournament, match, participant or squad missing
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Entrant {0} already joined")]
    AlreadyJoined(Uuid),

    #[error("Tournament is full")]
    TournamentFull,

    #[error("Registration is closed")]
    RegistrationClosed,

    #[error("Cannot leave after the tournament started")]
    CannotLeaveAfterStart,

    #[error("Invalid score: {0}")]
    InvalidScore(i64),

    #[error("Tied score {0}-{0}: matches need a winner")]
    TiedScore(i64),

    #[error("Insufficient entrants: need at least 1, have {0}")]
    InsufficientEntrants(usize),

    #[error("Pairing generation failed: {0}")]
    PairingGenerationFailed(String),

    #[error("Pairings already generated; confirm replacement to regenerate")]
    PairingConfirmationRequired,

    #[error("Transaction aborted after {attempts} conflicting attempts")]
    Retryable { attempts: u32 },

    #[error("Invalid tournament configuration: {0}")]
    InvalidConfig(String),

    #[error("Status cannot move from {from} back to {to}")]
    InvalidStatusTransition {
        from: TournamentStatus,
        to: TournamentStatus,
    },

    #[error("Bracket already generated")]
    BracketAlreadyGenerated,

    #[error("Bracket not generated yet")]
    BracketNotGenerated,

    #[error("Invalid seeding: {0}")]
    InvalidSeeding(String),

    #[error("Match {0} is waiting for contestants")]
    MatchNotReady(Uuid),

    #[error("Match {0} already has a result")]
    MatchAlreadyCompleted(Uuid),

    #[error("Tournament already completed")]
    TournamentCompleted,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl TournamentError {
    pub(crate) fn tournament_not_found(id: Uuid) -> Self {
        TournamentError::NotFound {
            entity: "tournament",
            id,
        }
    }

    pub(crate) fn match_not_found(id: Uuid) -> Self {
        TournamentError::NotFound { entity: "match", id }
    }

    /// Whether the caller may simply repeat the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TournamentError::Retryable { .. } | TournamentError::Store(StoreError::Conflict)
        )
    }

    /// Get a client-safe error message
    ///
    /// Storage errors are reduced to a generic message so database details
    /// never reach API consumers.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Store(StoreError::Conflict) | TournamentError::Retryable { .. } => {
                "Tournament is busy, please retry".to_string()
            }
            TournamentError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
