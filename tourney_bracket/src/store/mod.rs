//! Document store abstraction for tournament state.
//!
//! The engine never talks to a database directly. It opens a
//! [`StoreTransaction`], reads what it needs, stages writes and commits.
//! A transaction that loses a race fails its commit with
//! [`StoreError::Conflict`] and leaves nothing behind; the caller retries the
//! whole operation. Reads outside a transaction are snapshot reads.

use async_trait::async_trait;
use thiserror::Error;

use crate::tournament::models::{
    EntrantId, Match, MatchId, MemberPairing, Participant, Squad, SquadId, Tournament,
    TournamentId,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrent transaction committed first
    #[error("Transaction conflict")]
    Conflict,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Stored data failed to decode
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Tournament document store
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Open a read-modify-write transaction
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;

    async fn tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// All tournaments, newest first
    async fn tournaments(&self) -> StoreResult<Vec<Tournament>>;

    /// Participants in registration order
    async fn participants(&self, id: TournamentId) -> StoreResult<Vec<Participant>>;

    async fn matches(&self, id: TournamentId) -> StoreResult<Vec<Match>>;

    async fn pairings(&self, id: TournamentId) -> StoreResult<Vec<MemberPairing>>;

    /// Insert or replace a squad on behalf of the team registry
    async fn put_squad(&self, squad: &Squad) -> StoreResult<()>;
}

/// One atomic unit of work.
///
/// Writes become visible only on [`StoreTransaction::commit`]. Reads return
/// committed state; a transaction does not observe its own staged writes.
/// Dropping a transaction discards it.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Read a tournament; it becomes the serialization point for this
    /// transaction
    async fn tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    async fn put_tournament(&mut self, tournament: &Tournament) -> StoreResult<()>;

    async fn insert_tournament(&mut self, tournament: &Tournament) -> StoreResult<()>;

    async fn participant(
        &mut self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> StoreResult<Option<Participant>>;

    async fn participants(&mut self, tournament_id: TournamentId)
    -> StoreResult<Vec<Participant>>;

    async fn put_participant(&mut self, participant: &Participant) -> StoreResult<()>;

    async fn delete_participant(
        &mut self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> StoreResult<()>;

    /// Tournament owning a match
    async fn match_tournament(&mut self, match_id: MatchId) -> StoreResult<Option<TournamentId>>;

    async fn matches(&mut self, tournament_id: TournamentId) -> StoreResult<Vec<Match>>;

    /// Insert or replace matches by id
    async fn put_matches(&mut self, matches: &[Match]) -> StoreResult<()>;

    async fn squads(&mut self, ids: &[SquadId]) -> StoreResult<Vec<Squad>>;

    /// Replace every pairing of a tournament
    async fn replace_pairings(
        &mut self,
        tournament_id: TournamentId,
        pairings: &[MemberPairing],
    ) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
