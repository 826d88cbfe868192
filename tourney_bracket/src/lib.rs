//! # Tourney Bracket
//!
//! A single-elimination tournament engine: registration, bracket
//! construction with byes, result adjudication and cross-squad member
//! pairing for team events.
//!
//! All state lives behind the [`store::TournamentStore`] seam. Each
//! mutating operation runs as one store transaction; conflicting commits are
//! retried from a fresh read, so concurrent joins never overfill a
//! tournament and concurrent results never lose an advancement.
//!
//! ## Core Modules
//!
//! - [`tournament`]: Domain types, bracket logic and the [`TournamentManager`]
//! - [`store`]: Transactional persistence (in-memory and PostgreSQL)
//! - [`db`]: Connection pool configuration and query timeouts
//! - [`clock`]: Time source used to derive lifecycle status
//!
//! ## Example
//!
//! ```
//! use tourney_bracket::tournament::{round_name, rounds::total_rounds_for};
//!
//! let rounds = total_rounds_for(6);
//! assert_eq!(rounds, 3);
//! assert_eq!(round_name(rounds, 3), "Final");
//! assert_eq!(round_name(rounds, 1), "Quarterfinals");
//! ```

/// Time source.
pub mod clock;

/// Database connection and timeouts.
pub mod db;

/// Transactional tournament storage.
pub mod store;

/// Tournament domain logic.
pub mod tournament;

pub use clock::{Clock, FixedClock, SystemClock};
pub use store::{MemoryStore, PgStore, StoreError, TournamentStore};
pub use tournament::{
    Bracket, ManagerConfig, TournamentConfig, TournamentError, TournamentManager,
    TournamentResult, TournamentStatus,
};
