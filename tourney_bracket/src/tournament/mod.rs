//! Tournament module for single-elimination events.
//!
//! This module provides tournament management functionality including:
//! - Tournament creation and date-driven lifecycle status
//! - Roster registration with capacity enforcement
//! - Bracket construction with byes and winner advancement
//! - Match result adjudication and final placements
//! - Cross-squad member pairing for team events
//!
//! ## Example
//!
//! ```no_run
//! use tourney_bracket::store::MemoryStore;
//! use tourney_bracket::tournament::{TournamentConfig, TournamentManager};
//! use chrono::{Duration, Utc};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(Arc::new(MemoryStore::new()));
//!
//!     let start = Utc::now() + Duration::days(1);
//!     let config = TournamentConfig::solo("Friday Cup", "chess", 8, start, start + Duration::hours(4));
//!     let tournament = manager.create_tournament(config).await?;
//!
//!     for _ in 0..5 {
//!         manager.join(tournament.id, Uuid::new_v4()).await?;
//!     }
//!
//!     let bracket = manager.build_bracket(tournament.id).await?;
//!     println!("{} rounds, {} byes", bracket.total_rounds, bracket.bye_count());
//!
//!     Ok(())
//! }
//! ```

pub mod bracket;
pub mod errors;
pub mod manager;
pub mod models;
pub mod pairing;
pub mod rounds;
pub mod status;

pub use bracket::{Bracket, BracketPlan, ResultOutcome};
pub use errors::{TournamentError, TournamentResult};
pub use manager::{JoinOutcome, ManagerConfig, TournamentManager};
pub use models::{
    EntrantId, Match, MatchId, MatchStatus, MemberId, MemberPairing, Participant, PaymentStatus,
    Placement, PrizePool, Squad, SquadId, Tournament, TournamentConfig, TournamentFormat,
    TournamentId,
};
pub use pairing::{PairingRandomizer, PairingSet};
pub use rounds::round_name;
pub use status::{TournamentStatus, determine_status};
