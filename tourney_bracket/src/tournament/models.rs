//! Tournament data models for single-elimination events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{self, TournamentStatus};

/// Tournament ID type
pub type TournamentId = Uuid;

/// Entrant ID type (a user for solo/duo events, a squad for team events)
pub type EntrantId = Uuid;

/// Match ID type
pub type MatchId = Uuid;

/// Squad ID type
pub type SquadId = Uuid;

/// Squad member ID type
pub type MemberId = Uuid;

/// Largest capacity a tournament may declare; counters are stored as INTEGER
pub const MAX_CAPACITY: u32 = i32::MAX as u32;

/// Tournament format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// One player per entrant
    Solo,
    /// Two-player entrants
    Duo,
    /// Squads; members are paired across squads
    Team,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::Solo => "solo",
            TournamentFormat::Duo => "duo",
            TournamentFormat::Team => "team",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "solo" => Some(TournamentFormat::Solo),
            "duo" => Some(TournamentFormat::Duo),
            "team" => Some(TournamentFormat::Team),
            _ => None,
        }
    }
}

/// Prize amounts for the podium
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizePool {
    pub first: i64,
    pub second: i64,
    pub third: i64,
}

impl PrizePool {
    pub fn new(first: i64, second: i64, third: i64) -> Self {
        Self {
            first,
            second,
            third,
        }
    }

    /// Prize for a final placement
    pub fn payout_for(&self, placement: Placement) -> i64 {
        match placement {
            Placement::First => self.first,
            Placement::Second => self.second,
            Placement::Third => self.third,
        }
    }
}

/// Final podium placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    First,
    Second,
    /// Shared by both semifinal losers
    Third,
}

impl Placement {
    pub fn rank(&self) -> u8 {
        match self {
            Placement::First => 1,
            Placement::Second => 2,
            Placement::Third => 3,
        }
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(Placement::First),
            2 => Some(Placement::Second),
            3 => Some(Placement::Third),
            _ => None,
        }
    }
}

/// Payment state of an entry, owned by the external payment collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Free tournament
    NotRequired,
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::NotRequired => "not_required",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_required" => Some(PaymentStatus::NotRequired),
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Tournament creation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub title: String,
    pub game: String,
    pub format: TournamentFormat,
    /// Maximum number of entrants
    pub capacity: u32,
    pub entry_fee: i64,
    pub prizes: PrizePool,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl TournamentConfig {
    /// Create a free solo tournament
    pub fn solo(
        title: impl Into<String>,
        game: impl Into<String>,
        capacity: u32,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            game: game.into(),
            format: TournamentFormat::Solo,
            capacity,
            entry_fee: 0,
            prizes: PrizePool::default(),
            start_at,
            end_at,
        }
    }

    /// Create a free team tournament
    pub fn team(
        title: impl Into<String>,
        game: impl Into<String>,
        capacity: u32,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Self {
        Self {
            format: TournamentFormat::Team,
            ..Self::solo(title, game, capacity, start_at, end_at)
        }
    }

    pub fn with_entry_fee(mut self, entry_fee: i64) -> Self {
        self.entry_fee = entry_fee;
        self
    }

    pub fn with_prizes(mut self, prizes: PrizePool) -> Self {
        self.prizes = prizes;
        self
    }

    /// Check the configuration, returning the reason it is rejected
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.capacity == 0 {
            return Err("capacity must be at least 1".to_string());
        }
        if self.capacity > MAX_CAPACITY {
            return Err(format!("capacity must not exceed {MAX_CAPACITY}"));
        }
        if self.start_at >= self.end_at {
            return Err("start must be before end".to_string());
        }
        if self.entry_fee < 0 {
            return Err(format!("entry fee must not be negative: {}", self.entry_fee));
        }
        let prizes = self.prizes;
        if prizes.first < 0 || prizes.second < 0 || prizes.third < 0 {
            return Err("prize amounts must not be negative".to_string());
        }
        Ok(())
    }
}

/// Tournament document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub title: String,
    pub game: String,
    pub format: TournamentFormat,
    pub capacity: u32,
    pub current_participants: u32,
    pub entry_fee: i64,
    pub prizes: PrizePool,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Manual status; wins over the date-derived status when set
    pub status_override: Option<TournamentStatus>,
    /// Zero until the bracket is built
    pub total_rounds: u32,
    pub current_round: u32,
    pub bracket_generated: bool,
    pub pairings_generated: bool,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    pub fn new(config: TournamentConfig, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: config.title,
            game: config.game,
            format: config.format,
            capacity: config.capacity,
            current_participants: 0,
            entry_fee: config.entry_fee,
            prizes: config.prizes,
            start_at: config.start_at,
            end_at: config.end_at,
            status_override: None,
            total_rounds: 0,
            current_round: 0,
            bracket_generated: false,
            pairings_generated: false,
            created_at,
        }
    }

    /// Effective status at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> TournamentStatus {
        status::determine_status(now, self.start_at, self.end_at, self.status_override)
    }

    pub fn is_full(&self) -> bool {
        self.current_participants >= self.capacity
    }

    pub fn remaining_slots(&self) -> u32 {
        self.capacity.saturating_sub(self.current_participants)
    }
}

/// Participant record keyed by (tournament, entrant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub tournament_id: TournamentId,
    pub entrant_id: EntrantId,
    pub joined_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub placement: Option<Placement>,
    pub prize_amount: Option<i64>,
}

/// Match state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Completed => "completed",
        }
    }
}

/// One bracket slot, addressed by (round, match number)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// 1-based round index
    pub round_number: u32,
    /// 1-based slot index within the round
    pub match_number: u32,
    pub contestant1: Option<EntrantId>,
    pub contestant2: Option<EntrantId>,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub winner: Option<EntrantId>,
    pub status: MatchStatus,
    pub is_bye: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Empty shell waiting for both contestants
    pub fn shell(tournament_id: TournamentId, round_number: u32, match_number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round_number,
            match_number,
            contestant1: None,
            contestant2: None,
            score1: None,
            score2: None,
            winner: None,
            status: MatchStatus::Pending,
            is_bye: false,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Both contestants known and no result yet
    pub fn is_ready(&self) -> bool {
        self.contestant1.is_some() && self.contestant2.is_some() && !self.is_completed()
    }

    /// Loser of a completed, non-bye match
    pub fn loser(&self) -> Option<EntrantId> {
        let winner = self.winner?;
        match (self.contestant1, self.contestant2) {
            (Some(c1), Some(c2)) if c1 == winner => Some(c2),
            (Some(c1), Some(c2)) if c2 == winner => Some(c1),
            _ => None,
        }
    }

    /// Slot in the next round that receives this match's winner
    pub fn next_match_number(&self) -> u32 {
        self.match_number.div_ceil(2)
    }

    /// Odd slots feed contestant 1 of the next match, even slots contestant 2
    pub fn feeds_first_slot(&self) -> bool {
        self.match_number % 2 == 1
    }
}

/// Squad registered by the external team system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squad {
    pub id: SquadId,
    pub name: String,
    pub manager_id: MemberId,
    pub roster: Vec<MemberId>,
}

impl Squad {
    /// Manager followed by roster, without duplicates
    pub fn members(&self) -> Vec<MemberId> {
        let mut members = Vec::with_capacity(self.roster.len() + 1);
        members.push(self.manager_id);
        for member in &self.roster {
            if !members.contains(member) {
                members.push(*member);
            }
        }
        members
    }
}

/// Cross-squad 1:1 duel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPairing {
    pub tournament_id: TournamentId,
    /// 1-based
    pub pair_number: u32,
    pub member1: MemberId,
    pub squad1: SquadId,
    pub member2: MemberId,
    pub squad2: SquadId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn config() -> TournamentConfig {
        let start = Utc::now() + Duration::days(1);
        TournamentConfig::solo("Weekly Cup", "chess", 8, start, start + Duration::hours(4))
    }

    #[test]
    fn test_config_validation() {
        assert!(config().validate().is_ok());

        let mut zero_capacity = config();
        zero_capacity.capacity = 0;
        assert!(zero_capacity.validate().is_err());

        let mut huge = config();
        huge.capacity = MAX_CAPACITY + 1;
        assert!(huge.validate().unwrap_err().contains("capacity"));
        huge.capacity = MAX_CAPACITY;
        assert!(huge.validate().is_ok());

        let mut inverted = config();
        inverted.end_at = inverted.start_at - Duration::hours(1);
        assert!(inverted.validate().is_err());

        let negative_fee = config().with_entry_fee(-5);
        assert!(negative_fee.validate().is_err());

        let negative_prize = config().with_prizes(PrizePool::new(100, -1, 0));
        assert!(negative_prize.validate().is_err());
    }

    #[test]
    fn test_team_config_keeps_fields() {
        let solo = config();
        let team = TournamentConfig::team(
            "Squad Clash",
            "chess",
            4,
            solo.start_at,
            solo.end_at,
        );
        assert_eq!(team.format, TournamentFormat::Team);
        assert_eq!(team.capacity, 4);
    }

    #[test]
    fn test_remaining_slots() {
        let mut tournament = Tournament::new(config(), Utc::now());
        assert_eq!(tournament.remaining_slots(), 8);
        tournament.current_participants = 8;
        assert!(tournament.is_full());
        assert_eq!(tournament.remaining_slots(), 0);
    }

    #[test]
    fn test_match_slot_arithmetic() {
        let tid = Uuid::new_v4();
        let m1 = Match::shell(tid, 1, 1);
        let m4 = Match::shell(tid, 1, 4);
        let m5 = Match::shell(tid, 1, 5);
        assert_eq!(m1.next_match_number(), 1);
        assert!(m1.feeds_first_slot());
        assert_eq!(m4.next_match_number(), 2);
        assert!(!m4.feeds_first_slot());
        assert_eq!(m5.next_match_number(), 3);
    }

    #[test]
    fn test_match_loser() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut m = Match::shell(Uuid::new_v4(), 1, 1);
        m.contestant1 = Some(a);
        m.contestant2 = Some(b);
        assert_eq!(m.loser(), None);
        m.winner = Some(b);
        assert_eq!(m.loser(), Some(a));
    }

    #[test]
    fn test_squad_members_dedupes_manager() {
        let manager = Uuid::new_v4();
        let other = Uuid::new_v4();
        let squad = Squad {
            id: Uuid::new_v4(),
            name: "Rooks".to_string(),
            manager_id: manager,
            roster: vec![manager, other],
        };
        assert_eq!(squad.members(), vec![manager, other]);
    }

    #[test]
    fn test_placement_ranks() {
        assert_eq!(Placement::from_rank(3), Some(Placement::Third));
        assert_eq!(Placement::from_rank(4), None);
        let prizes = PrizePool::new(500, 300, 100);
        assert_eq!(prizes.payout_for(Placement::Second), 300);
    }
}
