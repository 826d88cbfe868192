//! Single-elimination bracket construction and result adjudication.
//!
//! A bracket is an arena of [`Match`] records addressed by `(round, slot)`.
//! Every round is created when the bracket is built; later rounds start as
//! empty shells. Slot `i` of round `r` is fed by slots `2i-1` and `2i` of
//! round `r-1`, so recording a result only ever fills an existing slot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{TournamentError, TournamentResult};
use super::models::{EntrantId, Match, MatchId, MatchStatus, Placement, TournamentId};
use super::rounds;

/// Derived bracket view: round number to matches ordered by slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub total_rounds: u32,
    pub rounds: BTreeMap<u32, Vec<Match>>,
    /// Sole entrant of a zero-round bracket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walkover: Option<EntrantId>,
}

impl Bracket {
    /// Group matches into rounds, ordering each round by slot
    pub fn from_matches(total_rounds: u32, matches: Vec<Match>) -> Self {
        let mut rounds: BTreeMap<u32, Vec<Match>> = BTreeMap::new();
        for m in matches {
            rounds.entry(m.round_number).or_default().push(m);
        }
        for round in rounds.values_mut() {
            round.sort_by_key(|m| m.match_number);
        }
        Self {
            total_rounds,
            rounds,
            walkover: None,
        }
    }

    pub fn round(&self, round_number: u32) -> &[Match] {
        self.rounds
            .get(&round_number)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn round_name(&self, round_number: u32) -> String {
        rounds::round_name(self.total_rounds, round_number)
    }

    /// `(round, name)` for every round, first to last
    pub fn round_names(&self) -> Vec<(u32, String)> {
        self.rounds
            .keys()
            .map(|&r| (r, self.round_name(r)))
            .collect()
    }

    pub fn get(&self, round_number: u32, match_number: u32) -> Option<&Match> {
        let index = match_number.checked_sub(1)? as usize;
        self.rounds.get(&round_number)?.get(index)
    }

    fn get_mut(&mut self, round_number: u32, match_number: u32) -> Option<&mut Match> {
        let index = match_number.checked_sub(1)? as usize;
        self.rounds.get_mut(&round_number)?.get_mut(index)
    }

    pub fn find(&self, match_id: MatchId) -> Option<&Match> {
        self.matches().find(|m| m.id == match_id)
    }

    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.values().flatten()
    }

    pub fn into_matches(self) -> Vec<Match> {
        self.rounds.into_values().flatten().collect()
    }

    pub fn bye_count(&self) -> usize {
        self.round(1).iter().filter(|m| m.is_bye).count()
    }

    pub fn is_round_complete(&self, round_number: u32) -> bool {
        let round = self.round(round_number);
        !round.is_empty() && round.iter().all(Match::is_completed)
    }

    /// Winner of the final once played, or the walkover entrant
    pub fn champion(&self) -> Option<EntrantId> {
        if self.total_rounds == 0 {
            return self.walkover;
        }
        let last = self.round(self.total_rounds);
        match last {
            [final_match] if final_match.is_completed() => final_match.winner,
            _ => None,
        }
    }

    /// Write `winner` of `from` into its slot in the next round.
    ///
    /// Returns the updated next-round match, or `None` when `from` is in the
    /// last round.
    fn advance_winner(&mut self, from: &Match, winner: EntrantId) -> Option<Match> {
        if from.round_number >= self.total_rounds {
            return None;
        }
        let next = self.get_mut(from.round_number + 1, from.next_match_number())?;
        if from.feeds_first_slot() {
            next.contestant1 = Some(winner);
        } else {
            next.contestant2 = Some(winner);
        }
        Some(next.clone())
    }
}

/// Shape of a freshly built bracket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPlan {
    pub total_rounds: u32,
    pub bracket_size: u32,
    pub bye_count: u32,
    pub bracket: Bracket,
}

impl BracketPlan {
    /// Single entrant: nothing to play, the entrant wins outright
    pub fn walkover_winner(&self, entrants: &[EntrantId]) -> Option<EntrantId> {
        match entrants {
            [only] if self.total_rounds == 0 => Some(*only),
            _ => None,
        }
    }
}

/// Standard bracket order of seeds for `size` positions.
///
/// Adjacent pairs of the returned list meet in round one, and the top two
/// seeds sit in opposite halves: `[1, 8, 4, 5, 2, 7, 3, 6]` for eight.
pub fn seed_order(size: u32) -> Vec<u32> {
    let mut order = vec![1u32];
    let mut len = 1u32;
    while len < size {
        len *= 2;
        order = order
            .into_iter()
            .flat_map(|seed| [seed, len + 1 - seed])
            .collect();
    }
    order
}

/// Build every round of a bracket for `entrants`, in seed order.
///
/// Positions whose seed exceeds the entrant count are byes: the match gets
/// only `contestant1`, is completed immediately and its entrant is written
/// into round two.
pub fn build_bracket(
    tournament_id: TournamentId,
    entrants: &[EntrantId],
    now: DateTime<Utc>,
) -> TournamentResult<BracketPlan> {
    if entrants.is_empty() {
        return Err(TournamentError::InsufficientEntrants(0));
    }

    let n = u32::try_from(entrants.len())
        .map_err(|_| TournamentError::InvalidSeeding("too many entrants".to_string()))?;
    let total_rounds = rounds::total_rounds_for(n);
    let bracket_size = rounds::bracket_size_for(n);
    let bye_count = bracket_size - n;

    if total_rounds == 0 {
        return Ok(BracketPlan {
            total_rounds,
            bracket_size,
            bye_count,
            bracket: Bracket {
                walkover: entrants.first().copied(),
                ..Bracket::default()
            },
        });
    }

    let entrant_for_seed = |seed: u32| entrants.get(seed as usize - 1).copied();

    let order = seed_order(bracket_size);
    let mut matches = Vec::with_capacity(bracket_size as usize - 1);
    for (index, pair) in order.chunks(2).enumerate() {
        let mut m = Match::shell(tournament_id, 1, index as u32 + 1);
        m.contestant1 = entrant_for_seed(pair[0]);
        m.contestant2 = entrant_for_seed(pair[1]);
        if m.contestant2.is_none() {
            m.is_bye = true;
            m.winner = m.contestant1;
            m.status = MatchStatus::Completed;
            m.completed_at = Some(now);
        }
        matches.push(m);
    }

    for round in 2..=total_rounds {
        for slot in 1..=rounds::matches_in_round(bracket_size, round) {
            matches.push(Match::shell(tournament_id, round, slot));
        }
    }

    let mut bracket = Bracket::from_matches(total_rounds, matches);
    let byes: Vec<Match> = bracket.round(1).iter().filter(|m| m.is_bye).cloned().collect();
    for bye in byes {
        if let Some(winner) = bye.winner {
            bracket.advance_winner(&bye, winner);
        }
    }

    Ok(BracketPlan {
        total_rounds,
        bracket_size,
        bye_count,
        bracket,
    })
}

/// Validate a submitted score pair
pub fn validate_scores(score1: i64, score2: i64) -> TournamentResult<(u32, u32)> {
    let s1 = u32::try_from(score1).map_err(|_| TournamentError::InvalidScore(score1))?;
    let s2 = u32::try_from(score2).map_err(|_| TournamentError::InvalidScore(score2))?;
    if s1 == s2 {
        return Err(TournamentError::TiedScore(score1));
    }
    Ok((s1, s2))
}

/// Effect of one adjudicated result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultOutcome {
    pub winner: EntrantId,
    pub loser: EntrantId,
    /// The scored match followed by the next-round match it fed, if any
    pub updated: Vec<Match>,
    /// Set when the final was decided
    pub placements: Vec<(EntrantId, Placement)>,
    /// Current round after this result
    pub current_round: u32,
}

impl ResultOutcome {
    pub fn completes_tournament(&self) -> bool {
        !self.placements.is_empty()
    }
}

/// Record a result in `bracket` and advance the winner.
///
/// Scores must already be validated. `current_round` is the tournament's
/// round pointer before the result.
pub fn apply_result(
    bracket: &mut Bracket,
    match_id: MatchId,
    scores: (u32, u32),
    current_round: u32,
    now: DateTime<Utc>,
) -> TournamentResult<ResultOutcome> {
    let found = bracket
        .find(match_id)
        .ok_or_else(|| TournamentError::match_not_found(match_id))?;
    if found.is_completed() {
        return Err(TournamentError::MatchAlreadyCompleted(match_id));
    }
    let (Some(c1), Some(c2)) = (found.contestant1, found.contestant2) else {
        return Err(TournamentError::MatchNotReady(match_id));
    };
    let (round_number, match_number) = (found.round_number, found.match_number);

    let (score1, score2) = scores;
    let (winner, loser) = if score1 > score2 { (c1, c2) } else { (c2, c1) };

    let scored = {
        let m = bracket
            .get_mut(round_number, match_number)
            .ok_or_else(|| TournamentError::match_not_found(match_id))?;
        m.score1 = Some(score1);
        m.score2 = Some(score2);
        m.winner = Some(winner);
        m.status = MatchStatus::Completed;
        m.completed_at = Some(now);
        m.clone()
    };

    let mut updated = vec![scored.clone()];
    if let Some(next) = bracket.advance_winner(&scored, winner) {
        updated.push(next);
    }

    let mut placements = Vec::new();
    if round_number == bracket.total_rounds {
        placements.push((winner, Placement::First));
        placements.push((loser, Placement::Second));
        if bracket.total_rounds >= 2 {
            let semifinal = bracket.total_rounds - 1;
            for semi_loser in bracket.round(semifinal).iter().filter_map(Match::loser) {
                placements.push((semi_loser, Placement::Third));
            }
        }
    }

    let mut round = current_round.max(1);
    while round < bracket.total_rounds && bracket.is_round_complete(round) {
        round += 1;
    }

    Ok(ResultOutcome {
        winner,
        loser,
        updated,
        placements,
        current_round: round,
    })
}
