//! Tournament manager: registration, bracket building, result adjudication
//! and member pairing on top of a [`TournamentStore`].
//!
//! Every mutation is one store transaction. When a commit loses a race the
//! whole operation is re-run from a fresh read, up to
//! [`ManagerConfig::max_transaction_attempts`] times.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::bracket::{self, Bracket, ResultOutcome};
use super::errors::{TournamentError, TournamentResult};
use super::models::{
    EntrantId, MatchId, MemberPairing, Participant, PaymentStatus, Placement, Squad, Tournament,
    TournamentConfig, TournamentFormat, TournamentId,
};
use super::pairing::{PairingRandomizer, PairingSet};
use super::status::{self, TournamentStatus};
use crate::clock::{Clock, SystemClock};
use crate::store::{StoreError, TournamentStore};

/// Retry settings for store transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Attempts per operation before giving up with `Retryable`
    pub max_transaction_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_backoff`
    pub retry_backoff: Duration,
}

impl ManagerConfig {
    /// Read `TOURNEY_MAX_TX_ATTEMPTS` and `TOURNEY_RETRY_BACKOFF_MS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_transaction_attempts = std::env::var("TOURNEY_MAX_TX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &u32| n > 0)
            .unwrap_or(defaults.max_transaction_attempts);
        let retry_backoff = std::env::var("TOURNEY_RETRY_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_backoff);

        Self {
            max_transaction_attempts,
            retry_backoff,
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_transaction_attempts: 5,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

/// Successful join, plus any pairing run it triggered
#[derive(Debug)]
pub struct JoinOutcome {
    pub participant: Participant,
    /// Pairings generated because this join filled a team roster
    pub pairings: Option<PairingSet>,
    /// Failure of that automatic pairing run; the join itself is committed
    pub pairing_error: Option<TournamentError>,
}

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    store: Arc<dyn TournamentStore>,
    clock: Arc<dyn Clock>,
    rng: Arc<Mutex<StdRng>>,
    config: ManagerConfig,
}

impl TournamentManager {
    /// Create a manager using the wall clock and an OS-seeded random source
    pub fn new(store: Arc<dyn TournamentStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
            config: ManagerConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the pairing random source for reproducible pairings
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Effective status of `tournament` right now
    pub fn status_of(&self, tournament: &Tournament) -> TournamentStatus {
        tournament.status_at(self.clock.now())
    }

    /// Run `attempt` until it commits, retrying on transaction conflicts
    async fn run_transaction<T, F, Fut>(&self, operation: &'static str, attempt: F) -> TournamentResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = TournamentResult<T>>,
    {
        let attempts = self.config.max_transaction_attempts.max(1);
        for n in 1..=attempts {
            match attempt().await {
                Err(TournamentError::Store(StoreError::Conflict)) => {
                    log::debug!("{operation}: transaction conflict on attempt {n}/{attempts}");
                    if n < attempts {
                        tokio::time::sleep(self.config.retry_backoff * n).await;
                    }
                }
                result => return result,
            }
        }

        log::warn!("{operation}: giving up after {attempts} conflicting attempts");
        Err(TournamentError::Retryable { attempts })
    }

    /// Create a new tournament
    pub async fn create_tournament(&self, config: TournamentConfig) -> TournamentResult<Tournament> {
        config.validate().map_err(TournamentError::InvalidConfig)?;

        let tournament = Tournament::new(config, self.clock.now());
        let mut tx = self.store.begin().await?;
        tx.insert_tournament(&tournament).await?;
        tx.commit().await?;

        log::info!(
            "Created tournament {} '{}' ({}, capacity {})",
            tournament.id,
            tournament.title,
            tournament.format.as_str(),
            tournament.capacity
        );
        Ok(tournament)
    }

    /// Get a tournament
    pub async fn tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        self.store
            .tournament(tournament_id)
            .await?
            .ok_or(TournamentError::tournament_not_found(tournament_id))
    }

    /// List tournaments, optionally only those currently in `status_filter`
    pub async fn list_tournaments(
        &self,
        status_filter: Option<TournamentStatus>,
    ) -> TournamentResult<Vec<Tournament>> {
        let now = self.clock.now();
        let tournaments = self.store.tournaments().await?;
        Ok(match status_filter {
            Some(wanted) => tournaments
                .into_iter()
                .filter(|t| t.status_at(now) == wanted)
                .collect(),
            None => tournaments,
        })
    }

    /// Tournaments being played right now
    pub async fn list_live_tournaments(&self) -> TournamentResult<Vec<Tournament>> {
        self.list_tournaments(Some(TournamentStatus::Live)).await
    }

    /// Force a status. The lifecycle never moves backwards.
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidStatusTransition` - `status` is earlier than
    ///   the effective status
    pub async fn set_status_override(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> TournamentResult<Tournament> {
        self.run_transaction("set_status_override", move || {
            self.try_set_status_override(tournament_id, status)
        })
        .await
    }

    async fn try_set_status_override(
        &self,
        tournament_id: TournamentId,
        next: TournamentStatus,
    ) -> TournamentResult<Tournament> {
        let mut tx = self.store.begin().await?;
        let mut tournament = tx
            .tournament(tournament_id)
            .await?
            .ok_or(TournamentError::tournament_not_found(tournament_id))?;

        let current = tournament.status_at(self.clock.now());
        if !status::is_forward_transition(current, next) {
            return Err(TournamentError::InvalidStatusTransition {
                from: current,
                to: next,
            });
        }

        tournament.status_override = Some(next);
        tx.put_tournament(&tournament).await?;
        tx.commit().await?;

        log::info!("Tournament {tournament_id} status set to {next} (was {current})");
        Ok(tournament)
    }

    /// Store a squad supplied by the team registry
    pub async fn register_squad(&self, squad: Squad) -> TournamentResult<Squad> {
        self.store.put_squad(&squad).await?;
        log::debug!(
            "Registered squad {} '{}' with {} members",
            squad.id,
            squad.name,
            squad.members().len()
        );
        Ok(squad)
    }

    /// Join a tournament.
    ///
    /// Reads the tournament, checks status, duplicates and capacity, then
    /// writes the participant and the incremented counter in one commit.
    /// Filling the last slot of a team tournament triggers pairing
    /// generation. A failed pairing run does not undo the join; it is
    /// reported in [`JoinOutcome::pairing_error`].
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotFound` - Unknown tournament (or squad for team events)
    /// * `TournamentError::RegistrationClosed` - Not accepting entrants
    /// * `TournamentError::AlreadyJoined` - Entrant already registered
    /// * `TournamentError::TournamentFull` - No slot left
    pub async fn join(
        &self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> TournamentResult<JoinOutcome> {
        let (participant, tournament) = self
            .run_transaction("join", move || self.try_join(tournament_id, entrant_id))
            .await?;

        log::info!(
            "Entrant {entrant_id} joined tournament {tournament_id} ({}/{})",
            tournament.current_participants,
            tournament.capacity
        );

        let mut outcome = JoinOutcome {
            participant,
            pairings: None,
            pairing_error: None,
        };
        if tournament.format == TournamentFormat::Team
            && tournament.is_full()
            && !tournament.pairings_generated
        {
            match self.generate_pairings(tournament_id, false).await {
                Ok(set) => {
                    log::info!(
                        "Roster of tournament {tournament_id} full, generated {} pairings",
                        set.pairings.len()
                    );
                    outcome.pairings = Some(set);
                }
                Err(e) => {
                    log::warn!(
                        "Roster of tournament {tournament_id} full but pairing generation failed: {e}"
                    );
                    outcome.pairing_error = Some(e);
                }
            }
        }

        Ok(outcome)
    }

    async fn try_join(
        &self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> TournamentResult<(Participant, Tournament)> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let mut tournament = tx
            .tournament(tournament_id)
            .await?
            .ok_or(TournamentError::tournament_not_found(tournament_id))?;
        if tournament.format == TournamentFormat::Team
            && tx.squads(&[entrant_id]).await?.is_empty()
        {
            return Err(TournamentError::NotFound {
                entity: "squad",
                id: entrant_id,
            });
        }

        if !tournament.status_at(now).accepts_registrations() || tournament.bracket_generated {
            return Err(TournamentError::RegistrationClosed);
        }
        if tx.participant(tournament_id, entrant_id).await?.is_some() {
            return Err(TournamentError::AlreadyJoined(entrant_id));
        }
        if tournament.is_full() {
            return Err(TournamentError::TournamentFull);
        }

        let participant = Participant {
            tournament_id,
            entrant_id,
            joined_at: now,
            payment_status: if tournament.entry_fee == 0 {
                PaymentStatus::NotRequired
            } else {
                PaymentStatus::Pending
            },
            placement: None,
            prize_amount: None,
        };
        tournament.current_participants += 1;

        tx.put_participant(&participant).await?;
        tx.put_tournament(&tournament).await?;
        tx.commit().await?;

        Ok((participant, tournament))
    }

    /// Leave a tournament before it starts
    ///
    /// # Errors
    ///
    /// * `TournamentError::CannotLeaveAfterStart` - Tournament live, completed
    ///   or already bracketed
    /// * `TournamentError::NotFound` - Unknown tournament or not a participant
    pub async fn leave(
        &self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> TournamentResult<()> {
        let tournament = self
            .run_transaction("leave", move || self.try_leave(tournament_id, entrant_id))
            .await?;

        log::info!(
            "Entrant {entrant_id} left tournament {tournament_id} ({}/{})",
            tournament.current_participants,
            tournament.capacity
        );
        Ok(())
    }

    async fn try_leave(
        &self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> TournamentResult<Tournament> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let mut tournament = tx
            .tournament(tournament_id)
            .await?
            .ok_or(TournamentError::tournament_not_found(tournament_id))?;

        if tournament.status_at(now).has_started() || tournament.bracket_generated {
            return Err(TournamentError::CannotLeaveAfterStart);
        }
        if tx.participant(tournament_id, entrant_id).await?.is_none() {
            return Err(TournamentError::NotFound {
                entity: "participant",
                id: entrant_id,
            });
        }

        tournament.current_participants = tournament.current_participants.saturating_sub(1);
        if tournament.pairings_generated {
            // The departing squad's members are in the current pairing set
            tx.replace_pairings(tournament_id, &[]).await?;
            tournament.pairings_generated = false;
        }

        tx.delete_participant(tournament_id, entrant_id).await?;
        tx.put_tournament(&tournament).await?;
        tx.commit().await?;

        Ok(tournament)
    }

    /// Participants in registration order
    pub async fn participants(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Participant>> {
        self.tournament(tournament_id).await?;
        Ok(self.store.participants(tournament_id).await?)
    }

    /// Record the payment collaborator's view of an entry
    pub async fn update_payment_status(
        &self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
        payment_status: PaymentStatus,
    ) -> TournamentResult<Participant> {
        self.run_transaction("update_payment_status", move || async move {
            let mut tx = self.store.begin().await?;
            tx.tournament(tournament_id)
                .await?
                .ok_or(TournamentError::tournament_not_found(tournament_id))?;
            let mut participant = tx
                .participant(tournament_id, entrant_id)
                .await?
                .ok_or(TournamentError::NotFound {
                    entity: "participant",
                    id: entrant_id,
                })?;

            participant.payment_status = payment_status;
            tx.put_participant(&participant).await?;
            tx.commit().await?;
            Ok(participant)
        })
        .await
    }

    /// Build the bracket from the roster in registration order
    pub async fn build_bracket(&self, tournament_id: TournamentId) -> TournamentResult<Bracket> {
        self.run_transaction("build_bracket", move || {
            self.try_build_bracket(tournament_id, None)
        })
        .await
    }

    /// Build the bracket from an explicit seeding, best seed first.
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidSeeding` - `seeding` is not a permutation of
    ///   the roster
    pub async fn build_bracket_with_seeding(
        &self,
        tournament_id: TournamentId,
        seeding: Vec<EntrantId>,
    ) -> TournamentResult<Bracket> {
        let seeding = seeding.as_slice();
        self.run_transaction("build_bracket", move || {
            self.try_build_bracket(tournament_id, Some(seeding))
        })
        .await
    }

    async fn try_build_bracket(
        &self,
        tournament_id: TournamentId,
        seeding: Option<&[EntrantId]>,
    ) -> TournamentResult<Bracket> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let mut tournament = tx
            .tournament(tournament_id)
            .await?
            .ok_or(TournamentError::tournament_not_found(tournament_id))?;

        if tournament.bracket_generated {
            return Err(TournamentError::BracketAlreadyGenerated);
        }
        if tournament.status_override == Some(TournamentStatus::Completed) {
            return Err(TournamentError::TournamentCompleted);
        }

        let mut participants = tx.participants(tournament_id).await?;
        let roster: Vec<EntrantId> = participants.iter().map(|p| p.entrant_id).collect();
        let entrants = match seeding {
            Some(order) => validate_seeding(&roster, order)?,
            None => roster,
        };

        let plan = bracket::build_bracket(tournament_id, &entrants, now)?;
        tournament.total_rounds = plan.total_rounds;
        tournament.current_round = plan.total_rounds.min(1);
        tournament.bracket_generated = true;

        if let Some(winner) = plan.walkover_winner(&entrants) {
            tournament.status_override = Some(TournamentStatus::Completed);
            if let Some(p) = participants.iter_mut().find(|p| p.entrant_id == winner) {
                p.placement = Some(Placement::First);
                p.prize_amount = Some(tournament.prizes.payout_for(Placement::First));
                tx.put_participant(p).await?;
            }
            log::info!("Tournament {tournament_id} has a single entrant; {winner} wins by walkover");
        }

        let matches: Vec<_> = plan.bracket.matches().cloned().collect();
        tx.put_matches(&matches).await?;
        tx.put_tournament(&tournament).await?;
        tx.commit().await?;

        log::info!(
            "Built bracket for tournament {tournament_id}: {} entrants, {} rounds, {} byes",
            entrants.len(),
            plan.total_rounds,
            plan.bye_count
        );
        Ok(plan.bracket)
    }

    /// Current bracket, grouped by round (snapshot read)
    pub async fn get_bracket(&self, tournament_id: TournamentId) -> TournamentResult<Bracket> {
        let tournament = self.tournament(tournament_id).await?;
        if !tournament.bracket_generated {
            return Err(TournamentError::BracketNotGenerated);
        }
        let matches = self.store.matches(tournament_id).await?;
        let mut bracket = Bracket::from_matches(tournament.total_rounds, matches);
        if tournament.total_rounds == 0 {
            bracket.walkover = self
                .store
                .participants(tournament_id)
                .await?
                .into_iter()
                .find(|p| p.placement == Some(Placement::First))
                .map(|p| p.entrant_id);
        }
        Ok(bracket)
    }

    /// Record a match result and advance the winner.
    ///
    /// Deciding the final completes the tournament and records placements:
    /// winner first, finalist second, both semifinal losers third.
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidScore` - Negative or out-of-range score
    /// * `TournamentError::TiedScore` - Equal scores
    /// * `TournamentError::NotFound` - Unknown match
    /// * `TournamentError::TournamentCompleted` - Tournament already finished
    /// * `TournamentError::MatchAlreadyCompleted` - Result already recorded
    /// * `TournamentError::MatchNotReady` - Contestant slot still empty
    pub async fn submit_result(
        &self,
        match_id: MatchId,
        score1: i64,
        score2: i64,
    ) -> TournamentResult<ResultOutcome> {
        let scores = bracket::validate_scores(score1, score2)?;
        let outcome = self
            .run_transaction("submit_result", move || self.try_submit_result(match_id, scores))
            .await?;

        log::info!(
            "Match {match_id} decided {}-{}: {} beats {}",
            scores.0,
            scores.1,
            outcome.winner,
            outcome.loser
        );
        if outcome.completes_tournament() {
            log::info!("Tournament completed, champion {}", outcome.winner);
        }
        Ok(outcome)
    }

    async fn try_submit_result(
        &self,
        match_id: MatchId,
        scores: (u32, u32),
    ) -> TournamentResult<ResultOutcome> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let tournament_id = tx
            .match_tournament(match_id)
            .await?
            .ok_or(TournamentError::match_not_found(match_id))?;
        let mut tournament = tx
            .tournament(tournament_id)
            .await?
            .ok_or(TournamentError::tournament_not_found(tournament_id))?;

        if tournament.status_override == Some(TournamentStatus::Completed) {
            return Err(TournamentError::TournamentCompleted);
        }

        let matches = tx.matches(tournament_id).await?;
        let mut bracket = Bracket::from_matches(tournament.total_rounds, matches);
        let outcome =
            bracket::apply_result(&mut bracket, match_id, scores, tournament.current_round, now)?;

        tx.put_matches(&outcome.updated).await?;
        tournament.current_round = outcome.current_round;

        if outcome.completes_tournament() {
            tournament.status_override = Some(TournamentStatus::Completed);
            for &(entrant_id, placement) in &outcome.placements {
                if let Some(mut participant) = tx.participant(tournament_id, entrant_id).await? {
                    participant.placement = Some(placement);
                    participant.prize_amount = Some(tournament.prizes.payout_for(placement));
                    tx.put_participant(&participant).await?;
                }
            }
        }

        tx.put_tournament(&tournament).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Generate member pairings for a team tournament.
    ///
    /// Replaces any existing pairing set, which requires `confirm_replace`.
    ///
    /// # Errors
    ///
    /// * `TournamentError::PairingGenerationFailed` - Not a team tournament or
    ///   not enough squads with members
    /// * `TournamentError::PairingConfirmationRequired` - Pairings exist and
    ///   `confirm_replace` is false
    pub async fn generate_pairings(
        &self,
        tournament_id: TournamentId,
        confirm_replace: bool,
    ) -> TournamentResult<PairingSet> {
        let set = self
            .run_transaction("generate_pairings", move || {
                self.try_generate_pairings(tournament_id, confirm_replace)
            })
            .await?;

        log::info!(
            "Generated {} member pairings for tournament {tournament_id} ({} unpaired)",
            set.pairings.len(),
            set.unpaired.len()
        );
        Ok(set)
    }

    async fn try_generate_pairings(
        &self,
        tournament_id: TournamentId,
        confirm_replace: bool,
    ) -> TournamentResult<PairingSet> {
        let mut tx = self.store.begin().await?;
        let mut tournament = tx
            .tournament(tournament_id)
            .await?
            .ok_or(TournamentError::tournament_not_found(tournament_id))?;

        if tournament.format != TournamentFormat::Team {
            return Err(TournamentError::PairingGenerationFailed(format!(
                "tournament is {}, not team format",
                tournament.format.as_str()
            )));
        }
        if tournament.pairings_generated && !confirm_replace {
            return Err(TournamentError::PairingConfirmationRequired);
        }

        let squad_ids: Vec<_> = tx
            .participants(tournament_id)
            .await?
            .into_iter()
            .map(|p| p.entrant_id)
            .collect();
        let squads = tx.squads(&squad_ids).await?;

        let set = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            PairingRandomizer::new(&mut *rng).pair_squads(tournament_id, &squads)?
        };

        tx.replace_pairings(tournament_id, &set.pairings).await?;
        tournament.pairings_generated = true;
        tx.put_tournament(&tournament).await?;
        tx.commit().await?;

        Ok(set)
    }

    /// Current member pairings (snapshot read)
    pub async fn pairings(&self, tournament_id: TournamentId) -> TournamentResult<Vec<MemberPairing>> {
        self.tournament(tournament_id).await?;
        Ok(self.store.pairings(tournament_id).await?)
    }
}

/// Check that `order` is a permutation of `roster`
fn validate_seeding(roster: &[EntrantId], order: &[EntrantId]) -> TournamentResult<Vec<EntrantId>> {
    if order.len() != roster.len() {
        return Err(TournamentError::InvalidSeeding(format!(
            "expected {} entrants, got {}",
            roster.len(),
            order.len()
        )));
    }
    let mut seen = std::collections::HashSet::with_capacity(order.len());
    for entrant in order {
        if !roster.contains(entrant) {
            return Err(TournamentError::InvalidSeeding(format!(
                "{entrant} is not registered"
            )));
        }
        if !seen.insert(*entrant) {
            return Err(TournamentError::InvalidSeeding(format!(
                "{entrant} seeded twice"
            )));
        }
    }
    Ok(order.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use uuid::Uuid;

    #[test]
    fn test_validate_seeding() {
        let roster: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let reversed: Vec<Uuid> = roster.iter().rev().copied().collect();
        assert_eq!(validate_seeding(&roster, &reversed).unwrap(), reversed);

        let short = &roster[..2];
        assert!(matches!(
            validate_seeding(&roster, short),
            Err(TournamentError::InvalidSeeding(_))
        ));

        let duplicated = vec![roster[0], roster[0], roster[1]];
        assert!(matches!(
            validate_seeding(&roster, &duplicated),
            Err(TournamentError::InvalidSeeding(_))
        ));

        let stranger = vec![roster[0], roster[1], Uuid::new_v4()];
        assert!(matches!(
            validate_seeding(&roster, &stranger),
            Err(TournamentError::InvalidSeeding(_))
        ));
    }

    #[test]
    #[serial]
    fn test_manager_config_from_env() {
        // SAFETY: serialized with every other test touching the environment
        unsafe {
            std::env::set_var("TOURNEY_MAX_TX_ATTEMPTS", "9");
            std::env::set_var("TOURNEY_RETRY_BACKOFF_MS", "25");
        }
        let config = ManagerConfig::from_env();
        assert_eq!(config.max_transaction_attempts, 9);
        assert_eq!(config.retry_backoff, Duration::from_millis(25));

        unsafe {
            std::env::set_var("TOURNEY_MAX_TX_ATTEMPTS", "0");
            std::env::remove_var("TOURNEY_RETRY_BACKOFF_MS");
        }
        assert_eq!(ManagerConfig::from_env(), ManagerConfig::default());

        unsafe {
            std::env::remove_var("TOURNEY_MAX_TX_ATTEMPTS");
        }
    }
}
