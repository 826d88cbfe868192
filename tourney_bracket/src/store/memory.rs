//! In-memory store with optimistic concurrency.
//!
//! Every tournament carries a version. A transaction remembers the version
//! of each tournament it touched on first read and buffers its writes. On
//! commit the versions are checked under the store lock; any mismatch fails
//! the commit with [`StoreError::Conflict`] and the buffered writes are
//! dropped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StoreError, StoreResult, StoreTransaction, TournamentStore};
use crate::tournament::models::{
    EntrantId, Match, MatchId, MemberPairing, Participant, Squad, SquadId, Tournament,
    TournamentId,
};

#[derive(Debug, Default)]
struct MemoryState {
    tournaments: HashMap<TournamentId, Tournament>,
    versions: HashMap<TournamentId, u64>,
    participants: HashMap<TournamentId, Vec<Participant>>,
    matches: HashMap<TournamentId, Vec<Match>>,
    match_index: HashMap<MatchId, TournamentId>,
    squads: HashMap<SquadId, Squad>,
    pairings: HashMap<TournamentId, Vec<MemberPairing>>,
}

impl MemoryState {
    fn version(&self, id: TournamentId) -> u64 {
        self.versions.get(&id).copied().unwrap_or(0)
    }

    fn bump(&mut self, id: TournamentId) {
        *self.versions.entry(id).or_insert(0) += 1;
    }

    fn sorted_participants(&self, id: TournamentId) -> Vec<Participant> {
        let mut participants = self.participants.get(&id).cloned().unwrap_or_default();
        participants.sort_by_key(|p| p.joined_at);
        participants
    }

    fn apply(&mut self, write: Write) -> TournamentId {
        match write {
            Write::Tournament(t) => {
                let id = t.id;
                self.tournaments.insert(id, t);
                id
            }
            Write::Participant(p) => {
                let id = p.tournament_id;
                let list = self.participants.entry(id).or_default();
                match list.iter_mut().find(|e| e.entrant_id == p.entrant_id) {
                    Some(existing) => *existing = p,
                    None => list.push(p),
                }
                id
            }
            Write::DeleteParticipant(id, entrant_id) => {
                if let Some(list) = self.participants.get_mut(&id) {
                    list.retain(|p| p.entrant_id != entrant_id);
                }
                id
            }
            Write::Match(m) => {
                let id = m.tournament_id;
                self.match_index.insert(m.id, id);
                let list = self.matches.entry(id).or_default();
                match list.iter_mut().find(|e| e.id == m.id) {
                    Some(existing) => *existing = m,
                    None => list.push(m),
                }
                id
            }
            Write::Pairings(id, pairings) => {
                self.pairings.insert(id, pairings);
                id
            }
        }
    }
}

#[derive(Debug)]
enum Write {
    Tournament(Tournament),
    Participant(Participant),
    DeleteParticipant(TournamentId, EntrantId),
    Match(Match),
    Pairings(TournamentId, Vec<MemberPairing>),
}

/// In-memory tournament store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            state: self.state.clone(),
            observed: HashMap::new(),
            created: Vec::new(),
            writes: Vec::new(),
        }))
    }

    async fn tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        Ok(self.state.lock().await.tournaments.get(&id).cloned())
    }

    async fn tournaments(&self) -> StoreResult<Vec<Tournament>> {
        let state = self.state.lock().await;
        let mut tournaments: Vec<Tournament> = state.tournaments.values().cloned().collect();
        tournaments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(tournaments)
    }

    async fn participants(&self, id: TournamentId) -> StoreResult<Vec<Participant>> {
        Ok(self.state.lock().await.sorted_participants(id))
    }

    async fn matches(&self, id: TournamentId) -> StoreResult<Vec<Match>> {
        Ok(self
            .state
            .lock()
            .await
            .matches
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn pairings(&self, id: TournamentId) -> StoreResult<Vec<MemberPairing>> {
        Ok(self
            .state
            .lock()
            .await
            .pairings
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_squad(&self, squad: &Squad) -> StoreResult<()> {
        self.state
            .lock()
            .await
            .squads
            .insert(squad.id, squad.clone());
        Ok(())
    }
}

/// Buffered transaction over [`MemoryStore`]
pub struct MemoryTransaction {
    state: Arc<Mutex<MemoryState>>,
    /// Version of each tournament at first read
    observed: HashMap<TournamentId, u64>,
    /// Tournaments this transaction inserts
    created: Vec<TournamentId>,
    writes: Vec<Write>,
}

impl MemoryTransaction {
    fn observe(&mut self, state: &MemoryState, id: TournamentId) {
        self.observed.entry(id).or_insert_with(|| state.version(id));
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let state = self.state.clone();
        let state = state.lock().await;
        self.observe(&state, id);
        Ok(state.tournaments.get(&id).cloned())
    }

    async fn put_tournament(&mut self, tournament: &Tournament) -> StoreResult<()> {
        self.writes.push(Write::Tournament(tournament.clone()));
        Ok(())
    }

    async fn insert_tournament(&mut self, tournament: &Tournament) -> StoreResult<()> {
        self.created.push(tournament.id);
        self.writes.push(Write::Tournament(tournament.clone()));
        Ok(())
    }

    async fn participant(
        &mut self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> StoreResult<Option<Participant>> {
        let state = self.state.clone();
        let state = state.lock().await;
        self.observe(&state, tournament_id);
        Ok(state
            .participants
            .get(&tournament_id)
            .and_then(|list| list.iter().find(|p| p.entrant_id == entrant_id))
            .cloned())
    }

    async fn participants(
        &mut self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<Participant>> {
        let state = self.state.clone();
        let state = state.lock().await;
        self.observe(&state, tournament_id);
        Ok(state.sorted_participants(tournament_id))
    }

    async fn put_participant(&mut self, participant: &Participant) -> StoreResult<()> {
        self.writes.push(Write::Participant(participant.clone()));
        Ok(())
    }

    async fn delete_participant(
        &mut self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> StoreResult<()> {
        self.writes
            .push(Write::DeleteParticipant(tournament_id, entrant_id));
        Ok(())
    }

    async fn match_tournament(&mut self, match_id: MatchId) -> StoreResult<Option<TournamentId>> {
        let state = self.state.clone();
        let state = state.lock().await;
        let owner = state.match_index.get(&match_id).copied();
        if let Some(id) = owner {
            self.observe(&state, id);
        }
        Ok(owner)
    }

    async fn matches(&mut self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let state = self.state.clone();
        let state = state.lock().await;
        self.observe(&state, tournament_id);
        Ok(state
            .matches
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_matches(&mut self, matches: &[Match]) -> StoreResult<()> {
        self.writes
            .extend(matches.iter().cloned().map(Write::Match));
        Ok(())
    }

    async fn squads(&mut self, ids: &[SquadId]) -> StoreResult<Vec<Squad>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.squads.get(id).cloned())
            .collect())
    }

    async fn replace_pairings(
        &mut self,
        tournament_id: TournamentId,
        pairings: &[MemberPairing],
    ) -> StoreResult<()> {
        self.writes
            .push(Write::Pairings(tournament_id, pairings.to_vec()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction {
            state,
            observed,
            created,
            writes,
        } = *self;
        let mut state = state.lock().await;

        for (id, version) in &observed {
            if state.version(*id) != *version {
                return Err(StoreError::Conflict);
            }
        }
        for id in &created {
            if state.tournaments.contains_key(id) {
                return Err(StoreError::Conflict);
            }
        }

        let mut touched = Vec::new();
        for write in writes {
            let id = state.apply(write);
            if !touched.contains(&id) {
                touched.push(id);
            }
        }
        for id in touched {
            state.bump(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{PaymentStatus, TournamentConfig};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn tournament() -> Tournament {
        let start = Utc::now() + Duration::days(1);
        Tournament::new(
            TournamentConfig::solo("Cup", "chess", 4, start, start + Duration::hours(2)),
            Utc::now(),
        )
    }

    async fn seeded(store: &MemoryStore) -> Tournament {
        let t = tournament();
        let mut tx = store.begin().await.unwrap();
        tx.insert_tournament(&t).await.unwrap();
        tx.commit().await.unwrap();
        t
    }

    #[tokio::test]
    async fn test_listing_breaks_created_at_ties_by_id() {
        let store = MemoryStore::new();
        let created_at = Utc::now();
        let mut tx = store.begin().await.unwrap();
        for _ in 0..6 {
            let mut t = tournament();
            t.created_at = created_at;
            tx.insert_tournament(&t).await.unwrap();
        }
        tx.commit().await.unwrap();

        let listed: Vec<Uuid> = store.tournaments().await.unwrap().iter().map(|t| t.id).collect();
        let mut expected = listed.clone();
        expected.sort();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let store = MemoryStore::new();
        let t = tournament();
        let mut tx = store.begin().await.unwrap();
        tx.insert_tournament(&t).await.unwrap();
        assert!(store.tournament(t.id).await.unwrap().is_none());
        tx.commit().await.unwrap();
        assert_eq!(store.tournament(t.id).await.unwrap(), Some(t));
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_nothing() {
        let store = MemoryStore::new();
        let t = seeded(&store).await;
        {
            let mut tx = store.begin().await.unwrap();
            let mut changed = tx.tournament(t.id).await.unwrap().unwrap();
            changed.current_participants = 3;
            tx.put_tournament(&changed).await.unwrap();
        }
        let stored = store.tournament(t.id).await.unwrap().unwrap();
        assert_eq!(stored.current_participants, 0);
    }

    #[tokio::test]
    async fn test_conflicting_commit_rejected() {
        let store = MemoryStore::new();
        let t = seeded(&store).await;

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        let mut a = first.tournament(t.id).await.unwrap().unwrap();
        let mut b = second.tournament(t.id).await.unwrap().unwrap();
        a.current_participants += 1;
        b.current_participants += 1;
        first.put_tournament(&a).await.unwrap();
        second.put_tournament(&b).await.unwrap();

        first.commit().await.unwrap();
        assert!(matches!(
            second.commit().await,
            Err(StoreError::Conflict)
        ));
        let stored = store.tournament(t.id).await.unwrap().unwrap();
        assert_eq!(stored.current_participants, 1);
    }

    #[tokio::test]
    async fn test_participants_in_join_order() {
        let store = MemoryStore::new();
        let t = seeded(&store).await;
        let base = Utc::now();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate().rev() {
            let mut tx = store.begin().await.unwrap();
            tx.put_participant(&Participant {
                tournament_id: t.id,
                entrant_id: *id,
                joined_at: base + Duration::seconds(i as i64),
                payment_status: PaymentStatus::NotRequired,
                placement: None,
                prize_amount: None,
            })
            .await
            .unwrap();
            tx.commit().await.unwrap();
        }
        let listed: Vec<Uuid> = store
            .participants(t.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.entrant_id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_pairings_replaced_not_merged() {
        let store = MemoryStore::new();
        let t = seeded(&store).await;
        let pairing = |n| MemberPairing {
            tournament_id: t.id,
            pair_number: n,
            member1: Uuid::new_v4(),
            squad1: Uuid::new_v4(),
            member2: Uuid::new_v4(),
            squad2: Uuid::new_v4(),
        };

        let mut tx = store.begin().await.unwrap();
        tx.replace_pairings(t.id, &[pairing(1), pairing(2)])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.replace_pairings(t.id, &[pairing(1)]).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.pairings(t.id).await.unwrap().len(), 1);
    }
}
