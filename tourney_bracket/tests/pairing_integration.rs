//! Integration tests for cross-squad member pairing in team tournaments

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tourney_bracket::clock::FixedClock;
use tourney_bracket::store::MemoryStore;
use tourney_bracket::tournament::{
    Squad, TournamentConfig, TournamentError, TournamentManager,
};
use uuid::Uuid;

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn manager() -> TournamentManager {
    TournamentManager::new(Arc::new(MemoryStore::new()))
        .with_clock(Arc::new(FixedClock::new(base_time())))
        .with_rng_seed(7)
}

fn team_config(capacity: u32) -> TournamentConfig {
    let start = base_time() + Duration::days(1);
    TournamentConfig::team("Clan Wars", "chess", capacity, start, start + Duration::hours(5))
}

/// Squad with a manager and `roster_size - 1` further members
fn squad(name: &str, roster_size: usize) -> Squad {
    let manager_id = Uuid::new_v4();
    let mut roster = vec![manager_id];
    roster.extend((1..roster_size).map(|_| Uuid::new_v4()));
    Squad {
        id: Uuid::new_v4(),
        name: name.to_string(),
        manager_id,
        roster,
    }
}

#[tokio::test]
async fn test_team_join_requires_registered_squad() {
    let manager = manager();
    let tournament = manager.create_tournament(team_config(2)).await.unwrap();

    let err = manager.join(tournament.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TournamentError::NotFound { entity: "squad", .. }));
}

#[tokio::test]
async fn test_unknown_squad_reported_before_capacity() {
    let manager = manager();
    let tournament = manager.create_tournament(team_config(2)).await.unwrap();
    for name in ["Red", "Blue"] {
        let squad = manager.register_squad(squad(name, 2)).await.unwrap();
        manager.join(tournament.id, squad.id).await.unwrap();
    }

    let err = manager.join(tournament.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TournamentError::NotFound { entity: "squad", .. }));
}

#[tokio::test]
async fn test_failed_auto_pairing_is_reported_on_join() {
    let manager = manager();
    let tournament = manager.create_tournament(team_config(1)).await.unwrap();
    let lonely = manager.register_squad(squad("Lonely", 3)).await.unwrap();

    let outcome = manager.join(tournament.id, lonely.id).await.unwrap();
    assert_eq!(outcome.participant.entrant_id, lonely.id);
    assert!(outcome.pairings.is_none());
    assert!(matches!(
        outcome.pairing_error,
        Some(TournamentError::PairingGenerationFailed(_))
    ));

    // The join stands
    let stored = manager.tournament(tournament.id).await.unwrap();
    assert_eq!(stored.current_participants, 1);
    assert!(!stored.pairings_generated);
}

#[tokio::test]
async fn test_full_roster_triggers_pairing() {
    let manager = manager();
    let tournament = manager.create_tournament(team_config(2)).await.unwrap();
    let red = manager.register_squad(squad("Red", 3)).await.unwrap();
    let blue = manager.register_squad(squad("Blue", 3)).await.unwrap();

    manager.join(tournament.id, red.id).await.unwrap();
    assert!(manager.pairings(tournament.id).await.unwrap().is_empty());

    let outcome = manager.join(tournament.id, blue.id).await.unwrap();
    assert!(outcome.pairing_error.is_none());
    assert_eq!(outcome.pairings.map(|set| set.pairings.len()), Some(3));

    let pairings = manager.pairings(tournament.id).await.unwrap();
    assert_eq!(pairings.len(), 3);
    assert!(manager.tournament(tournament.id).await.unwrap().pairings_generated);

    let mut seen = HashSet::new();
    for (index, pairing) in pairings.iter().enumerate() {
        assert_eq!(pairing.pair_number, index as u32 + 1);
        assert_ne!(pairing.squad1, pairing.squad2);
        assert!(seen.insert(pairing.member1));
        assert!(seen.insert(pairing.member2));
    }
    assert_eq!(seen.len(), 6);
}

#[tokio::test]
async fn test_regeneration_requires_confirmation() {
    let manager = manager();
    let tournament = manager.create_tournament(team_config(2)).await.unwrap();
    for name in ["Red", "Blue"] {
        let squad = manager.register_squad(squad(name, 4)).await.unwrap();
        manager.join(tournament.id, squad.id).await.unwrap();
    }

    let err = manager
        .generate_pairings(tournament.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, TournamentError::PairingConfirmationRequired));

    let set = manager.generate_pairings(tournament.id, true).await.unwrap();
    assert_eq!(set.pairings.len(), 4);
    assert!(set.unpaired.is_empty());
    assert_eq!(manager.pairings(tournament.id).await.unwrap(), set.pairings);
}

#[tokio::test]
async fn test_uneven_squads_leave_members_unpaired() {
    let manager = manager();
    let tournament = manager.create_tournament(team_config(3)).await.unwrap();
    let big = manager.register_squad(squad("Big", 5)).await.unwrap();
    let small = manager.register_squad(squad("Small", 2)).await.unwrap();
    manager.join(tournament.id, big.id).await.unwrap();
    manager.join(tournament.id, small.id).await.unwrap();

    let set = manager.generate_pairings(tournament.id, false).await.unwrap();
    assert_eq!(set.pairings.len(), 2);
    assert_eq!(set.unpaired.len(), 3);
    assert!(set.unpaired.iter().all(|m| big.roster.contains(m)));
}

#[tokio::test]
async fn test_single_squad_cannot_be_paired() {
    let manager = manager();
    let tournament = manager.create_tournament(team_config(4)).await.unwrap();
    let lonely = manager.register_squad(squad("Lonely", 4)).await.unwrap();
    manager.join(tournament.id, lonely.id).await.unwrap();

    let err = manager
        .generate_pairings(tournament.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, TournamentError::PairingGenerationFailed(_)));
    assert!(!manager.tournament(tournament.id).await.unwrap().pairings_generated);
}

#[tokio::test]
async fn test_solo_tournament_has_no_pairings() {
    let manager = manager();
    let start = base_time() + Duration::days(1);
    let config = TournamentConfig::solo("Solo", "chess", 4, start, start + Duration::hours(1));
    let tournament = manager.create_tournament(config).await.unwrap();

    let err = manager
        .generate_pairings(tournament.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, TournamentError::PairingGenerationFailed(_)));
}

#[tokio::test]
async fn test_leave_clears_pairings() {
    let manager = manager();
    let tournament = manager.create_tournament(team_config(2)).await.unwrap();
    let red = manager.register_squad(squad("Red", 2)).await.unwrap();
    let blue = manager.register_squad(squad("Blue", 2)).await.unwrap();
    manager.join(tournament.id, red.id).await.unwrap();
    manager.join(tournament.id, blue.id).await.unwrap();
    assert_eq!(manager.pairings(tournament.id).await.unwrap().len(), 2);

    manager.leave(tournament.id, blue.id).await.unwrap();

    assert!(manager.pairings(tournament.id).await.unwrap().is_empty());
    let stored = manager.tournament(tournament.id).await.unwrap();
    assert!(!stored.pairings_generated);
    assert_eq!(stored.current_participants, 1);
}
