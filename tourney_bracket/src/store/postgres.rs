//! PostgreSQL implementation of the tournament store.
//!
//! Transactions lock the tournament row with `SELECT ... FOR UPDATE`, so all
//! participant-count and bracket changes for one tournament serialize on it.
//! Serialization failures and deadlocks surface as [`StoreError::Conflict`].
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::{StoreError, StoreResult, StoreTransaction, TournamentStore};
use crate::db::timeouts::{
    DEFAULT_TRANSACTION_TIMEOUT, db_error, with_default_timeout, with_timeout,
};
use crate::tournament::models::{
    EntrantId, Match, MatchId, MatchStatus, MemberPairing, Participant, PaymentStatus, Placement,
    PrizePool, Squad, SquadId, Tournament, TournamentFormat, TournamentId,
};
use crate::tournament::status::TournamentStatus;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const TOURNAMENT_COLUMNS: &str = "id, title, game, format, capacity, current_participants, \
     entry_fee, prize_first, prize_second, prize_third, start_at, end_at, status_override, \
     total_rounds, current_round, bracket_generated, pairings_generated, created_at";

const PARTICIPANT_COLUMNS: &str =
    "tournament_id, entrant_id, joined_at, payment_status, placement, prize_amount";

const MATCH_COLUMNS: &str = "id, tournament_id, round_number, match_number, contestant1, \
     contestant2, score1, score2, winner, status, is_bye, completed_at";

/// PostgreSQL-backed tournament store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the schema if it does not exist
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TournamentStore for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = with_default_timeout(self.pool.begin()).await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1");
        let row = with_default_timeout(sqlx::query(&sql).bind(id).fetch_optional(&self.pool))
            .await?;
        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn tournaments(&self) -> StoreResult<Vec<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments ORDER BY created_at DESC, id");
        let rows = with_default_timeout(sqlx::query(&sql).fetch_all(&self.pool)).await?;
        rows.iter().map(tournament_from_row).collect()
    }

    async fn participants(&self, id: TournamentId) -> StoreResult<Vec<Participant>> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM tournament_participants \
             WHERE tournament_id = $1 ORDER BY joined_at, join_seq"
        );
        let rows = with_default_timeout(sqlx::query(&sql).bind(id).fetch_all(&self.pool)).await?;
        rows.iter().map(participant_from_row).collect()
    }

    async fn matches(&self, id: TournamentId) -> StoreResult<Vec<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches \
             WHERE tournament_id = $1 ORDER BY round_number, match_number"
        );
        let rows = with_default_timeout(sqlx::query(&sql).bind(id).fetch_all(&self.pool)).await?;
        rows.iter().map(match_from_row).collect()
    }

    async fn pairings(&self, id: TournamentId) -> StoreResult<Vec<MemberPairing>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT tournament_id, pair_number, member1, squad1, member2, squad2
                FROM member_pairings
                WHERE tournament_id = $1
                ORDER BY pair_number
                "#,
            )
            .bind(id)
            .fetch_all(&self.pool),
        )
        .await?;
        rows.iter().map(pairing_from_row).collect()
    }

    async fn put_squad(&self, squad: &Squad) -> StoreResult<()> {
        let roster = serde_json::to_value(&squad.roster)?;
        with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO squads (id, name, manager_id, roster)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name, manager_id = EXCLUDED.manager_id, roster = EXCLUDED.roster
                "#,
            )
            .bind(squad.id)
            .bind(&squad.name)
            .bind(squad.manager_id)
            .bind(roster)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

/// Transaction over [`PgStore`]; dropping it rolls back
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(id)
                .fetch_optional(&mut *self.tx),
        )
        .await?;
        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn put_tournament(&mut self, t: &Tournament) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                r#"
                UPDATE tournaments
                SET title = $2, game = $3, format = $4, capacity = $5, current_participants = $6,
                    entry_fee = $7, prize_first = $8, prize_second = $9, prize_third = $10,
                    start_at = $11, end_at = $12, status_override = $13, total_rounds = $14,
                    current_round = $15, bracket_generated = $16, pairings_generated = $17
                WHERE id = $1
                "#,
            )
            .bind(t.id)
            .bind(&t.title)
            .bind(&t.game)
            .bind(t.format.as_str())
            .bind(to_i32(t.capacity)?)
            .bind(to_i32(t.current_participants)?)
            .bind(t.entry_fee)
            .bind(t.prizes.first)
            .bind(t.prizes.second)
            .bind(t.prizes.third)
            .bind(t.start_at)
            .bind(t.end_at)
            .bind(t.status_override.map(|s| s.as_str()))
            .bind(to_i32(t.total_rounds)?)
            .bind(to_i32(t.current_round)?)
            .bind(t.bracket_generated)
            .bind(t.pairings_generated)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn insert_tournament(&mut self, t: &Tournament) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO tournaments ({TOURNAMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)"
        );
        with_default_timeout(
            sqlx::query(&sql)
                .bind(t.id)
                .bind(&t.title)
                .bind(&t.game)
                .bind(t.format.as_str())
                .bind(to_i32(t.capacity)?)
                .bind(to_i32(t.current_participants)?)
                .bind(t.entry_fee)
                .bind(t.prizes.first)
                .bind(t.prizes.second)
                .bind(t.prizes.third)
                .bind(t.start_at)
                .bind(t.end_at)
                .bind(t.status_override.map(|s| s.as_str()))
                .bind(to_i32(t.total_rounds)?)
                .bind(to_i32(t.current_round)?)
                .bind(t.bracket_generated)
                .bind(t.pairings_generated)
                .bind(t.created_at)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn participant(
        &mut self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> StoreResult<Option<Participant>> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM tournament_participants \
             WHERE tournament_id = $1 AND entrant_id = $2"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(tournament_id)
                .bind(entrant_id)
                .fetch_optional(&mut *self.tx),
        )
        .await?;
        row.as_ref().map(participant_from_row).transpose()
    }

    async fn participants(
        &mut self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<Participant>> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM tournament_participants \
             WHERE tournament_id = $1 ORDER BY joined_at, join_seq"
        );
        let rows = with_default_timeout(
            sqlx::query(&sql)
                .bind(tournament_id)
                .fetch_all(&mut *self.tx),
        )
        .await?;
        rows.iter().map(participant_from_row).collect()
    }

    async fn put_participant(&mut self, p: &Participant) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO tournament_participants
                    (tournament_id, entrant_id, joined_at, payment_status, placement, prize_amount)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (tournament_id, entrant_id) DO UPDATE
                SET payment_status = EXCLUDED.payment_status,
                    placement = EXCLUDED.placement,
                    prize_amount = EXCLUDED.prize_amount
                "#,
            )
            .bind(p.tournament_id)
            .bind(p.entrant_id)
            .bind(p.joined_at)
            .bind(p.payment_status.as_str())
            .bind(p.placement.map(|pl| i16::from(pl.rank())))
            .bind(p.prize_amount)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn delete_participant(
        &mut self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "DELETE FROM tournament_participants WHERE tournament_id = $1 AND entrant_id = $2",
            )
            .bind(tournament_id)
            .bind(entrant_id)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn match_tournament(&mut self, match_id: MatchId) -> StoreResult<Option<TournamentId>> {
        let row = with_default_timeout(
            sqlx::query("SELECT tournament_id FROM tournament_matches WHERE id = $1")
                .bind(match_id)
                .fetch_optional(&mut *self.tx),
        )
        .await?;
        row.map(|r| r.try_get::<Uuid, _>("tournament_id"))
            .transpose()
            .map_err(db_error)
    }

    async fn matches(&mut self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches \
             WHERE tournament_id = $1 ORDER BY round_number, match_number"
        );
        let rows = with_default_timeout(
            sqlx::query(&sql)
                .bind(tournament_id)
                .fetch_all(&mut *self.tx),
        )
        .await?;
        rows.iter().map(match_from_row).collect()
    }

    async fn put_matches(&mut self, matches: &[Match]) -> StoreResult<()> {
        for m in matches {
            with_default_timeout(
                sqlx::query(
                    r#"
                    INSERT INTO tournament_matches
                        (id, tournament_id, round_number, match_number, contestant1, contestant2,
                         score1, score2, winner, status, is_bye, completed_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    ON CONFLICT (id) DO UPDATE
                    SET contestant1 = EXCLUDED.contestant1,
                        contestant2 = EXCLUDED.contestant2,
                        score1 = EXCLUDED.score1,
                        score2 = EXCLUDED.score2,
                        winner = EXCLUDED.winner,
                        status = EXCLUDED.status,
                        is_bye = EXCLUDED.is_bye,
                        completed_at = EXCLUDED.completed_at
                    "#,
                )
                .bind(m.id)
                .bind(m.tournament_id)
                .bind(to_i32(m.round_number)?)
                .bind(to_i32(m.match_number)?)
                .bind(m.contestant1)
                .bind(m.contestant2)
                .bind(m.score1.map(to_i32).transpose()?)
                .bind(m.score2.map(to_i32).transpose()?)
                .bind(m.winner)
                .bind(m.status.as_str())
                .bind(m.is_bye)
                .bind(m.completed_at)
                .execute(&mut *self.tx),
            )
            .await?;
        }
        Ok(())
    }

    async fn squads(&mut self, ids: &[SquadId]) -> StoreResult<Vec<Squad>> {
        let rows = with_default_timeout(
            sqlx::query("SELECT id, name, manager_id, roster FROM squads WHERE id = ANY($1)")
                .bind(ids.to_vec())
                .fetch_all(&mut *self.tx),
        )
        .await?;

        rows.iter()
            .map(|row| {
                let roster: serde_json::Value = row.try_get("roster").map_err(db_error)?;
                Ok(Squad {
                    id: row.try_get("id").map_err(db_error)?,
                    name: row.try_get("name").map_err(db_error)?,
                    manager_id: row.try_get("manager_id").map_err(db_error)?,
                    roster: serde_json::from_value(roster)?,
                })
            })
            .collect()
    }

    async fn replace_pairings(
        &mut self,
        tournament_id: TournamentId,
        pairings: &[MemberPairing],
    ) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query("DELETE FROM member_pairings WHERE tournament_id = $1")
                .bind(tournament_id)
                .execute(&mut *self.tx),
        )
        .await?;

        for p in pairings {
            with_default_timeout(
                sqlx::query(
                    r#"
                    INSERT INTO member_pairings
                        (tournament_id, pair_number, member1, squad1, member2, squad2)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(tournament_id)
                .bind(to_i32(p.pair_number)?)
                .bind(p.member1)
                .bind(p.squad1)
                .bind(p.member2)
                .bind(p.squad2)
                .execute(&mut *self.tx),
            )
            .await?;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        with_timeout(DEFAULT_TRANSACTION_TIMEOUT, self.tx.commit()).await
    }
}

fn to_i32(value: u32) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("value out of range: {value}")))
}

fn to_u32(value: i32, column: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
}

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    let format: String = row.try_get("format").map_err(db_error)?;
    let status_override: Option<String> = row.try_get("status_override").map_err(db_error)?;

    Ok(Tournament {
        id: row.try_get("id").map_err(db_error)?,
        title: row.try_get("title").map_err(db_error)?,
        game: row.try_get("game").map_err(db_error)?,
        format: TournamentFormat::parse(&format)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown format: {format}")))?,
        capacity: to_u32(row.try_get("capacity").map_err(db_error)?, "capacity")?,
        current_participants: to_u32(
            row.try_get("current_participants").map_err(db_error)?,
            "current_participants",
        )?,
        entry_fee: row.try_get("entry_fee").map_err(db_error)?,
        prizes: PrizePool::new(
            row.try_get("prize_first").map_err(db_error)?,
            row.try_get("prize_second").map_err(db_error)?,
            row.try_get("prize_third").map_err(db_error)?,
        ),
        start_at: row.try_get("start_at").map_err(db_error)?,
        end_at: row.try_get("end_at").map_err(db_error)?,
        // Unrecognized overrides are ignored and the schedule decides
        status_override: status_override
            .as_deref()
            .and_then(TournamentStatus::parse_override),
        total_rounds: to_u32(row.try_get("total_rounds").map_err(db_error)?, "total_rounds")?,
        current_round: to_u32(
            row.try_get("current_round").map_err(db_error)?,
            "current_round",
        )?,
        bracket_generated: row.try_get("bracket_generated").map_err(db_error)?,
        pairings_generated: row.try_get("pairings_generated").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

fn participant_from_row(row: &PgRow) -> StoreResult<Participant> {
    let payment: String = row.try_get("payment_status").map_err(db_error)?;
    let placement: Option<i16> = row.try_get("placement").map_err(db_error)?;

    Ok(Participant {
        tournament_id: row.try_get("tournament_id").map_err(db_error)?,
        entrant_id: row.try_get("entrant_id").map_err(db_error)?,
        joined_at: row.try_get("joined_at").map_err(db_error)?,
        payment_status: PaymentStatus::parse(&payment)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown payment status: {payment}")))?,
        placement: placement
            .and_then(|rank| u8::try_from(rank).ok())
            .and_then(Placement::from_rank),
        prize_amount: row.try_get("prize_amount").map_err(db_error)?,
    })
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    let status: String = row.try_get("status").map_err(db_error)?;
    let score1: Option<i32> = row.try_get("score1").map_err(db_error)?;
    let score2: Option<i32> = row.try_get("score2").map_err(db_error)?;

    Ok(Match {
        id: row.try_get("id").map_err(db_error)?,
        tournament_id: row.try_get("tournament_id").map_err(db_error)?,
        round_number: to_u32(row.try_get("round_number").map_err(db_error)?, "round_number")?,
        match_number: to_u32(row.try_get("match_number").map_err(db_error)?, "match_number")?,
        contestant1: row.try_get("contestant1").map_err(db_error)?,
        contestant2: row.try_get("contestant2").map_err(db_error)?,
        score1: score1.map(|s| to_u32(s, "score1")).transpose()?,
        score2: score2.map(|s| to_u32(s, "score2")).transpose()?,
        winner: row.try_get("winner").map_err(db_error)?,
        status: match status.as_str() {
            "pending" => MatchStatus::Pending,
            "completed" => MatchStatus::Completed,
            other => return Err(StoreError::Corrupt(format!("unknown match status: {other}"))),
        },
        is_bye: row.try_get("is_bye").map_err(db_error)?,
        completed_at: row.try_get("completed_at").map_err(db_error)?,
    })
}

fn pairing_from_row(row: &PgRow) -> StoreResult<MemberPairing> {
    Ok(MemberPairing {
        tournament_id: row.try_get("tournament_id").map_err(db_error)?,
        pair_number: to_u32(row.try_get("pair_number").map_err(db_error)?, "pair_number")?,
        member1: row.try_get("member1").map_err(db_error)?,
        squad1: row.try_get("squad1").map_err(db_error)?,
        member2: row.try_get("member2").map_err(db_error)?,
        squad2: row.try_get("squad2").map_err(db_error)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DatabaseConfig};
    use crate::tournament::models::TournamentConfig;
    use chrono::{Duration, Utc};

    #[test]
    fn test_schema_defines_every_table() {
        for table in [
            "tournaments",
            "tournament_participants",
            "tournament_matches",
            "squads",
            "member_pairings",
        ] {
            assert!(SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")));
        }
    }

    #[test]
    fn test_roster_order_has_tiebreaker() {
        assert!(SCHEMA.contains("join_seq"));
    }

    #[test]
    fn test_int_conversions() {
        assert_eq!(to_i32(7).unwrap(), 7);
        assert!(matches!(to_i32(u32::MAX), Err(StoreError::Corrupt(_))));
        assert!(matches!(to_u32(-1, "score1"), Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
    async fn test_tournament_round_trip_through_postgres() {
        let db = Database::new(&DatabaseConfig::from_env())
            .await
            .expect("Failed to connect to database");
        let store = PgStore::new(db.pool().clone());
        store.migrate().await.expect("Failed to migrate");

        let start = Utc::now() + Duration::days(1);
        let tournament = Tournament::new(
            TournamentConfig::solo("Pg Cup", "chess", 8, start, start + Duration::hours(2)),
            Utc::now(),
        );
        let mut tx = store.begin().await.unwrap();
        tx.insert_tournament(&tournament).await.unwrap();
        tx.commit().await.unwrap();

        let loaded = store.tournament(tournament.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Pg Cup");
        assert_eq!(loaded.capacity, 8);
        assert_eq!(loaded.status_override, None);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
    async fn test_locked_row_read_times_out() {
        let db = Database::new(&DatabaseConfig::from_env())
            .await
            .expect("Failed to connect to database");
        let store = PgStore::new(db.pool().clone());
        store.migrate().await.expect("Failed to migrate");

        let start = Utc::now() + Duration::days(1);
        let tournament = Tournament::new(
            TournamentConfig::solo("Lock Cup", "chess", 4, start, start + Duration::hours(2)),
            Utc::now(),
        );
        let mut tx = store.begin().await.unwrap();
        tx.insert_tournament(&tournament).await.unwrap();
        tx.commit().await.unwrap();

        let mut holder = store.begin().await.unwrap();
        holder.tournament(tournament.id).await.unwrap();

        // Second FOR UPDATE blocks on the held lock until the query timeout
        let mut waiter = store.begin().await.unwrap();
        let err = waiter.tournament(tournament.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
    }
}
