//! Tournament API handlers.
//!
//! Thin JSON wrappers over [`TournamentManager`](tourney_bracket::TournamentManager).
//! Identity is supplied by the caller: entrant and squad identifiers come from
//! an external system and are passed in request bodies.
//!
//! # Examples
//!
//! Join a tournament:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments/$ID/join \
//!   -H "Content-Type: application/json" \
//!   -d '{"entrant_id": "5f1c..."}'
//! ```
//!
//! Submit a result:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/matches/$MATCH/result \
//!   -H "Content-Type: application/json" \
//!   -d '{"score1": 3, "score2": 1}'
//! ```

use std::time::Instant;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tourney_bracket::tournament::{
    Bracket, EntrantId, JoinOutcome, Match, MatchId, MemberId, MemberPairing, Participant, PaymentStatus,
    Placement, PrizePool, ResultOutcome, Squad, SquadId, Tournament, TournamentConfig,
    TournamentFormat, TournamentId, TournamentStatus,
};
use uuid::Uuid;

use super::AppState;
use super::error::ApiError;
use crate::logging;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub title: String,
    pub game: String,
    pub format: TournamentFormat,
    pub capacity: u32,
    #[serde(default)]
    pub entry_fee: i64,
    #[serde(default)]
    pub prizes: PrizePool,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl From<CreateTournamentRequest> for TournamentConfig {
    fn from(request: CreateTournamentRequest) -> Self {
        TournamentConfig {
            title: request.title,
            game: request.game,
            format: request.format,
            capacity: request.capacity,
            entry_fee: request.entry_fee,
            prizes: request.prizes,
            start_at: request.start_at,
            end_at: request.end_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TournamentStatus,
}

#[derive(Debug, Deserialize)]
pub struct EntrantRequest {
    pub entrant_id: EntrantId,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct BuildBracketRequest {
    /// Explicit seeding, best seed first; registration order when absent
    #[serde(default)]
    pub seeding: Option<Vec<EntrantId>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeneratePairingsRequest {
    #[serde(default)]
    pub confirm_replace: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResultRequest {
    pub score1: i64,
    pub score2: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterSquadRequest {
    pub id: Option<SquadId>,
    pub name: String,
    pub manager_id: MemberId,
    #[serde(default)]
    pub roster: Vec<MemberId>,
}

/// Tournament with its effective status
#[derive(Debug, Serialize)]
pub struct TournamentResponse {
    #[serde(flatten)]
    pub tournament: Tournament,
    pub status: TournamentStatus,
    pub remaining_slots: u32,
}

/// Participant record, plus the outcome of any pairing run the join triggered
#[derive(Debug, Serialize)]
pub struct JoinResponse {
    #[serde(flatten)]
    pub participant: Participant,
    pub pairings_generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_error: Option<String>,
}

impl From<JoinOutcome> for JoinResponse {
    fn from(outcome: JoinOutcome) -> Self {
        Self {
            participant: outcome.participant,
            pairings_generated: outcome.pairings.is_some(),
            pairing_error: outcome.pairing_error.map(|e| e.client_message()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoundResponse {
    pub round_number: u32,
    pub name: String,
    pub matches: Vec<Match>,
}

#[derive(Debug, Serialize)]
pub struct BracketResponse {
    pub total_rounds: u32,
    pub rounds: Vec<RoundResponse>,
    pub champion: Option<EntrantId>,
}

impl From<Bracket> for BracketResponse {
    fn from(bracket: Bracket) -> Self {
        let champion = bracket.champion();
        let total_rounds = bracket.total_rounds;
        let rounds = bracket
            .rounds
            .into_iter()
            .map(|(round_number, matches)| RoundResponse {
                round_number,
                name: tourney_bracket::tournament::round_name(total_rounds, round_number),
                matches,
            })
            .collect();
        Self {
            total_rounds,
            rounds,
            champion,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlacementResponse {
    pub entrant_id: EntrantId,
    pub placement: Placement,
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub winner: EntrantId,
    pub loser: EntrantId,
    pub current_round: u32,
    pub tournament_completed: bool,
    pub placements: Vec<PlacementResponse>,
    /// The scored match and the next-round match it fed
    pub updated: Vec<Match>,
}

impl From<ResultOutcome> for ResultResponse {
    fn from(outcome: ResultOutcome) -> Self {
        Self {
            tournament_completed: outcome.completes_tournament(),
            winner: outcome.winner,
            loser: outcome.loser,
            current_round: outcome.current_round,
            placements: outcome
                .placements
                .into_iter()
                .map(|(entrant_id, placement)| PlacementResponse {
                    entrant_id,
                    placement,
                })
                .collect(),
            updated: outcome.updated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PairingsResponse {
    pub pairings: Vec<MemberPairing>,
    pub unpaired: Vec<MemberId>,
}

fn respond(state: &AppState, tournament: Tournament) -> TournamentResponse {
    TournamentResponse {
        status: state.manager.status_of(&tournament),
        remaining_slots: tournament.remaining_slots(),
        tournament,
    }
}

/// List tournaments, optionally filtered by `?status=`
///
/// # Errors
///
/// - `400 Bad Request`: Unknown status filter
pub async fn list_tournaments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<TournamentResponse>>> {
    let filter = match query.status.as_deref() {
        Some(raw) => Some(
            TournamentStatus::parse_override(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown status filter: {raw}")))?,
        ),
        None => None,
    };

    let tournaments = state.manager.list_tournaments(filter).await?;
    Ok(Json(
        tournaments.into_iter().map(|t| respond(&state, t)).collect(),
    ))
}

/// Tournaments being played right now
pub async fn list_live_tournaments(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TournamentResponse>>> {
    let tournaments = state.manager.list_live_tournaments().await?;
    Ok(Json(
        tournaments.into_iter().map(|t| respond(&state, t)).collect(),
    ))
}

/// Create a tournament
///
/// Returns `201 Created` with the stored tournament.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Invalid configuration
pub async fn create_tournament(
    State(state): State<AppState>,
    Json(request): Json<CreateTournamentRequest>,
) -> ApiResult<(StatusCode, Json<TournamentResponse>)> {
    let tournament = state.manager.create_tournament(request.into()).await?;
    Ok((StatusCode::CREATED, Json(respond(&state, tournament))))
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<TournamentResponse>> {
    let tournament = state.manager.tournament(tournament_id).await?;
    Ok(Json(respond(&state, tournament)))
}

/// Force the tournament status forward
///
/// # Errors
///
/// - `409 Conflict`: Status would move backwards
pub async fn set_status(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<TournamentResponse>> {
    let tournament = state
        .manager
        .set_status_override(tournament_id, request.status)
        .await?;
    Ok(Json(respond(&state, tournament)))
}

/// Join a tournament
///
/// # Errors
///
/// - `404 Not Found`: Unknown tournament, or unregistered squad in a team event
/// - `409 Conflict`: Registration closed, already joined or tournament full
/// - `503 Service Unavailable`: Too much contention, retry
pub async fn join(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<EntrantRequest>,
) -> ApiResult<(StatusCode, Json<JoinResponse>)> {
    let outcome = state.manager.join(tournament_id, request.entrant_id).await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// Leave a tournament before it starts
///
/// # Errors
///
/// - `404 Not Found`: Unknown tournament or not a participant
/// - `409 Conflict`: Tournament already started
pub async fn leave(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<EntrantRequest>,
) -> ApiResult<StatusCode> {
    state.manager.leave(tournament_id, request.entrant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn participants(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<Participant>>> {
    Ok(Json(state.manager.participants(tournament_id).await?))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Path((tournament_id, entrant_id)): Path<(TournamentId, EntrantId)>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<Json<Participant>> {
    let participant = state
        .manager
        .update_payment_status(tournament_id, entrant_id, request.payment_status)
        .await?;
    Ok(Json(participant))
}

/// Build the bracket, optionally with an explicit seeding
///
/// `{}` seeds by registration order.
///
/// # Errors
///
/// - `409 Conflict`: Bracket already built or tournament completed
/// - `422 Unprocessable Entity`: No entrants, or seeding is not a permutation
///   of the roster
pub async fn build_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<BuildBracketRequest>,
) -> ApiResult<(StatusCode, Json<BracketResponse>)> {
    let started = Instant::now();

    let bracket = match request.seeding {
        Some(seeding) => {
            state
                .manager
                .build_bracket_with_seeding(tournament_id, seeding)
                .await?
        }
        None => state.manager.build_bracket(tournament_id).await?,
    };

    logging::log_operation("build_bracket", Some(tournament_id), started.elapsed());
    Ok((StatusCode::CREATED, Json(bracket.into())))
}

pub async fn get_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<BracketResponse>> {
    Ok(Json(state.manager.get_bracket(tournament_id).await?.into()))
}

/// Generate member pairings for a team tournament
///
/// # Errors
///
/// - `409 Conflict`: Pairings exist and `confirm_replace` was not set
/// - `422 Unprocessable Entity`: Not a team event, or fewer than two squads
///   have members
pub async fn generate_pairings(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<GeneratePairingsRequest>,
) -> ApiResult<(StatusCode, Json<PairingsResponse>)> {
    let set = state
        .manager
        .generate_pairings(tournament_id, request.confirm_replace)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PairingsResponse {
            pairings: set.pairings,
            unpaired: set.unpaired,
        }),
    ))
}

pub async fn get_pairings(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<MemberPairing>>> {
    Ok(Json(state.manager.pairings(tournament_id).await?))
}

/// Record a match result
///
/// # Errors
///
/// - `404 Not Found`: Unknown match
/// - `409 Conflict`: Match already decided, still waiting for a contestant, or
///   tournament completed
/// - `422 Unprocessable Entity`: Negative or tied scores
pub async fn submit_result(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Json(request): Json<ResultRequest>,
) -> ApiResult<Json<ResultResponse>> {
    let outcome = state
        .manager
        .submit_result(match_id, request.score1, request.score2)
        .await?;
    Ok(Json(outcome.into()))
}

/// Register a squad from the external team system
pub async fn register_squad(
    State(state): State<AppState>,
    Json(request): Json<RegisterSquadRequest>,
) -> ApiResult<(StatusCode, Json<Squad>)> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Squad name must not be empty".to_string()));
    }

    let squad = Squad {
        id: request.id.unwrap_or_else(Uuid::new_v4),
        name: request.name,
        manager_id: request.manager_id,
        roster: request.roster,
    };
    let squad = state.manager.register_squad(squad).await?;
    Ok((StatusCode::CREATED, Json(squad)))
}
