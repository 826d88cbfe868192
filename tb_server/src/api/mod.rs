//! HTTP API for the tournament server.
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health
//! GET  /api/v1/tournaments[?status=live]        POST /api/v1/tournaments
//! GET  /api/v1/tournaments/live
//! GET  /api/v1/tournaments/{id}                 PUT  /api/v1/tournaments/{id}/status
//! POST /api/v1/tournaments/{id}/join            POST /api/v1/tournaments/{id}/leave
//! GET  /api/v1/tournaments/{id}/participants
//! PUT  /api/v1/tournaments/{id}/participants/{entrant_id}/payment
//! POST /api/v1/tournaments/{id}/bracket         GET  /api/v1/tournaments/{id}/bracket
//! POST /api/v1/tournaments/{id}/pairings        GET  /api/v1/tournaments/{id}/pairings
//! POST /api/v1/matches/{id}/result
//! POST /api/v1/squads
//! ```
//!
//! Errors are returned as `{"error": "..."}` with a status code derived from
//! the tournament error kind (see [`error::status_for`]).
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod error;
pub mod request_id;
pub mod tournaments;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use serde_json::json;
use tourney_bracket::{TournamentManager, db::Database};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; both fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TournamentManager>,
    /// Present when running on the postgres backend
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(manager: TournamentManager) -> Self {
        Self {
            manager: Arc::new(manager),
            database: None,
        }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use tb_server::api::{create_router, AppState};
/// # use tourney_bracket::{MemoryStore, TournamentManager};
/// # use std::sync::Arc;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = TournamentManager::new(Arc::new(MemoryStore::new()));
/// let app = create_router(AppState::new(manager));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    use tournaments::*;

    Router::new()
        .route("/tournaments", get(list_tournaments).post(create_tournament))
        .route("/tournaments/live", get(list_live_tournaments))
        .route("/tournaments/{tournament_id}", get(get_tournament))
        .route("/tournaments/{tournament_id}/status", put(set_status))
        .route("/tournaments/{tournament_id}/join", post(join))
        .route("/tournaments/{tournament_id}/leave", post(leave))
        .route("/tournaments/{tournament_id}/participants", get(participants))
        .route(
            "/tournaments/{tournament_id}/participants/{entrant_id}/payment",
            put(update_payment),
        )
        .route(
            "/tournaments/{tournament_id}/bracket",
            get(get_bracket).post(build_bracket),
        )
        .route(
            "/tournaments/{tournament_id}/pairings",
            get(get_pairings).post(generate_pairings),
        )
        .route("/matches/{match_id}/result", post(submit_result))
        .route("/squads", post(register_squad))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store is reachable, `503 Service Unavailable`
/// otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let pool = match &state.database {
        Some(db) => Some(db.health().await),
        None => None,
    };
    let backend = if pool.is_some() { "postgres" } else { "memory" };
    let store_healthy = pool.is_none_or(|p| p.reachable);

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": {
            "backend": backend,
            "healthy": store_healthy,
            "pool": pool,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
