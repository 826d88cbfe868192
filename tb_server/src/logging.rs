//! Logging for the tournament server.
//!
//! `tourney_bracket` logs through the `log` facade and the subscriber set up
//! here bridges those records, so a single `RUST_LOG` filter covers both the
//! engine and the HTTP layer.

use std::time::Duration;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,tourney_bracket=info,sqlx=warn,hyper=warn";

/// Tournament operations at or above this are logged at warn
pub const SLOW_OPERATION: Duration = Duration::from_millis(500);

/// Install the global subscriber.
///
/// ```no_run
/// tb_server::logging::init();
/// tracing::info!("bracket server starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

pub fn is_slow(elapsed: Duration) -> bool {
    elapsed >= SLOW_OPERATION
}

/// Record the duration of a manager operation. Returns whether it was slow.
pub fn log_operation(operation: &str, tournament_id: Option<Uuid>, elapsed: Duration) -> bool {
    let duration_ms = elapsed.as_millis() as u64;
    let slow = is_slow(elapsed);
    if slow {
        tracing::warn!(operation, ?tournament_id, duration_ms, "Slow tournament operation");
    } else {
        tracing::debug!(operation, ?tournament_id, duration_ms, "Tournament operation finished");
    }
    slow
}

/// One line per completed HTTP request; server errors are logged at error
pub fn log_api_request(request_id: &str, method: &str, path: &str, status: u16, elapsed: Duration) {
    let duration_ms = elapsed.as_millis() as u64;
    if status >= 500 {
        tracing::error!(request_id, method, path, status, duration_ms, "Request failed");
    } else {
        tracing::info!(request_id, method, path, status, duration_ms, "Request completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_threshold() {
        assert!(!is_slow(Duration::from_millis(20)));
        assert!(is_slow(SLOW_OPERATION));
        assert!(is_slow(Duration::from_secs(3)));
    }

    #[test]
    fn test_log_operation_reports_slowness() {
        let tournament_id = Some(Uuid::new_v4());
        assert!(!log_operation("submit_result", tournament_id, Duration::from_millis(4)));
        assert!(log_operation("build_bracket", tournament_id, Duration::from_secs(2)));
        assert!(!log_operation("register_squad", None, Duration::ZERO));
    }

    #[test]
    fn test_log_api_request_any_status() {
        log_api_request("req-1", "GET", "/api/v1/tournaments", 200, Duration::from_millis(3));
        log_api_request("req-2", "POST", "/api/v1/matches/x/result", 409, Duration::from_millis(9));
        log_api_request("req-3", "GET", "/health", 503, Duration::from_millis(1));
    }
}
