//! Tournament lifecycle status, derived at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting entrants
    RegistrationOpen,
    /// Registration closed by an organizer, not started yet
    Upcoming,
    /// Matches being played
    Live,
    /// Finished
    Completed,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::RegistrationOpen => "registration_open",
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Live => "live",
            TournamentStatus::Completed => "completed",
        }
    }

    /// Parse a stored override; unrecognized values yield `None`
    pub fn parse_override(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "registration_open" => Some(TournamentStatus::RegistrationOpen),
            "upcoming" => Some(TournamentStatus::Upcoming),
            "live" => Some(TournamentStatus::Live),
            "completed" => Some(TournamentStatus::Completed),
            _ => None,
        }
    }

    /// Position in the lifecycle; registration-open and upcoming share a rank
    pub fn rank(&self) -> u8 {
        match self {
            TournamentStatus::RegistrationOpen | TournamentStatus::Upcoming => 0,
            TournamentStatus::Live => 1,
            TournamentStatus::Completed => 2,
        }
    }

    pub fn accepts_registrations(&self) -> bool {
        matches!(
            self,
            TournamentStatus::RegistrationOpen | TournamentStatus::Upcoming
        )
    }

    pub fn has_started(&self) -> bool {
        matches!(self, TournamentStatus::Live | TournamentStatus::Completed)
    }
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determine the effective status of a tournament.
///
/// An override always wins. Otherwise the status follows the schedule:
/// before `start` registration is open, within `[start, end]` the tournament
/// is live, and after `end` it is completed.
pub fn determine_status(
    now: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    status_override: Option<TournamentStatus>,
) -> TournamentStatus {
    if let Some(status) = status_override {
        return status;
    }

    if now < start {
        TournamentStatus::RegistrationOpen
    } else if now <= end {
        TournamentStatus::Live
    } else {
        TournamentStatus::Completed
    }
}

/// Whether moving from `current` to `next` keeps the lifecycle moving forward
pub fn is_forward_transition(current: TournamentStatus, next: TournamentStatus) -> bool {
    next.rank() >= current.rank()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = DateTime::parse_from_rfc3339("2026-03-01T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        (start, start + Duration::hours(3))
    }

    #[test]
    fn test_status_follows_schedule() {
        let (start, end) = window();

        let before = start - Duration::seconds(1);
        assert_eq!(
            determine_status(before, start, end, None),
            TournamentStatus::RegistrationOpen
        );
        assert_eq!(determine_status(start, start, end, None), TournamentStatus::Live);
        assert_eq!(determine_status(end, start, end, None), TournamentStatus::Live);

        let after = end + Duration::seconds(1);
        assert_eq!(
            determine_status(after, start, end, None),
            TournamentStatus::Completed
        );
    }

    #[test]
    fn test_override_always_wins() {
        let (start, end) = window();
        let before = start - Duration::hours(1);
        assert_eq!(
            determine_status(before, start, end, Some(TournamentStatus::Completed)),
            TournamentStatus::Completed
        );
        assert_eq!(
            determine_status(end + Duration::days(1), start, end, Some(TournamentStatus::Live)),
            TournamentStatus::Live
        );
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            TournamentStatus::parse_override("registration-open"),
            Some(TournamentStatus::RegistrationOpen)
        );
        assert_eq!(
            TournamentStatus::parse_override(" LIVE "),
            Some(TournamentStatus::Live)
        );
        assert_eq!(TournamentStatus::parse_override("paused"), None);
        assert_eq!(TournamentStatus::parse_override(""), None);
    }

    #[test]
    fn test_forward_transitions() {
        use TournamentStatus::*;
        assert!(is_forward_transition(RegistrationOpen, Upcoming));
        assert!(is_forward_transition(Upcoming, RegistrationOpen));
        assert!(is_forward_transition(Live, Completed));
        assert!(!is_forward_transition(Completed, Live));
        assert!(!is_forward_transition(Live, Upcoming));
    }
}
