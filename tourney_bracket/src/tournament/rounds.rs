//! Round naming shared by every bracket consumer.

/// Name of `round_number` in a bracket of `total_rounds` rounds.
///
/// Counts back from the last round: "Final", "Semifinals", "Quarterfinals",
/// then "Round {n}" for everything earlier.
pub fn round_name(total_rounds: u32, round_number: u32) -> String {
    match total_rounds.checked_sub(round_number) {
        Some(0) => "Final".to_string(),
        Some(1) => "Semifinals".to_string(),
        Some(2) => "Quarterfinals".to_string(),
        _ => format!("Round {round_number}"),
    }
}

/// Number of rounds needed for `entrants` in single elimination (`ceil(log2(n))`)
pub fn total_rounds_for(entrants: u32) -> u32 {
    entrants.max(1).next_power_of_two().trailing_zeros()
}

/// Number of first-round positions for `entrants` (`2^total_rounds`)
pub fn bracket_size_for(entrants: u32) -> u32 {
    1 << total_rounds_for(entrants)
}

/// Matches played in `round_number` of a bracket with `bracket_size` positions
pub fn matches_in_round(bracket_size: u32, round_number: u32) -> u32 {
    bracket_size >> round_number
}
