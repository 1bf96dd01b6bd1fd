//! Gameplay endpoints: word supply, score submission and the leaderboard.

pub mod handlers;

/// Number of players listed on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 5;
