use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Public profile of a player. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub games_played: i64,
    pub wins: i64,
    pub losses: i64,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// Full stored row, only needed to check a password at login.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub games_played: i64,
    pub wins: i64,
    pub losses: i64,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            games_played: 0,
            wins: 0,
            losses: 0,
            score: 0,
            created_at: Utc::now(),
        }
    }

    /// Profile projection without the hash.
    pub fn profile(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            games_played: self.games_played,
            wins: self.wins,
            losses: self.losses,
            score: self.score,
            created_at: self.created_at,
        }
    }

    pub fn apply(&mut self, delta: &ScoreDelta) {
        self.games_played += delta.games_played;
        self.wins += delta.wins;
        self.losses += delta.losses;
        self.score += delta.score;
    }
}

/// Fields needed to register an account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Identity returned by login and signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Increments applied to a player's counters after one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreDelta {
    pub games_played: i64,
    pub wins: i64,
    pub losses: i64,
    pub score: i64,
}

impl ScoreDelta {
    pub fn for_game(score: i64, win: bool) -> Self {
        Self {
            games_played: 1,
            wins: i64::from(win),
            losses: i64::from(!win),
            score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: i64,
    pub wins: i64,
    pub games_played: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub difficulty: Difficulty,
}

impl Word {
    pub fn new(text: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            text: text.into(),
            difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_has_no_password_hash() {
        let record = UserRecord::new("Ann".into(), "a@b.com".into(), "$2b$hash".into());
        let json = serde_json::to_value(record.profile()).unwrap();

        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["gamesPlayed"], 0);
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_score_delta_for_game() {
        assert_eq!(
            ScoreDelta::for_game(40, true),
            ScoreDelta { games_played: 1, wins: 1, losses: 0, score: 40 }
        );
        assert_eq!(
            ScoreDelta::for_game(0, false),
            ScoreDelta { games_played: 1, wins: 0, losses: 1, score: 0 }
        );
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("impossible".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default().to_string(), "easy");
    }
}
