use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{Difficulty, LeaderboardEntry, NewUser, ScoreDelta, User, UserRecord, Word};
use crate::db::store::{UserStore, WordStore};
use crate::error::{AppError, DatabaseError};

/// Words available when no database is configured.
const DEFAULT_WORDS: &[(&str, Difficulty)] = &[
    ("apple", Difficulty::Easy),
    ("house", Difficulty::Easy),
    ("river", Difficulty::Easy),
    ("garden", Difficulty::Easy),
    ("planet", Difficulty::Easy),
    ("bridge", Difficulty::Medium),
    ("whisper", Difficulty::Medium),
    ("lantern", Difficulty::Medium),
    ("compass", Difficulty::Medium),
    ("harvest", Difficulty::Medium),
    ("labyrinth", Difficulty::Hard),
    ("quixotic", Difficulty::Hard),
    ("rhythm", Difficulty::Hard),
    ("jazzy", Difficulty::Hard),
    ("zephyr", Difficulty::Hard),
];

/// Process-local store for development and tests. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<Uuid, UserRecord>>>,
    words: Arc<RwLock<Vec<Word>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words(words: Vec<Word>) -> Self {
        Self {
            users: Arc::default(),
            words: Arc::new(RwLock::new(words)),
        }
    }

    pub fn with_default_words() -> Self {
        Self::with_words(
            DEFAULT_WORDS
                .iter()
                .map(|(text, difficulty)| Word::new(*text, *difficulty))
                .collect(),
        )
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).map(UserRecord::profile))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(DatabaseError::Duplicate(format!("email {}", user.email)).into());
        }

        let record = UserRecord::new(user.name, user.email, user.password_hash);
        let profile = record.profile();
        users.insert(record.id, record);
        Ok(profile)
    }

    async fn increment_stats(&self, id: Uuid, delta: ScoreDelta) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|record| {
            record.apply(&delta);
            record.profile()
        }))
    }

    async fn top_by_score(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError> {
        let users = self.users.read().await;
        let mut ranked: Vec<&UserRecord> = users.values().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.created_at.cmp(&b.created_at)));

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|user| LeaderboardEntry {
                name: user.name.clone(),
                score: user.score,
                wins: user.wins,
                games_played: user.games_played,
            })
            .collect())
    }
}

#[async_trait]
impl WordStore for MemoryStore {
    async fn sample_one(&self, difficulty: Option<Difficulty>) -> Result<Option<String>, AppError> {
        let words = self.words.read().await;
        let candidates: Vec<&Word> = words
            .iter()
            .filter(|word| difficulty.map_or(true, |d| word.difficulty == d))
            .collect();

        Ok(candidates
            .choose(&mut rand::thread_rng())
            .map(|word| word.text.clone()))
    }
}
