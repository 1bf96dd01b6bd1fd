use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::db::models::{Difficulty, LeaderboardEntry, NewUser, ScoreDelta, User, UserRecord};
use crate::db::store::{UserStore, WordStore};
use crate::error::{AppError, DatabaseError};

const USER_COLUMNS: &str = "id, name, email, games_played, wins, losses, score, created_at";

/// Postgres-backed user and word storage.
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl UserStore for DbOperations {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, password_hash, games_played, wins, losses, score, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let record = UserRecord::new(user.name, user.email, user.password_hash);
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn increment_stats(&self, id: Uuid, delta: ScoreDelta) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET games_played = games_played + $2, wins = wins + $3, \
             losses = losses + $4, score = score + $5 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(delta.games_played)
        .bind(delta.wins)
        .bind(delta.losses)
        .bind(delta.score)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn top_by_score(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError> {
        let top = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT name, score, wins, games_played FROM users \
             ORDER BY score DESC, created_at ASC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(top)
    }
}

#[async_trait]
impl WordStore for DbOperations {
    async fn sample_one(&self, difficulty: Option<Difficulty>) -> Result<Option<String>, AppError> {
        let word: Option<(String,)> = sqlx::query_as(
            "SELECT text FROM words WHERE $1::text IS NULL OR difficulty = $1 \
             ORDER BY random() LIMIT 1",
        )
        .bind(difficulty.map(|d| d.as_str()))
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(word.map(|(text,)| text))
    }
}
