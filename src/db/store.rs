use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{Difficulty, LeaderboardEntry, NewUser, ScoreDelta, User, UserRecord};
use crate::error::AppError;

// Port for account storage used by the auth and score handlers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Profile lookup; the projection never includes the password hash.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// Fails with `DatabaseError::Duplicate` when the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn increment_stats(&self, id: Uuid, delta: ScoreDelta) -> Result<Option<User>, AppError>;

    async fn top_by_score(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError>;
}

// Port for the word list.
#[async_trait]
pub trait WordStore: Send + Sync {
    async fn sample_one(&self, difficulty: Option<Difficulty>) -> Result<Option<String>, AppError>;
}
