//! Storage for the Hangman server
//!
//! Handlers only see the `UserStore` and `WordStore` ports. `DbOperations`
//! implements them on Postgres, `MemoryStore` in process memory.

pub mod memory;
pub mod models;
pub mod operations;
pub mod store;

pub use memory::MemoryStore;
pub use models::{AuthUser, Difficulty, LeaderboardEntry, NewUser, ScoreDelta, User, UserRecord, Word};
pub use operations::DbOperations;
pub use store::{UserStore, WordStore};
