pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod game;

use std::sync::Arc;
use std::time::Duration;
use actix_web::{middleware::DefaultHeaders, web, HttpResponse};
use tracing::{info, warn};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{PasswordHasher, RateLimiter, RateLimitConfig, TokenService};
pub use db::{DbOperations, MemoryStore, User, UserStore, WordStore};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub users: Arc<dyn UserStore>,
    pub words: Arc<dyn WordStore>,
    pub tokens: Arc<TokenService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub hasher: PasswordHasher,
}

impl AppState {
    /// Connects to Postgres when `database.url` is set, otherwise falls back
    /// to the in-memory store.
    pub async fn new(config: Settings) -> Result<Self> {
        match config.database.url.clone() {
            Some(url) => {
                let db = DbOperations::new_with_options(
                    &url,
                    config.database.max_connections,
                    Duration::from_secs(5),
                )
                .await?;
                db.migrate().await?;
                info!("Connected to database");

                let db = Arc::new(db);
                Self::with_stores(config, db.clone(), db)
            }
            None => {
                warn!("No database configured, using in-memory storage");
                let store = Arc::new(MemoryStore::with_default_words());
                Self::with_stores(config, store.clone(), store)
            }
        }
    }

    /// Fails when the JWT secret is missing; the server must not start without it.
    pub fn with_stores(
        config: Settings,
        users: Arc<dyn UserStore>,
        words: Arc<dyn WordStore>,
    ) -> Result<Self> {
        let tokens = TokenService::from_config(&config.auth)?;
        let rate_limiter = RateLimiter::new(RateLimitConfig::from(&config.rate_limit));
        let hasher = PasswordHasher::new(config.auth.bcrypt_cost);

        Ok(Self {
            config: Arc::new(config),
            users,
            words,
            tokens: Arc::new(tokens),
            rate_limiter: Arc::new(rate_limiter),
            hasher,
        })
    }
}

fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("X-XSS-Protection", "1; mode=block"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add(("Content-Security-Policy", "default-src 'self'"))
}

/// Route table shared by the binary and the integration tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    use auth::handlers::{login, logout, me, signup};
    use game::handlers::{leaderboard, random_word, submit_score};

    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api")
            .wrap(security_headers())
            .route("/auth/login", web::post().to(login))
            .route("/auth/signup", web::post().to(signup))
            .route("/auth/logout", web::post().to(logout))
            .route("/auth/me", web::get().to(me))
            .route("/game/random", web::get().to(random_word))
            .route("/score/submit", web::post().to(submit_score))
            .route("/leaderboard", web::get().to(leaderboard)),
    );
}
