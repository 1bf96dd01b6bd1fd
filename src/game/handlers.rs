use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::auth::handlers::parse_json;
use crate::auth::validation::{validate_score, FieldErrors};
use crate::auth::RateLimitAction;
use crate::db::{Difficulty, LeaderboardEntry, ScoreDelta, User};
use crate::error::{AppError, AuthError};
use crate::game::LEADERBOARD_SIZE;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RandomWordQuery {
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WordResponse {
    pub word: String,
}

/// Field types are checked by hand so each gets its own message.
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub score: Option<Value>,
    pub win: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub top: Vec<LeaderboardEntry>,
}

impl ScoreRequest {
    fn validate(&self) -> Result<(i64, bool), AppError> {
        let mut errors = FieldErrors::new();

        let score = match &self.score {
            None | Some(Value::Null) => {
                errors.missing("score", "Score");
                None
            }
            Some(Value::Number(n)) => match n.as_i64() {
                Some(score) => {
                    errors.check("score", validate_score(score));
                    Some(score)
                }
                None => {
                    errors.check("score", Err("Score must be an integer".into()));
                    None
                }
            },
            Some(_) => {
                errors.check("score", Err("Score must be a number".into()));
                None
            }
        };

        let win = match &self.win {
            None | Some(Value::Null) => {
                errors.missing("win", "Win status");
                None
            }
            Some(Value::Bool(win)) => Some(*win),
            Some(_) => {
                errors.check("win", Err("Win status must be a boolean".into()));
                None
            }
        };

        errors.into_result("Validation failed")?;
        match (score, win) {
            (Some(score), Some(win)) => Ok((score, win)),
            _ => Err(AppError::validation("Validation failed")),
        }
    }
}

pub async fn random_word(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.rate_limiter.enforce(RateLimitAction::Api, &req).await?;

    // Parsed by hand so a bad query string is rate limited and gets the JSON error body.
    let query = web::Query::<RandomWordQuery>::from_query(req.query_string())
        .map_err(|e| AppError::validation(format!("Invalid query string: {}", e)))?;
    let difficulty = query
        .difficulty
        .as_deref()
        .map(str::parse::<Difficulty>)
        .transpose()
        .map_err(AppError::validation)?;

    let word = state
        .words
        .sample_one(difficulty)
        .await?
        .ok_or_else(|| AppError::NotFound("No words available in database".into()))?;

    Ok(HttpResponse::Ok().json(WordResponse { word }))
}

pub async fn submit_score(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.rate_limiter.enforce(RateLimitAction::Score, &req).await?;

    let user = state
        .tokens
        .resolve(&req, state.users.as_ref())
        .await
        .ok_or(AuthError::Unauthenticated)?;

    let payload: ScoreRequest = parse_json(&body)?;
    let (score, win) = payload.validate()?;

    let updated = state
        .users
        .increment_stats(user.id, ScoreDelta::for_game(score, win))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(
        "Score submitted by user {}: {} points, {}",
        user.id,
        score,
        if win { "win" } else { "loss" }
    );

    Ok(HttpResponse::Ok().json(ScoreResponse { user: updated }))
}

pub async fn leaderboard(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let top = state.users.top_by_score(LEADERBOARD_SIZE).await?;
    Ok(HttpResponse::Ok().json(LeaderboardResponse { top }))
}
