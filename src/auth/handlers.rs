use actix_web::http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use actix_web::{web, HttpResponse, HttpRequest, HttpResponseBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::AppState;
use crate::auth::service::TokenService;
use crate::auth::validation::{validate_email, validate_name, validate_password, FieldErrors};
use crate::auth::RateLimitAction;
use crate::db::{AuthUser, NewUser, User};
use crate::error::{AppError, AuthError, DatabaseError};
use tracing::{info, warn, error};

/// Parses a JSON request body, mapping every failure to a validation error.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    if body.is_empty() {
        return Err(AppError::validation("Request body is required and must be a valid JSON object"));
    }
    Ok(serde_json::from_slice(body)?)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: AuthUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<User>,
}

/// Token in the body for bearer use, and the same token as a cookie.
fn session_response(
    mut builder: HttpResponseBuilder,
    tokens: &TokenService,
    user: &User,
    token: String,
) -> HttpResponse {
    builder
        .cookie(tokens.to_cookie(&token))
        .json(AuthResponse {
            user: AuthUser::from(user),
            token,
        })
}

pub async fn login(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.rate_limiter.enforce(RateLimitAction::Login, &req).await?;

    let payload: LoginRequest = parse_json(&body)?;
    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    let password = payload.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Missing email or password"));
    }

    info!("Received login request for email: {}", email);

    // Unknown email and wrong password share one answer.
    let record = match state.users.find_by_email(email).await? {
        Some(record) => record,
        None => {
            warn!("Login failed for email {}: no such account", email);
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    if !state.hasher.verify(password, &record.password_hash).await? {
        warn!("Login failed for email {}: password mismatch", email);
        return Err(AuthError::InvalidCredentials.into());
    }

    let user = record.profile();
    let token = state.tokens.issue(&user.id.to_string())?;
    info!("Login successful for user {}", user.id);

    Ok(session_response(HttpResponse::Ok(), &state.tokens, &user, token))
}

pub async fn signup(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.rate_limiter.enforce(RateLimitAction::Signup, &req).await?;

    let payload: SignupRequest = parse_json(&body)?;
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    let password = payload.password.as_deref().unwrap_or_default();

    let mut errors = FieldErrors::new();
    errors.check("name", validate_name(name));
    errors.check("email", validate_email(email));
    errors.check("password", validate_password(password));
    errors.into_result("Validation failed")?;

    info!("Received signup request for email: {}", email);

    if state.users.find_by_email(email).await?.is_some() {
        warn!("Signup rejected, email already registered: {}", email);
        return Err(DatabaseError::Duplicate(format!("email {}", email)).into());
    }

    let password_hash = state.hasher.hash(password).await?;
    let user = state
        .users
        .create(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await
        .map_err(|e| {
            error!("Signup failed for email {}: {}", email, e);
            e
        })?;

    let token = state.tokens.issue(&user.id.to_string())?;
    info!("Signup successful for user {}", user.id);

    Ok(session_response(HttpResponse::Created(), &state.tokens, &user, token))
}

/// Clears the cookie copy of the token. Bearer copies stay valid until they
/// expire.
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(state.tokens.clear_cookie())
        .insert_header((CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
        .insert_header((PRAGMA, "no-cache"))
        .insert_header((EXPIRES, "0"))
        .json(serde_json::json!({
            "message": "Logged out successfully"
        }))
}

pub async fn me(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.rate_limiter.enforce(RateLimitAction::Api, &req).await?;

    let user = state.tokens.resolve(&req, state.users.as_ref()).await;
    Ok(HttpResponse::Ok().json(MeResponse { user }))
}
