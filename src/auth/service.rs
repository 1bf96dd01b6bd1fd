use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, decode, Header, EncodingKey, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::extract::{extract_credential, TOKEN_COOKIE};
use crate::config::AuthConfig;
use crate::db::{User, UserStore};
use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub exp: i64,     // Expiration time
    pub iat: i64,     // Issued at
}

/// Issues and verifies the stateless session token.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    cookie_secure: bool,
}

impl TokenService {
    /// Refuses to build without a signing secret.
    pub fn new(jwt_secret: &str, lifetime: Duration, cookie_secure: bool) -> Result<Self, AuthError> {
        if jwt_secret.trim().is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            lifetime,
            cookie_secure,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        Self::new(
            &config.jwt_secret,
            Duration::days(config.token_expiry_days),
            config.cookie_secure,
        )
    }

    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    fn issue_at(&self, subject: &str, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        if subject.is_empty() {
            return Err(AuthError::TokenCreation("empty subject".into()));
        }

        let claims = Claims {
            sub: subject.to_string(),
            exp: (issued_at + self.lifetime).timestamp(),
            iat: issued_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Checks signature and expiry. Has no side effects.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// `Set-Cookie` carrying the token.
    pub fn to_cookie(&self, token: &str) -> Cookie<'static> {
        self.cookie(token.to_string(), time::Duration::seconds(self.lifetime.num_seconds()))
    }

    /// Expired, empty cookie that makes the browser drop the session.
    pub fn clear_cookie(&self) -> Cookie<'static> {
        self.cookie(String::new(), time::Duration::ZERO)
    }

    fn cookie(&self, value: String, max_age: time::Duration) -> Cookie<'static> {
        Cookie::build(TOKEN_COOKIE, value)
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .finish()
    }

    /// Resolves the request's credential to a user.
    ///
    /// A missing, malformed, forged or expired token, an unknown subject and
    /// a failing store all produce `None`; callers only learn whether a user
    /// is authenticated.
    pub async fn resolve(&self, req: &HttpRequest, users: &dyn UserStore) -> Option<User> {
        let (source, token) = extract_credential(req)?;

        let claims = match self.verify(&token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Rejected {:?} credential: {}", source, e);
                return None;
            }
        };

        let user_id = Uuid::parse_str(&claims.sub).ok()?;
        match users.find_by_id(user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!("User lookup failed for {}: {}", user_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockUserStore;
    use crate::error::AppError;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test::TestRequest;

    fn service() -> TokenService {
        TokenService::new("test_secret", Duration::days(7), false).unwrap()
    }

    fn user(id: Uuid) -> User {
        User {
            id,
            name: "Ann".into(),
            email: "a@b.com".into(),
            games_played: 0,
            wins: 0,
            losses: 0,
            score: 0,
            created_at: Utc::now(),
        }
    }

    fn store_with(id: Uuid) -> MockUserStore {
        let mut store = MockUserStore::new();
        store
            .expect_find_by_id()
            .returning(move |requested| Ok((requested == id).then(|| user(id))));
        store
    }

    fn bearer(token: &str) -> HttpRequest {
        TestRequest::default()
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_http_request()
    }

    #[test]
    fn test_missing_secret_fails_fast() {
        assert!(matches!(
            TokenService::new("", Duration::days(7), false),
            Err(AuthError::MissingSecret)
        ));
        assert!(matches!(
            TokenService::new("   ", Duration::days(7), false),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let token = tokens.issue("subject-1").unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, "subject-1");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        assert!(matches!(service().issue(""), Err(AuthError::TokenCreation(_))));
    }

    #[test]
    fn test_expired_token() {
        let tokens = service();
        let issued = Utc::now() - Duration::days(7) - Duration::minutes(1);
        let token = tokens.issue_at("subject-1", issued).unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_token_from_other_secret_is_invalid() {
        let other = TokenService::new("other_secret", Duration::days(7), false).unwrap();
        let token = other.issue("subject-1").unwrap();

        assert!(matches!(service().verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(service().verify("not-a-jwt"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = service().to_cookie("abc").to_string();

        assert!(cookie.starts_with("token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));

        let secure = TokenService::new("s", Duration::days(7), true).unwrap();
        assert!(secure.to_cookie("abc").to_string().contains("Secure"));
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = service().clear_cookie().to_string();
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[actix_web::test]
    async fn test_resolve_bearer_and_cookie() {
        let tokens = service();
        let id = Uuid::new_v4();
        let store = store_with(id);
        let token = tokens.issue(&id.to_string()).unwrap();

        let resolved = tokens.resolve(&bearer(&token), &store).await;
        assert_eq!(resolved.map(|u| u.id), Some(id));

        let req = TestRequest::default()
            .insert_header(("Cookie", format!("token={}", token)))
            .to_http_request();
        let resolved = tokens.resolve(&req, &store).await;
        assert_eq!(resolved.map(|u| u.id), Some(id));
    }

    #[actix_web::test]
    async fn test_resolve_tampered_token_is_none() {
        let tokens = service();
        let id = Uuid::new_v4();
        let store = store_with(id);
        let token = tokens.issue(&id.to_string()).unwrap();

        // Change the first character of the signature segment.
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{}", head, chars.into_iter().collect::<String>());

        assert!(tokens.resolve(&bearer(&tampered), &store).await.is_none());
    }

    #[actix_web::test]
    async fn test_resolve_expired_token_is_none() {
        let tokens = service();
        let id = Uuid::new_v4();
        let store = store_with(id);
        let issued = Utc::now() - Duration::days(8);
        let token = tokens.issue_at(&id.to_string(), issued).unwrap();

        assert!(tokens.resolve(&bearer(&token), &store).await.is_none());
    }

    #[actix_web::test]
    async fn test_resolve_without_credential_skips_store() {
        let mut store = MockUserStore::new();
        store.expect_find_by_id().never();

        let req = TestRequest::default().to_http_request();
        assert!(service().resolve(&req, &store).await.is_none());
    }

    #[actix_web::test]
    async fn test_resolve_deleted_user_is_none() {
        let tokens = service();
        let store = store_with(Uuid::new_v4());
        let token = tokens.issue(&Uuid::new_v4().to_string()).unwrap();

        assert!(tokens.resolve(&bearer(&token), &store).await.is_none());
    }

    #[actix_web::test]
    async fn test_resolve_store_failure_is_none() {
        let tokens = service();
        let mut store = MockUserStore::new();
        store
            .expect_find_by_id()
            .returning(|_| Err(AppError::InternalError("store down".into())));
        let token = tokens.issue(&Uuid::new_v4().to_string()).unwrap();

        assert!(tokens.resolve(&bearer(&token), &store).await.is_none());
    }
}
