//! Authentication module for the Hangman server
//!
//! Stateless JWT sessions carried as bearer header or cookie, bcrypt
//! passwords, input rules and per-caller rate limiting.

pub mod extract;
pub mod handlers;
pub mod password;
mod rate_limit;
mod service;
pub mod validation;

pub use extract::{client_identifier, extract_credential, CredentialSource, TOKEN_COOKIE};
pub use password::PasswordHasher;
pub use service::{TokenService, Claims};
pub use rate_limit::{RateLimiter, RateLimitConfig, RateLimitPolicy, RateLimitAction, RateLimitDecision};
