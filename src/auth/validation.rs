//! Input rules for account and score payloads.
//!
//! Each check returns the message shown next to the offending field.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_SCORE: i64 = 10_000;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

// The regex crate has no lookahead, so letter and digit presence are
// separate patterns.
static PASSWORD_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@$!%*#?&]{6,}$").expect("valid password regex"));
static HAS_LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]").expect("valid letter regex"));
static HAS_DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("valid digit regex"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s\-']{2,50}$").expect("valid name regex"));

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".into());
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err("Email is too long".into());
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Please enter a valid email address".into());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".into());
    }
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(format!("Password must be at least {} characters long", MIN_PASSWORD_LEN));
    }
    if len > MAX_PASSWORD_LEN {
        return Err("Password is too long".into());
    }

    if PASSWORD_CHARS_RE.is_match(password)
        && HAS_LETTER_RE.is_match(password)
        && HAS_DIGIT_RE.is_match(password)
    {
        Ok(())
    } else {
        Err("Password must contain at least one letter and one number".into())
    }
}

/// Expects an already trimmed name.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name is required".into());
    }
    let len = name.chars().count();
    if len < MIN_NAME_LEN {
        return Err(format!("Name must be at least {} characters long", MIN_NAME_LEN));
    }
    if len > MAX_NAME_LEN {
        return Err("Name is too long".into());
    }
    if !NAME_RE.is_match(name) {
        return Err("Name can only contain letters, spaces, hyphens, and apostrophes".into());
    }
    Ok(())
}

pub fn validate_score(score: i64) -> Result<(), String> {
    if score < 0 {
        return Err("Score cannot be negative".into());
    }
    if score > MAX_SCORE {
        return Err("Score is too high".into());
    }
    Ok(())
}

/// Collects per-field failures into a single validation error.
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.0.entry(field.to_string()).or_insert(message);
        }
    }

    pub fn missing(&mut self, field: &str, label: &str) {
        self.check(field, Err(format!("{} is required", label)));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self, message: &str) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationError {
                message: message.to_string(),
                fields: self.0,
            })
        }
    }
}
