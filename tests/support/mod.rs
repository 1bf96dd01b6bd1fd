#![allow(dead_code)]

use actix_web::test::TestRequest;
use hangman_server::db::{Difficulty, Word};
use hangman_server::{AppState, MemoryStore, Settings};
use serde_json::json;
use std::sync::Arc;

/// State over a fresh in-memory store with a couple of words.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    test_state_with(|_| {})
}

pub fn test_state_with(adjust: impl FnOnce(&mut Settings)) -> (AppState, Arc<MemoryStore>) {
    let mut config = Settings::for_test().expect("Failed to load test config");
    adjust(&mut config);

    let store = Arc::new(MemoryStore::with_words(vec![
        Word::new("apple", Difficulty::Easy),
        Word::new("zephyr", Difficulty::Hard),
    ]));
    let state = AppState::with_stores(config, store.clone(), store.clone()).expect("Failed to build state");
    (state, store)
}

pub fn signup_request(name: &str, email: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/auth/signup")
        .insert_header(("X-Forwarded-For", "203.0.113.10"))
        .set_json(json!({ "name": name, "email": email, "password": password }))
}

pub fn login_request(email: &str, password: &str, caller: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("X-Forwarded-For", caller.to_string()))
        .set_json(json!({ "email": email, "password": password }))
}
