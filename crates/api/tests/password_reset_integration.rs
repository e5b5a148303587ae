//! Token-based password reset.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{count_logs, get, login, post, seed_user, setup, TestAccount};
use serde_json::json;
use shared::crypto::{generate_secure_token, sha256_hex};
use sqlx::PgPool;

async fn insert_token(pool: &PgPool, user_id: i64, expires_in: Duration) -> String {
    let token = generate_secure_token();
    sqlx::query(
        "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(sha256_hex(&token))
    .bind(Utc::now() + expires_in)
    .execute(pool)
    .await
    .unwrap();
    token
}

async fn session_count(pool: &PgPool, user_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM user_sessions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let (app, pool) = setup().await;
    let account = seed_user(&pool, "user", None).await;
    let cookie = login(&app, &account).await;
    assert_eq!(session_count(&pool, account.id).await, 1);

    let token = insert_token(&pool, account.id, Duration::minutes(60)).await;

    let response = get(&app, &format!("/reset-password?token={}", token), None).await;
    assert_eq!(response.json()["valid"], true);

    let body = json!({ "token": token, "password": "brandnew1", "confirm_password": "brandnew1" });
    let response = post(&app, "/reset-password", None, body.clone()).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(response.json()["redirect"], "/login");

    // Every session of the account is gone.
    assert_eq!(session_count(&pool, account.id).await, 0);
    let response = get(&app, "/dashboard", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(count_logs(&pool, "password_reset", "users", account.id).await, 1);

    // The new password works.
    login(
        &app,
        &TestAccount {
            password: "brandnew1".to_string(),
            ..account.clone()
        },
    )
    .await;

    let response = post(&app, "/reset-password", None, body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Invalid or expired reset token");

    let response = get(&app, &format!("/reset-password?token={}", token), None).await;
    assert_eq!(response.json()["valid"], false);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (app, pool) = setup().await;
    let account = seed_user(&pool, "user", None).await;
    let token = insert_token(&pool, account.id, Duration::minutes(-5)).await;

    let response = get(&app, &format!("/reset-password?token={}", token), None).await;
    assert_eq!(response.json()["valid"], false);

    let response = post(
        &app,
        "/reset-password",
        None,
        json!({ "token": token, "password": "brandnew1", "confirm_password": "brandnew1" }),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // The old password still works.
    login(&app, &account).await;
}

#[tokio::test]
async fn test_unknown_or_missing_token() {
    let (app, _pool) = setup().await;

    let response = get(&app, "/reset-password", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["valid"], false);

    let response = get(&app, "/reset-password?token=not-a-real-token", None).await;
    assert_eq!(response.json()["valid"], false);
}

#[tokio::test]
async fn test_forgot_password_answers_the_same_for_unknown_email() {
    let (app, pool) = setup().await;
    let account = seed_user(&pool, "user", None).await;

    let known = post(&app, "/forgot-password", None, json!({ "email": account.email })).await;
    let unknown = post(
        &app,
        "/forgot-password",
        None,
        json!({ "email": common::unique_test_email() }),
    )
    .await;

    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(known.json()["message"], unknown.json()["message"]);

    let tokens: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM password_reset_tokens WHERE user_id = $1 AND used = FALSE",
    )
    .bind(account.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tokens, 1);
}
