//! Activity log screen cap and CSV export.

mod common;

use axum::http::{header, StatusCode};
use axum::http::Method;
use common::{get, login, seed_ministry, seed_user, send, setup, unique_suffix};
use serde_json::json;
use sqlx::PgPool;

async fn insert_logs(pool: &PgPool, user_id: i64, action: &str, count: i64) {
    sqlx::query(
        r#"
        INSERT INTO logs (user_id, action, table_name, record_id, details, ip_address)
        SELECT $1, $2, 'users', n, 'Bulk row ' || n, '10.0.0.1'
        FROM generate_series(1, $3::BIGINT) AS n
        "#,
    )
    .bind(user_id)
    .bind(action)
    .bind(count)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_screen_caps_at_100_but_export_does_not() {
    let (app, pool) = setup().await;
    let admin = seed_user(&pool, "admin", None).await;
    let action = format!("bulk_{}", unique_suffix());
    insert_logs(&pool, admin.id, &action, 105).await;
    let cookie = login(&app, &admin).await;

    let response = get(&app, &format!("/activity-logs?action={}", action), Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["logs"].as_array().unwrap().len(), 100);
    assert_eq!(body["truncated"], true);
    assert!(body["actions"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a == action.as_str()));

    let response = get(
        &app,
        &format!("/activity-logs/export?action={}", action),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_TYPE),
        Some("text/csv; charset=utf-8")
    );
    let disposition = response.header(header::CONTENT_DISPOSITION).unwrap();
    assert!(disposition.starts_with("attachment; filename=\"activity_logs_"));
    assert!(disposition.ends_with(".csv\""));

    let csv = response.text();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 106);
    assert_eq!(
        lines[0],
        "ID,Date,User,Email,Ministry,Action,Table,Record ID,Details,IP Address"
    );
    assert!(lines[1].contains(&admin.email));
}

#[tokio::test]
async fn test_regular_user_sees_only_own_ministry() {
    let (app, pool) = setup().await;
    let own = seed_ministry(&pool, "Ministry of Water").await;
    let other = seed_ministry(&pool, "Ministry of Power").await;
    let user = seed_user(&pool, "user", Some(own)).await;
    let colleague = seed_user(&pool, "user", Some(own)).await;
    let outsider = seed_user(&pool, "user", Some(other)).await;

    let action = format!("scoped_{}", unique_suffix());
    insert_logs(&pool, colleague.id, &action, 2).await;
    insert_logs(&pool, outsider.id, &action, 3).await;

    let cookie = login(&app, &user).await;
    let response = get(&app, &format!("/activity-logs?action={}", action), Some(&cookie)).await;
    let body = response.json();
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l["user_email"] == colleague.email.as_str()));
    assert_eq!(body["truncated"], false);

    let response = get(
        &app,
        &format!("/activity-logs/export?action={}", action),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.text().lines().count(), 3);
}

#[tokio::test]
async fn test_user_without_ministry_gets_header_only_export() {
    let (app, pool) = setup().await;
    let user = seed_user(&pool, "user", None).await;
    let cookie = login(&app, &user).await;

    let response = get(&app, "/activity-logs", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["logs"].as_array().unwrap().len(), 0);

    let response = get(&app, "/activity-logs/export", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text().lines().count(), 1);
}

#[tokio::test]
async fn test_deleted_actor_keeps_name_and_ministry_on_log_rows() {
    let (app, pool) = setup().await;
    let ministry = seed_ministry(&pool, "Ministry of Lands").await;
    let departed = seed_user(&pool, "user", Some(ministry)).await;
    let colleague = seed_user(&pool, "user", Some(ministry)).await;
    let root = seed_user(&pool, "super_admin", None).await;

    let cookie = login(&app, &departed).await;
    let response = send(
        &app,
        Method::PUT,
        "/profile",
        Some(&cookie),
        Some(json!({ "name": departed.name, "email": departed.email })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());

    let root_cookie = login(&app, &root).await;
    let response = send(
        &app,
        Method::DELETE,
        &format!("/admin/users/{}", departed.id),
        Some(&root_cookie),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    // Names are "Test user <suffix>"; filter on the unique part.
    let needle = departed.name.rsplit(' ').next().unwrap();
    let uri = format!("/activity-logs?action=profile_updated&user={}", needle);

    let cookie = login(&app, &colleague).await;
    let body = get(&app, &uri, Some(&cookie)).await.json();
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0]["user_id"].is_null());
    assert_eq!(logs[0]["user_name"], departed.name.as_str());
    assert_eq!(logs[0]["user_email"], departed.email.as_str());
    assert!(logs[0]["ministry_name"]
        .as_str()
        .unwrap()
        .starts_with("Ministry of Lands"));

    let csv = get(
        &app,
        &format!("/activity-logs/export?action=profile_updated&user={}", needle),
        Some(&root_cookie),
    )
    .await
    .text();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains(&departed.email));
    assert!(!csv.contains(",System,"));
}
