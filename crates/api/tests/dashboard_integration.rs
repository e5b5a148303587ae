//! Dashboards, analytics and ministry management.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    count_logs, get, login, post, seed_ministry, seed_request, seed_user, send, setup,
    unique_suffix,
};
use serde_json::json;

#[tokio::test]
async fn test_admin_dashboard_and_analytics() {
    let (app, pool) = setup().await;
    let a = seed_ministry(&pool, "Ministry of Finance").await;
    let b = seed_ministry(&pool, "Ministry of Health").await;
    seed_request(&pool, "Quarterly spend", "pending", "high", a, b, None).await;
    let admin = seed_user(&pool, "admin", None).await;
    let cookie = login(&app, &admin).await;

    let response = get(&app, "/admin/dashboard", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert!(body.get("error").is_none());
    assert!(body["total_users"].as_i64().unwrap() >= 1);
    assert!(body["pending_requests"].as_i64().unwrap() >= 1);
    assert_eq!(body["viewer"]["email"], admin.email.as_str());

    let response = get(&app, "/admin/analytics", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["requests_by_month"].as_array().unwrap().len(), 12);
    assert!(body["top_requesting_ministries"].as_array().unwrap().len() <= 10);
}

#[tokio::test]
async fn test_analytics_ranks_top_ten_requesting_ministries() {
    let (app, pool) = setup().await;
    let target = seed_ministry(&pool, "Ministry of Statistics").await;
    for n in 1..=12_i32 {
        let requester = seed_ministry(&pool, "Ministry of Requests").await;
        sqlx::query(
            r#"
            INSERT INTO data_requests (title, description, request_type, status, priority,
                                       requesting_ministry_id, target_ministry_id)
            SELECT 'Ranked ' || g, 'Ranking fixture', 'statistics', 'pending', 'medium', $1, $2
            FROM generate_series(1, $3) AS g
            "#,
        )
        .bind(requester)
        .bind(target)
        .bind(n * 5)
        .execute(&pool)
        .await
        .unwrap();
    }
    let admin = seed_user(&pool, "admin", None).await;
    let cookie = login(&app, &admin).await;

    let response = get(&app, "/admin/analytics", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    let top = body["top_requesting_ministries"].as_array().unwrap();
    assert_eq!(top.len(), 10);
    assert_eq!(top[0]["percent_of_max"].as_f64().unwrap(), 100.0);

    let counts: Vec<i64> = top.iter().map(|r| r["count"].as_i64().unwrap()).collect();
    assert!(counts.windows(2).all(|pair| pair[0] >= pair[1]), "{:?}", counts);
    assert!(counts[0] >= 60);
    for row in top {
        let pct = row["percent_of_max"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&pct));
    }
}

#[tokio::test]
async fn test_ministry_dashboard_is_scoped() {
    let (app, pool) = setup().await;
    let own = seed_ministry(&pool, "Ministry of Health").await;
    let other = seed_ministry(&pool, "Ministry of Trade").await;
    seed_request(&pool, "Clinic census", "pending", "high", other, own, None).await;
    seed_request(&pool, "Import data", "approved", "low", own, other, None).await;
    let admin = seed_user(&pool, "admin", Some(own)).await;
    seed_user(&pool, "user", Some(own)).await;
    let cookie = login(&app, &admin).await;

    let response = get(&app, "/ministry/dashboard", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["ministry_id"], own);
    assert_eq!(body["users_in_ministry"], 2);
    assert_eq!(body["incoming_requests"], 1);
    assert_eq!(body["outgoing_requests"], 1);
    assert_eq!(body["pending_incoming"], 1);
    assert_eq!(body["requests_by_status"]["total"], 2);
}

#[tokio::test]
async fn test_user_dashboard() {
    let (app, pool) = setup().await;
    let own = seed_ministry(&pool, "Ministry of Lands").await;
    let other = seed_ministry(&pool, "Ministry of Mines").await;
    let user = seed_user(&pool, "user", Some(own)).await;
    seed_request(&pool, "Plot registry", "pending", "medium", own, other, Some(user.id)).await;
    let cookie = login(&app, &user).await;

    let response = get(&app, "/dashboard", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["my_requests"]["total"], 1);
    assert_eq!(body["my_requests"]["pending"], 1);
    assert_eq!(body["ministry_outgoing"], 1);
    assert_eq!(body["recent_requests"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ministry_crud() {
    let (app, pool) = setup().await;
    let admin = seed_user(&pool, "admin", None).await;
    let cookie = login(&app, &admin).await;
    let abbreviation = format!("M{}", unique_suffix()).to_uppercase();

    let response = post(
        &app,
        "/admin/ministries",
        Some(&cookie),
        json!({ "name": "Ministry of Culture", "abbreviation": abbreviation }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    let id = response.json()["id"].as_i64().unwrap();
    assert_eq!(count_logs(&pool, "ministry_created", "ministries", id).await, 1);

    let response = post(
        &app,
        "/admin/ministries",
        Some(&cookie),
        json!({ "name": "Copy", "abbreviation": abbreviation.to_lowercase() }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = send(
        &app,
        Method::PUT,
        &format!("/admin/ministries/{}", id),
        Some(&cookie),
        Some(json!({
            "name": "Ministry of Culture and Arts",
            "abbreviation": abbreviation,
            "status": "inactive",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());

    let status: String = sqlx::query_scalar("SELECT status FROM ministries WHERE id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "inactive");

    let response = get(&app, "/admin/ministries", Some(&cookie)).await;
    let body = response.json();
    let listed = body["ministries"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["id"] == id)
        .cloned()
        .unwrap();
    assert_eq!(listed["user_count"], 0);

    let response = send(
        &app,
        Method::DELETE,
        &format!("/admin/ministries/{}", id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(count_logs(&pool, "ministry_deleted", "ministries", id).await, 1);

    let response = send(
        &app,
        Method::DELETE,
        &format!("/admin/ministries/{}", id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
