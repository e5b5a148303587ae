//! Data request filtering, stat cards and submission.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    count_logs, get, login, post, seed_ministry, seed_ministry_with_status, seed_request,
    seed_user, send, setup, unique_suffix,
};
use serde_json::json;

#[tokio::test]
async fn test_filters_apply_to_list_but_not_stat_cards() {
    let (app, pool) = setup().await;
    let finance = seed_ministry(&pool, "Ministry of Finance").await;
    let health = seed_ministry(&pool, "Ministry of Health").await;
    let roads = seed_ministry(&pool, "Ministry of Roads").await;
    let admin = seed_user(&pool, "admin", None).await;
    let tag = unique_suffix();

    let hit_out = seed_request(&pool, &format!("Budget out {}", tag), "approved", "high", finance, health, None).await;
    let hit_in = seed_request(&pool, &format!("Annual budget {}", tag), "approved", "low", roads, finance, None).await;
    seed_request(&pool, &format!("Budget pending {}", tag), "pending", "high", finance, health, None).await;
    seed_request(&pool, &format!("Budget elsewhere {}", tag), "approved", "high", roads, health, None).await;
    seed_request(&pool, &format!("Staffing {}", tag), "approved", "high", finance, health, None).await;

    let cookie = login(&app, &admin).await;
    let response = get(
        &app,
        &format!(
            "/admin/requests?status=approved&ministry={}&search=budget&priority=all",
            finance
        ),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();

    let requests = body["requests"].as_array().unwrap();
    let ids: Vec<i64> = requests.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&hit_out));
    assert!(ids.contains(&hit_in));
    for request in requests {
        assert_eq!(request["status"], "approved");
        assert!(request["title"]
            .as_str()
            .unwrap()
            .to_lowercase()
            .contains("budget"));
        assert!(
            request["requesting_ministry_id"] == finance || request["target_ministry_id"] == finance
        );
    }

    // Stat cards ignore the filters.
    let stats = &body["stats"]["by_status"];
    assert!(stats["total"].as_i64().unwrap() >= 5);
    assert!(stats["pending"].as_i64().unwrap() >= 1);
    assert_eq!(body["filters"]["status"], "approved");
    assert!(body["ministries"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn test_submit_request_validation() {
    let (app, pool) = setup().await;
    let own = seed_ministry(&pool, "Ministry of Education").await;
    let target = seed_ministry(&pool, "Ministry of Labour").await;
    let closed = seed_ministry_with_status(&pool, "Ministry of Archives", "inactive").await;
    let staff = seed_user(&pool, "user", Some(own)).await;
    let loner = seed_user(&pool, "user", None).await;

    let body = |target_ministry_id: i64| {
        json!({
            "title": "Enrolment figures",
            "description": "Term enrolment by region",
            "request_type": "statistics",
            "priority": "high",
            "target_ministry_id": target_ministry_id,
        })
    };

    let cookie = login(&app, &staff).await;
    for (target_id, message) in [
        (own, "You cannot submit a request to your own ministry"),
        (closed, "Please select a valid target ministry"),
        (i64::MAX, "Please select a valid target ministry"),
    ] {
        let response = post(&app, "/requests", Some(&cookie), body(target_id)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json()["message"], message);
    }

    let response = post(&app, "/requests", Some(&cookie), body(target)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    let id = response.json()["id"].as_i64().unwrap();
    assert_eq!(count_logs(&pool, "request_created", "data_requests", id).await, 1);

    let (status, requesting, requested_by): (String, i64, Option<i64>) = sqlx::query_as(
        "SELECT status, requesting_ministry_id, requested_by FROM data_requests WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status, "pending");
    assert_eq!(requesting, own);
    assert_eq!(requested_by, Some(staff.id));

    let response = get(&app, "/requests/my", Some(&cookie)).await;
    let body_json = response.json();
    assert_eq!(body_json["total"], 1);
    assert_eq!(body_json["stats"]["by_status"]["total"], 1);

    let cookie = login(&app, &loner).await;
    let response = post(&app, "/requests", Some(&cookie), body(target)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["message"],
        "You must belong to a ministry to submit requests"
    );
}

#[tokio::test]
async fn test_admin_responds_and_deletes() {
    let (app, pool) = setup().await;
    let a = seed_ministry(&pool, "Ministry of Finance").await;
    let b = seed_ministry(&pool, "Ministry of Health").await;
    let admin = seed_user(&pool, "super_admin", None).await;
    let id = seed_request(&pool, "Payroll extract", "pending", "medium", a, b, None).await;
    let cookie = login(&app, &admin).await;

    let response = post(
        &app,
        &format!("/admin/requests/{}/respond", id),
        Some(&cookie),
        json!({ "status": "rejected", "response_note": "Out of scope" }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(count_logs(&pool, "request_rejected", "data_requests", id).await, 1);

    let response = send(
        &app,
        Method::DELETE,
        &format!("/admin/requests/{}", id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(count_logs(&pool, "request_deleted", "data_requests", id).await, 1);

    let response = post(
        &app,
        &format!("/admin/requests/{}/respond", id),
        Some(&cookie),
        json!({ "status": "approved" }),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_regular_user_cannot_reach_admin_requests() {
    let (app, pool) = setup().await;
    let own = seed_ministry(&pool, "Ministry of Health").await;
    let user = seed_user(&pool, "user", Some(own)).await;
    let cookie = login(&app, &user).await;

    let response = get(&app, "/admin/requests", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
}
