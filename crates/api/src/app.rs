use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin, require_ministry_admin, require_session,
    require_super_admin, security_headers_middleware, trace_id, SecurityHeaders,
};
use crate::routes::{
    activity_logs, admin_users, analytics, auth, dashboard, data_requests, health, help,
    ministries, ministry_admin, password_reset, profile, settings,
};
use crate::services::email::EmailService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub email: EmailService,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        email: EmailService::new(config.email.clone()),
        config: config.clone(),
    };

    let cors = if config.security.cors_origins.is_empty() {
        // Development: allow any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Any signed-in account
    let session_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/dashboard", get(dashboard::user_dashboard))
        .route("/requests", post(data_requests::create_request))
        .route("/requests/my", get(data_requests::my_requests))
        .route("/activity-logs", get(activity_logs::list_logs))
        .route("/activity-logs/export", get(activity_logs::export_logs))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/profile/password", post(profile::change_password))
        .route("/help", get(help::help_center).post(help::submit_help_request))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    // Admin or super admin, system-wide
    let admin_routes = Router::new()
        .route("/admin/dashboard", get(dashboard::admin_dashboard))
        .route("/admin/analytics", get(analytics::analytics))
        .route(
            "/admin/users",
            get(admin_users::list_users).post(admin_users::create_user),
        )
        .route(
            "/admin/users/:id",
            put(admin_users::update_user).delete(admin_users::delete_user),
        )
        .route(
            "/admin/users/:id/reset-password",
            post(admin_users::reset_user_password),
        )
        .route(
            "/admin/ministries",
            get(ministries::list_ministries).post(ministries::create_ministry),
        )
        .route(
            "/admin/ministries/:id",
            put(ministries::update_ministry).delete(ministries::delete_ministry),
        )
        .route("/admin/requests", get(data_requests::list_requests))
        .route(
            "/admin/requests/:id",
            axum::routing::delete(data_requests::delete_request),
        )
        .route(
            "/admin/requests/:id/respond",
            post(data_requests::respond_to_request),
        )
        .route(
            "/admin/settings",
            // Every admin reads, only super admins save
            get(settings::get_settings).merge(post(settings::update_settings).route_layer(
                middleware::from_fn_with_state(state.clone(), require_super_admin),
            )),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Admin bound to a ministry
    let ministry_routes = Router::new()
        .route("/ministry/dashboard", get(dashboard::ministry_dashboard))
        .route(
            "/ministry/users",
            get(ministry_admin::list_users).post(ministry_admin::create_user),
        )
        .route(
            "/ministry/users/:id",
            put(ministry_admin::update_user).delete(ministry_admin::delete_user),
        )
        .route(
            "/ministry/users/:id/reset-password",
            post(ministry_admin::reset_user_password),
        )
        .route("/ministry/requests", get(ministry_admin::list_requests))
        .route(
            "/ministry/requests/:id/respond",
            post(ministry_admin::respond_to_request),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_ministry_admin,
        ));

    let public_routes = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/forgot-password", post(password_reset::forgot_password))
        .route(
            "/reset-password",
            get(password_reset::check_reset_link).post(password_reset::reset_password),
        )
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .merge(ministry_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            SecurityHeaders::from_config(&config.security),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
