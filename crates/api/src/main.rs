use anyhow::Result;
use tracing::{info, warn};

use ministry_portal_api::{
    app, config,
    middleware::{init_logging, init_metrics},
    services::{bootstrap_admin, BootstrapOutcome},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    init_logging(&config.logging)?;
    init_metrics()?;

    info!(
        "Starting Inter-Ministry Data Exchange portal v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    match bootstrap_admin(&pool, &config.admin).await {
        Ok(BootstrapOutcome::Created(user_id)) => {
            info!(user_id, "Created initial super admin account")
        }
        Ok(BootstrapOutcome::AlreadyProvisioned) => {
            info!("Super admin already provisioned, skipping bootstrap")
        }
        Ok(BootstrapOutcome::NotConfigured) => {}
        Err(e) => warn!(error = %e, "Admin bootstrap failed"),
    }

    let addr = config.socket_addr()?;
    let app = app::create_app(config, pool);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
