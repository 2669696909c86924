use chrono::Duration;
use sea_orm::Database;
use tracing::{error, info};

use gatekeeper_access::config::AccessConfig;
use gatekeeper_access::router::build_router;
use gatekeeper_access::state::AppState;
use gatekeeper_access::usecase::sweep::SweepExpiredUseCase;
use gatekeeper_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AccessConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        retention_days: config.retention_days,
    };

    // Spawn the expiry sweeper. Expiry is derived live at validation time,
    // so a failed pass costs nothing but storage freshness. Log and wait
    // for the next tick.
    let sweep_state = state.clone();
    let sweep_interval = std::time::Duration::from_secs(config.sweep_interval_secs);
    let retention_days = config.retention_days;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            let uc = SweepExpiredUseCase {
                repo: sweep_state.access_code_repo(),
                retention: Duration::days(retention_days),
            };
            if let Err(e) = uc.execute().await {
                error!(error = %e, "sweep pass failed");
            }
        }
    });

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.access_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("access service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
