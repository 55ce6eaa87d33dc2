use axum_helpers::server::{create_production_app, health_router};
use core_config::load_dotenv;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_users::{InMemoryUserRepository, PgUserRepository};
use migration::Migrator;
use tracing::{info, warn};

mod api;
mod config;
mod state;

use config::{Config, UserStore};
use state::{AppState, UserBackend};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();
    load_dotenv();

    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let (users, db) = match (config.store, config.database.clone()) {
        (UserStore::Postgres, Some(database)) => {
            let db = database::postgres::connect_from_config_with_retry(database, None)
                .await
                .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

            if config.run_migrations {
                database::postgres::run_migrations::<Migrator>(&db, config.app.name).await?;
            }

            (UserBackend::Postgres(PgUserRepository::new(db.clone())), Some(db))
        }
        (UserStore::Postgres, None) => {
            return Err(eyre::eyre!("USER_STORE=postgres requires DATABASE_URL"));
        }
        (UserStore::Memory, _) => {
            warn!("Using the in-memory user store; data is lost on restart");
            (UserBackend::Memory(InMemoryUserRepository::new()), None)
        }
    };

    let state = AppState { config, users, db };

    let api_routes = api::routes(&state);

    // create_router adds middleware and the /api prefix
    let router = axum_helpers::create_router(api_routes)?;

    // - /health: liveness check with app name/version
    // - /ready: readiness check with a database ping
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!(
        store = %state.config.store,
        "Starting directory API (shutdown timeout {:?})",
        state.config.server.shutdown_timeout
    );

    let server_config = state.config.server.clone();
    create_production_app(app, &server_config, async move {
        if let Some(db) = state.db {
            info!("Shutting down: closing database connections");
            match db.close().await {
                Ok(_) => info!("PostgreSQL connection closed successfully"),
                Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
            }
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Directory API shutdown complete");
    Ok(())
}
