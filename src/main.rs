//! PlayOn core bootstrap
//!
//! Operational entry point: loads configuration, initializes logging,
//! connects the database pool, runs migrations, and verifies the storage
//! layer the services run on. The HTTP route layer embeds the library and
//! owns its own process; this binary exists for provisioning and health
//! verification.

use std::sync::Arc;

use tracing::info;

use playon::{
    config::Settings,
    database::{connection, PgEventStore},
    services::ServiceFactory,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard must outlive the process body
    let _guard = logging::init_logging(&settings.logging)?;

    info!("Starting {} v{}...", playon::NAME, playon::VERSION);

    // Initialize database connection
    info!("Connecting to database...");
    let pool = connection::create_pool(&settings.database).await?;

    // Run database migrations
    connection::run_migrations(&pool).await?;
    connection::health_check(&pool).await?;

    // Wire the services onto the Postgres store and verify they answer
    let store = Arc::new(PgEventStore::new(pool));
    let services = ServiceFactory::new(store, &settings);

    let stats = services.lifecycle.event_stats(None).await?;
    info!(
        total = stats.total_events,
        published = stats.published_events,
        drafts = stats.draft_events,
        completed = stats.completed_events,
        "Event storage verified"
    );

    info!("PlayOn core is ready; storage is migrated and healthy.");
    Ok(())
}
