#![allow(clippy::result_large_err)]

use clink_finance::{
    config::{
        admin::admin_credentials_from_env,
        categories::categories_to_seed,
        database::{create_connection, create_tables},
        settings::load_default_config,
    },
    core::{auth::ensure_default_admin, category::prepopulate_categories},
    emails::mailer::mailer_from_config,
    errors::Result,
    jobs::run_scheduler,
    web::{AppState, run_server},
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = load_default_config()?;

    // 4. Connect and make sure every table exists
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the category catalog
    let seeded = prepopulate_categories(&db, &categories_to_seed(&app_config.categories))
        .await
        .inspect_err(|e| error!("Failed to seed categories: {}", e))?;
    info!(created = seeded.created, skipped = seeded.skipped, "Category catalog ready");

    // 6. Bootstrap the administrator from DEFAULT_ADMIN_* variables
    ensure_default_admin(&db, admin_credentials_from_env()).await?;

    // 7. Start the scheduler on its own task
    if app_config.scheduler.enabled {
        let mailer = mailer_from_config(&app_config.email)?;
        let scheduler_db = db.clone();
        let scheduler_config = app_config.scheduler.clone();
        tokio::spawn(async move {
            if let Err(e) = run_scheduler(scheduler_db, mailer, scheduler_config).await {
                error!(error = %e, "Scheduler stopped");
            }
        });
    } else {
        info!("Scheduler disabled");
    }

    // 8. Serve HTTP
    run_server(AppState { db }, &app_config.server.bind_address).await
}
