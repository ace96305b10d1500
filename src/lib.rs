//! Bookshelf application library
//!
//! Wires the application modules onto the kernel: opens the database,
//! registers modules, applies their migrations and serves their routes.

pub mod modules;
pub mod utils;

use anyhow::Context;
use axum::Router;
use bookshelf_db::Database;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Re-export commonly used types
pub use modules::*;

/// A bootstrapped application: migrated database plus initialized modules.
pub struct App {
    pub registry: ModuleRegistry,
    pub db: Database,
}

impl App {
    /// The full HTTP router, including middleware and API docs
    pub fn router(&self, settings: &Settings) -> Router {
        bookshelf_http::build_router(&self.registry, settings)
    }
}

/// Connect, register modules, migrate and initialize.
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<App> {
    let (registry, db, _) = prepare(settings).await?;

    registry
        .init_all(&InitCtx { settings })
        .await
        .context("module initialization failed")?;

    Ok(App { registry, db })
}

/// Bootstrap and serve until shutdown, then stop modules and close the pool.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(env = ?settings.environment, db = %settings.database.url, "bookshelf starting");

    let app = bootstrap(&settings).await?;
    app.registry.start_all(&InitCtx { settings: &settings }).await?;

    let served = bookshelf_http::start_server(&app.registry, &settings).await;

    app.registry.stop_all().await?;
    app.db.close().await;
    tracing::info!("bookshelf stopped");

    served
}

/// Apply pending migrations without serving. Returns how many ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let (_registry, db, applied) = prepare(settings).await?;
    db.close().await;
    Ok(applied)
}

async fn prepare(settings: &Settings) -> anyhow::Result<(ModuleRegistry, Database, usize)> {
    let db = Database::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &db)?;

    let applied = db
        .run_migrations(&registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations up to date");

    Ok((registry, db, applied))
}
