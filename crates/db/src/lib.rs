//! SQLite connection pool and migration runner for bookshelf.
//!
//! Modules contribute [`Migration`]s through the kernel; this crate records
//! which `(module, id)` pairs were applied in `schema_migrations` and runs
//! the pending ones in order.

use std::str::FromStr;

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use bookshelf_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const MIGRATIONS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    module TEXT NOT NULL,
    id TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (module, id)
)";

/// Shared handle to the application database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool for the configured URL, creating the database file if needed.
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&settings.url)
            .with_context(|| format!("invalid database url '{}'", settings.url))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory URL opens its own empty database,
        // and the data dies with the connection.
        let pool_options = if is_in_memory(&settings.url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(settings.max_connections.max(1))
        };
        let max_connections = pool_options.get_max_connections();

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to '{}'", settings.url))?;

        if max_connections != settings.max_connections {
            tracing::warn!(
                target: "bookshelf-db",
                url = %settings.url,
                requested = settings.max_connections,
                max_connections,
                "pool size adjusted"
            );
        }
        tracing::info!(
            target: "bookshelf-db",
            url = %settings.url,
            max_connections,
            "database pool ready"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply every migration not yet recorded. Returns how many ran.
    pub async fn run_migrations(&self, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
        sqlx::query(MIGRATIONS_TABLE_SQL)
            .execute(&self.pool)
            .await
            .context("failed to create schema_migrations table")?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let already: Option<(String,)> =
                sqlx::query_as("SELECT id FROM schema_migrations WHERE module = ?1 AND id = ?2")
                    .bind(module)
                    .bind(migration.id)
                    .fetch_optional(&self.pool)
                    .await
                    .with_context(|| format!("failed to read migration state for '{module}'"))?;

            if already.is_some() {
                tracing::debug!(target: "bookshelf-db", %module, id = migration.id, "migration already applied");
                continue;
            }

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("migration '{}/{}' failed", module, migration.id))?;
            sqlx::query("INSERT INTO schema_migrations (module, id) VALUES (?1, ?2)")
                .bind(module)
                .bind(migration.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::info!(target: "bookshelf-db", %module, id = migration.id, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }

    /// Round-trip a trivial query to confirm the pool is usable.
    pub async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database ping failed")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
