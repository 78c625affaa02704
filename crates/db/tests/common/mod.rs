//! Shared setup for the ledger integration tests.

#![allow(dead_code)]

use beneficio_db::migration::{Migrator, MigratorTrait};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Fresh in-memory SQLite database with the ledger schema applied.
///
/// One pooled connection: every in-memory connection is its own database.
pub async fn sqlite() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");
    db
}

/// Midnight UTC, `n` days into the 2026 harvest.
pub fn day(n: i64) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap() + Duration::days(n))
}
