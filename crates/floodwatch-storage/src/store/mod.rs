use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use crate::error::Result;

pub mod alert;
pub mod cases;
pub mod environmental;
pub mod region;
pub mod risk;
pub mod rule;

pub use alert::{AlertFilter, AlertSummary};
pub use rule::AlertRuleRow;

/// Unified access layer for the surveillance database.
///
/// All methods are `async fn` over SeaORM; SQLite is the default backend
/// but any SeaORM-supported URL works. The store owns no business logic:
/// scoring and rule evaluation live in their own crates and only read and
/// write rows through here.
pub struct SurveillanceStore {
    pub(crate) db: DatabaseConnection,
}

impl SurveillanceStore {
    /// Connects and initializes the database.
    ///
    /// `db_url` is a full connection URL supplied by server configuration,
    /// e.g. `sqlite:///data/floodwatch.db?mode=rwc` or `sqlite::memory:`.
    /// Pending `sea-orm-migration` migrations run automatically.
    pub async fn new(db_url: &str) -> Result<Self> {
        let db = Database::connect(db_url).await?;

        // WAL mode only applies to file-backed SQLite
        if db_url.starts_with("sqlite://") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        }

        Migrator::up(&db, None).await?;

        tracing::info!(db_url = %db_url, "Initialized surveillance store (SeaORM)");

        Ok(Self { db })
    }

    /// Returns the underlying database connection (for submodules).
    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
