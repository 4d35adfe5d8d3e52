use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use dayloop::adapters::sqlite::{create_migrated_test_pool, SqliteProgressRepository};
use dayloop::domain::ports::ManualClock;
use dayloop::services::ProgressService;

/// Create an in-memory SQLite database for testing
///
/// Each call creates a completely isolated database instance with
/// migrations applied.
pub async fn setup_test_db() -> SqlitePool {
    create_migrated_test_pool()
        .await
        .expect("failed to create test database")
}

/// Close the pool at the end of a test.
#[allow(dead_code)]
pub async fn teardown_test_db(pool: SqlitePool) {
    pool.close().await;
}

/// A fixed instant in June 2024, UTC.
#[allow(dead_code)]
pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
}

#[allow(dead_code)]
pub struct TestEngine {
    pub service: ProgressService<SqliteProgressRepository>,
    pub repo: Arc<SqliteProgressRepository>,
    pub clock: Arc<ManualClock>,
    pub pool: SqlitePool,
}

/// Engine over a fresh database with the clock pinned at `start`.
#[allow(dead_code)]
pub async fn setup_engine(start: DateTime<Utc>) -> TestEngine {
    let pool = setup_test_db().await;
    let repo = Arc::new(SqliteProgressRepository::new(pool.clone()));
    let clock = Arc::new(ManualClock::new(start));
    let service = ProgressService::new(Arc::clone(&repo)).with_clock(clock.clone());
    TestEngine {
        service,
        repo,
        clock,
        pool,
    }
}
