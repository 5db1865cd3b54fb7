use idm_store::{GroupDirectory, NoDirectory, StoreParams, StorePool, open_store_pool};

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

/// A store pool over a database in a temp directory. The directory lives as
/// long as this value.
pub struct TestDb {
    pub pool: StorePool,
    _dir: TempDir,
}

/// Creates a fresh database with migrations run
pub async fn create_test_db() -> TestDb {
    create_test_db_with(10, Duration::from_secs(1), Arc::new(NoDirectory)).await
}

pub async fn create_test_db_with(
    max_sessions: usize,
    request_timeout: Duration,
    directory: Arc<dyn GroupDirectory>,
) -> TestDb {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pool = open_store_pool(StoreParams {
        database_path: dir.path().join("idm.db"),
        max_sessions,
        request_timeout,
        directory,
    })
    .await
    .expect("Failed to open store pool");

    TestDb { pool, _dir: dir }
}
