pub mod launchpad;

use crate::Result as StoreErrorResult;

use async_trait::async_trait;

/// Source of group memberships held outside the identity store.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Groups the directory knows for a login identifier. Unknown
    /// identifiers yield an empty list.
    async fn lookup(&self, external_id: &str) -> StoreErrorResult<Vec<String>>;
}

/// Directory that knows no one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

#[async_trait]
impl GroupDirectory for NoDirectory {
    async fn lookup(&self, _external_id: &str) -> StoreErrorResult<Vec<String>> {
        Ok(Vec::new())
    }
}
