pub mod collection_monitor;
pub mod directory;
pub mod error;
pub mod identity_store;
pub mod pool;

pub use collection_monitor::{CollectionMonitor, Counter, IdentityCounter};
pub use directory::launchpad::LaunchpadDirectory;
pub use directory::{GroupDirectory, NoDirectory};
pub use error::{Result, StoreError};
pub use identity_store::{IdentityStore, SessionFactory, StoreParams, StorePool, open_store_pool};
pub use pool::limit_pool::{Close, Factory, LimitPool};
pub use pool::pooled::Pooled;

#[cfg(test)]
mod tests;
