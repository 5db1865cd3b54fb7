pub mod standard;
pub mod user_has_public_key;

pub use standard::{Operation, StandardChecker};
pub use user_has_public_key::{
    USER_HAS_PUBLIC_KEY, UserHasPublicKeyChecker, user_has_public_key_caveat,
};

use crate::CaveatError;

use idm_core::Identity;
use idm_store::IdentityStore;

use async_trait::async_trait;

/// Evaluates one named first-party condition during verification.
#[async_trait]
pub trait CaveatChecker: Send + Sync {
    /// Condition name this checker handles
    fn condition(&self) -> &str;

    /// Check the condition's argument. A checker that proves who the
    /// caller is returns the matching identity.
    async fn check(
        &self,
        store: &mut IdentityStore,
        arg: &str,
    ) -> Result<Option<Identity>, CaveatError>;
}
