use crate::bakery::Caveat;
use crate::{CaveatChecker, CaveatError};

use idm_core::{Identity, PublicKey, Username};
use idm_store::IdentityStore;

use async_trait::async_trait;

pub const USER_HAS_PUBLIC_KEY: &str = "user-has-public-key";

/// First-party caveat satisfied only when `username` holds `key`.
pub fn user_has_public_key_caveat(username: &Username, key: &PublicKey) -> Caveat {
    Caveat::first_party(format!("{} {} {}", USER_HAS_PUBLIC_KEY, username, key))
}

/// Checks `user-has-public-key <username> <key>` against the store.
///
/// An unknown user and a user without the key fail identically, so the
/// caveat does not reveal which usernames exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserHasPublicKeyChecker;

#[async_trait]
impl CaveatChecker for UserHasPublicKeyChecker {
    fn condition(&self) -> &str {
        USER_HAS_PUBLIC_KEY
    }

    async fn check(
        &self,
        store: &mut IdentityStore,
        arg: &str,
    ) -> Result<Option<Identity>, CaveatError> {
        let parts: Vec<&str> = arg.split(' ').collect();
        let [username, key] = parts.as_slice() else {
            return Err(CaveatError::badly_formatted());
        };
        let username = Username::parse(username)?;
        let key = PublicKey::parse(key)?;

        let identity = match store.get_identity(&username).await {
            Ok(identity) => identity,
            Err(e) if e.is_not_found() => return Err(CaveatError::public_key_not_valid()),
            Err(e) => return Err(e.into()),
        };
        if !identity.has_public_key(&key) {
            return Err(CaveatError::public_key_not_valid());
        }
        Ok(Some(identity))
    }
}
