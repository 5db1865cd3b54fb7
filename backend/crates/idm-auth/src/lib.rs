pub mod admin_credentials;
pub mod authorizer;
pub mod bakery;
pub mod caveats;
pub mod error;
pub mod principal;

pub use admin_credentials::AdminCredentials;
pub use authorizer::{Authorizer, require_membership};
pub use bakery::{Bakery, Caveat, Macaroon};
pub use caveats::{
    CaveatChecker, Operation, StandardChecker, UserHasPublicKeyChecker,
    user_has_public_key_caveat,
};
pub use error::{AuthError, CaveatError, Result};
pub use principal::{ADMIN_GROUP, Principal};

#[cfg(test)]
mod tests;
