pub mod error;
pub mod groups;
pub mod models;

pub use error::error_code::ErrorCode;
pub use error::{CoreError, Result};
pub use error_location::ErrorLocation;
pub use groups::dedupe_groups;
pub use models::identity::Identity;
pub use models::identity_update::IdentityUpdate;
pub use models::public_key::PublicKey;
pub use models::username::Username;

#[cfg(test)]
mod tests;
