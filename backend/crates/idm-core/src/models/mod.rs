pub mod identity;
pub mod identity_update;
pub mod public_key;
pub mod username;
