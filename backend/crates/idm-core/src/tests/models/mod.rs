mod identity;
mod identity_update;
mod public_key;
mod username;
