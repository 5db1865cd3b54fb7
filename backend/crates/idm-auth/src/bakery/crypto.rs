use crate::bakery::{BakeryError, Result as BakeryErrorResult};

use idm_core::ErrorLocation;

use std::panic::Location;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of `data` under `key`.
pub(crate) fn keyed_hash(key: &[u8], data: &[u8]) -> [u8; KEY_LENGTH] {
    keyed_hash_pair(key, data, &[])
}

/// HMAC-SHA256 of `first || second` under `key`.
pub(crate) fn keyed_hash_pair(key: &[u8], first: &[u8], second: &[u8]) -> [u8; KEY_LENGTH] {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC-SHA256 accepts keys of any size");
    mac.update(first);
    mac.update(second);
    let mut out = [0u8; KEY_LENGTH];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Encrypt under `key`; the random nonce is prefixed to the ciphertext.
#[track_caller]
pub(crate) fn seal(key: &[u8; KEY_LENGTH], plaintext: &[u8]) -> BakeryErrorResult<Vec<u8>> {
    let nonce = rand::random::<[u8; NONCE_LENGTH]>();
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| BakeryError::Crypto {
            location: ErrorLocation::from(Location::caller()),
        })?;

    let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Reverse of [`seal`]. Any tampering surfaces as a signature error.
#[track_caller]
pub(crate) fn open(key: &[u8; KEY_LENGTH], sealed: &[u8]) -> BakeryErrorResult<Vec<u8>> {
    if sealed.len() < NONCE_LENGTH {
        return Err(BakeryError::malformed("sealed data too short"));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LENGTH);
    ChaCha20Poly1305::new(Key::from_slice(key))
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| BakeryError::invalid_signature())
}

#[track_caller]
pub(crate) fn to_key(bytes: &[u8]) -> BakeryErrorResult<[u8; KEY_LENGTH]> {
    bytes.try_into().map_err(|_| {
        BakeryError::malformed(format!(
            "key has {} bytes, expected {}",
            bytes.len(),
            KEY_LENGTH
        ))
    })
}

pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
