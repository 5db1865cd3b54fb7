use crate::bakery::{BakeryError, Macaroon, Result as BakeryErrorResult};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use http::HeaderMap;
use http::header::COOKIE;

pub const COOKIE_PREFIX: &str = "macaroon-";

/// Cookie name for a macaroon slice, derived from the primary's identifier.
pub fn cookie_name(macaroons: &[Macaroon]) -> String {
    let id = macaroons
        .first()
        .map(|m| URL_SAFE_NO_PAD.encode(&m.identifier))
        .unwrap_or_default();
    format!("{}{}", COOKIE_PREFIX, id)
}

pub fn encode_cookie_value(macaroons: &[Macaroon]) -> BakeryErrorResult<String> {
    let json =
        serde_json::to_vec(macaroons).map_err(|e| BakeryError::malformed(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

#[track_caller]
pub fn decode_cookie_value(value: &str) -> BakeryErrorResult<Vec<Macaroon>> {
    let json = STANDARD
        .decode(value.trim())
        .map_err(|e| BakeryError::malformed(format!("cookie encoding: {}", e)))?;
    let macaroons: Vec<Macaroon> = serde_json::from_slice(&json)
        .map_err(|e| BakeryError::malformed(format!("cookie contents: {}", e)))?;
    if macaroons.is_empty() {
        return Err(BakeryError::malformed("empty macaroon slice"));
    }
    Ok(macaroons)
}

/// Every macaroon slice carried in the request's cookies, in header order.
/// Each entry is decoded independently so one bad cookie does not hide the
/// others.
pub fn macaroon_cookies(headers: &HeaderMap) -> Vec<BakeryErrorResult<Vec<Macaroon>>> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| name.starts_with(COOKIE_PREFIX))
        .map(|(_, value)| decode_cookie_value(value))
        .collect()
}
