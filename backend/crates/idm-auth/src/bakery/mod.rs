pub mod caveat;
pub mod cookie;
pub mod crypto;
pub mod error;
pub mod macaroon;

pub use cookie::{cookie_name, decode_cookie_value, encode_cookie_value, macaroon_cookies};
pub use caveat::{
    Caveat, allow_caveat, declared_caveat, deny_caveat, parse_condition, time_before_caveat,
};
pub use crypto::KEY_LENGTH;
pub use error::{BakeryError, Result};
pub use macaroon::{Macaroon, MacaroonCaveat};

use crate::bakery::crypto::{constant_time_eq, keyed_hash, keyed_hash_pair, open, seal, to_key};

use idm_core::ErrorLocation;

use std::collections::BTreeMap;
use std::panic::Location;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Nesting limit for discharges that themselves carry third-party caveats
const MAX_DISCHARGE_DEPTH: usize = 8;

/// Caveats checked across a primary and all of its discharges
const MAX_CAVEATS: usize = 256;

/// State shared while walking a primary and its discharges
struct Walk<'a> {
    primary: &'a Macaroon,
    discharges: &'a [Macaroon],
    used: Vec<bool>,
    caveats: usize,
    conditions: Vec<String>,
}

/// Caveat key and condition, encrypted into a third-party caveat id
#[derive(Serialize, Deserialize)]
struct ThirdPartyCaveatId {
    root_key: String,
    condition: String,
}

/// Result of a successful verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verified {
    /// First-party conditions from the primary and every discharge. The
    /// caller must check each of them before trusting the credential.
    pub conditions: Vec<String>,
}

impl Verified {
    /// Values from `declared <key> <value>` conditions. A key declared
    /// twice with different values is dropped.
    pub fn declared(&self) -> BTreeMap<String, String> {
        let mut declared = BTreeMap::new();
        let mut conflicting = Vec::new();
        for condition in &self.conditions {
            let (name, arg) = parse_condition(condition);
            if name != caveat::COND_DECLARED {
                continue;
            }
            let Some((key, value)) = arg.split_once(' ') else {
                continue;
            };
            match declared.get(key) {
                Some(existing) if existing != value => conflicting.push(key.to_string()),
                _ => {
                    declared.insert(key.to_string(), value.to_string());
                }
            }
        }
        for key in conflicting {
            declared.remove(&key);
        }
        declared
    }
}

/// Mints and verifies macaroons for one service location.
///
/// The bakery is also the only third party it will address: third-party
/// caveats must be located at [`Bakery::discharge_location`], and their
/// ids are sealed with a key derived from the root key.
pub struct Bakery {
    location: String,
    root_key: [u8; KEY_LENGTH],
    discharge_key: [u8; KEY_LENGTH],
}

impl Bakery {
    pub fn new(location: impl Into<String>, root_key: [u8; KEY_LENGTH]) -> Self {
        let location = location.into().trim_end_matches('/').to_string();
        let discharge_key = keyed_hash(&root_key, b"idm-discharge-key");
        Self {
            location,
            root_key,
            discharge_key,
        }
    }

    /// A bakery with a fresh random root key. Macaroons it mints do not
    /// survive a restart.
    pub fn with_random_key(location: impl Into<String>) -> Self {
        Self::new(location, rand::random::<[u8; KEY_LENGTH]>())
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn discharge_location(&self) -> String {
        format!("{}/v1/discharger", self.location)
    }

    pub fn new_macaroon(&self, caveats: &[Caveat]) -> Result<Macaroon> {
        let identifier = rand::random::<[u8; 24]>().to_vec();
        let signature = keyed_hash(&self.root_key, &identifier).to_vec();
        let mut macaroon = Macaroon {
            location: self.location.clone(),
            identifier,
            caveats: Vec::new(),
            signature,
        };
        for caveat in caveats {
            self.add_caveat(&mut macaroon, caveat)?;
        }
        Ok(macaroon)
    }

    #[track_caller]
    pub fn add_caveat(&self, macaroon: &mut Macaroon, caveat: &Caveat) -> Result<()> {
        if caveat.is_first_party() {
            macaroon.add_first_party_caveat(&caveat.condition);
            return Ok(());
        }
        if caveat.location != self.discharge_location() {
            return Err(BakeryError::UnknownThirdParty {
                third_party: caveat.location.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let caveat_key = rand::random::<[u8; KEY_LENGTH]>();
        let current = to_key(&macaroon.signature)?;
        let verification_id = seal(&current, &caveat_key)?;
        let plain_id = serde_json::to_vec(&ThirdPartyCaveatId {
            root_key: STANDARD.encode(caveat_key),
            condition: caveat.condition.clone(),
        })
        .map_err(|e| BakeryError::malformed(e.to_string()))?;
        let id = seal(&self.discharge_key, &plain_id)?;

        macaroon.signature = keyed_hash_pair(&current, &verification_id, &id).to_vec();
        macaroon.caveats.push(MacaroonCaveat {
            location: caveat.location.clone(),
            id,
            verification_id,
        });
        Ok(())
    }

    /// Condition a third-party caveat id asks the discharger to check.
    pub fn third_party_condition(&self, caveat_id: &[u8]) -> Result<String> {
        Ok(self.decode_caveat_id(caveat_id)?.condition)
    }

    /// Discharge a third-party caveat, attaching `caveats` to the discharge.
    /// The result must be bound to its primary before use.
    pub fn discharge(&self, caveat_id: &[u8], caveats: &[Caveat]) -> Result<Macaroon> {
        let decoded = self.decode_caveat_id(caveat_id)?;
        let root_key = STANDARD
            .decode(&decoded.root_key)
            .map_err(|e| BakeryError::malformed(e.to_string()))?;

        let mut discharge = Macaroon {
            location: self.discharge_location(),
            identifier: caveat_id.to_vec(),
            caveats: Vec::new(),
            signature: keyed_hash(&root_key, caveat_id).to_vec(),
        };
        for caveat in caveats {
            self.add_caveat(&mut discharge, caveat)?;
        }
        Ok(discharge)
    }

    /// Check the signatures of a primary macaroon (first element) and its
    /// bound discharges, and collect their first-party conditions. Every
    /// discharge must satisfy exactly one third-party caveat.
    pub fn verify(&self, macaroons: &[Macaroon]) -> Result<Verified> {
        let Some((primary, discharges)) = macaroons.split_first() else {
            return Err(BakeryError::malformed("no macaroons"));
        };

        let mut walk = Walk {
            primary,
            discharges,
            used: vec![false; discharges.len()],
            caveats: 0,
            conditions: Vec::new(),
        };
        self.verify_one(&mut walk, primary, &self.root_key, 0)?;
        if walk.used.contains(&false) {
            return Err(BakeryError::malformed("unused discharge macaroon"));
        }
        Ok(Verified {
            conditions: walk.conditions,
        })
    }

    fn verify_one(
        &self,
        walk: &mut Walk<'_>,
        macaroon: &Macaroon,
        key: &[u8],
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_DISCHARGE_DEPTH {
            return Err(BakeryError::malformed("discharge chain too deep"));
        }

        let mut signature = keyed_hash(key, &macaroon.identifier);
        for caveat in &macaroon.caveats {
            walk.caveats += 1;
            if walk.caveats > MAX_CAVEATS {
                return Err(BakeryError::malformed("too many caveats"));
            }

            if caveat.is_first_party() {
                let condition = String::from_utf8(caveat.id.clone())
                    .map_err(|_| BakeryError::malformed("caveat condition is not UTF-8"))?;
                signature = keyed_hash(&signature, &caveat.id);
                walk.conditions.push(condition);
                continue;
            }

            let index = walk
                .discharges
                .iter()
                .position(|d| d.identifier == caveat.id)
                .ok_or_else(|| BakeryError::MissingDischarge {
                    third_party: caveat.location.clone(),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            if walk.used[index] {
                return Err(BakeryError::malformed("discharge macaroon used twice"));
            }
            walk.used[index] = true;

            let caveat_key = to_key(&open(&signature, &caveat.verification_id)?)?;
            let discharges = walk.discharges;
            self.verify_one(walk, &discharges[index], &caveat_key, depth + 1)?;
            signature = keyed_hash_pair(&signature, &caveat.verification_id, &caveat.id);
        }

        let expected = if depth == 0 {
            signature
        } else {
            keyed_hash(&walk.primary.signature, &signature)
        };
        if !constant_time_eq(&expected, &macaroon.signature) {
            return Err(BakeryError::invalid_signature());
        }
        Ok(())
    }

    fn decode_caveat_id(&self, caveat_id: &[u8]) -> Result<ThirdPartyCaveatId> {
        let plain = open(&self.discharge_key, caveat_id)?;
        serde_json::from_slice(&plain).map_err(|e| BakeryError::malformed(e.to_string()))
    }
}
