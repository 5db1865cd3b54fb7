use crate::bakery::crypto::keyed_hash;

use serde::{Deserialize, Serialize};

/// A caveat as carried on a macaroon. First-party caveats have an empty
/// verification id and carry their condition in `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacaroonCaveat {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(with = "base64_bytes")]
    pub id: Vec<u8>,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub verification_id: Vec<u8>,
}

impl MacaroonCaveat {
    pub fn is_first_party(&self) -> bool {
        self.verification_id.is_empty()
    }
}

/// Bearer credential with a chained HMAC signature over its caveats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macaroon {
    pub location: String,
    #[serde(with = "base64_bytes")]
    pub identifier: Vec<u8>,
    #[serde(default)]
    pub caveats: Vec<MacaroonCaveat>,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

impl Macaroon {
    /// Attenuate with a condition checked by the target service. Anyone
    /// holding the macaroon can do this.
    pub fn add_first_party_caveat(&mut self, condition: &str) {
        self.signature = keyed_hash(&self.signature, condition.as_bytes()).to_vec();
        self.caveats.push(MacaroonCaveat {
            location: String::new(),
            id: condition.as_bytes().to_vec(),
            verification_id: Vec::new(),
        });
    }

    /// Conditions of the first-party caveats, in order.
    pub fn first_party_conditions(&self) -> impl Iterator<Item = String> + '_ {
        self.caveats
            .iter()
            .filter(|c| c.is_first_party())
            .map(|c| String::from_utf8_lossy(&c.id).into_owned())
    }

    pub fn third_party_caveats(&self) -> impl Iterator<Item = &MacaroonCaveat> {
        self.caveats.iter().filter(|c| !c.is_first_party())
    }

    /// Bind this discharge to `primary` so it cannot be replayed with any
    /// other macaroon.
    pub fn bind(&self, primary: &Macaroon) -> Macaroon {
        let mut bound = self.clone();
        bound.signature = keyed_hash(&primary.signature, &self.signature).to_vec();
        bound
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
