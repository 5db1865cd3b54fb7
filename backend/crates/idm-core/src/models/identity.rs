use crate::{CoreError, ErrorLocation, PublicKey, Result as CoreErrorResult, dedupe_groups};

use std::collections::BTreeMap;
use std::panic::Location;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored principal.
///
/// Interactive identities carry an `external_id` from the login provider,
/// agent identities carry the `owner` that created them. Exactly one of the
/// two is present on every stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    /// Assigned by the store on first insert
    pub uuid: Option<Uuid>,
    pub username: String,
    pub external_id: Option<String>,
    pub owner: Option<String>,
    pub email: String,
    pub full_name: String,
    pub groups: Vec<String>,
    pub public_keys: Vec<PublicKey>,
    pub ssh_keys: Vec<String>,
    pub extra_info: BTreeMap<String, Vec<u8>>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_discharge: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn interactive(username: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            external_id: Some(external_id.into()),
            ..Self::default()
        }
    }

    pub fn agent(username: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            owner: Some(owner.into()),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_public_keys(mut self, public_keys: Vec<PublicKey>) -> Self {
        self.public_keys = public_keys;
        self
    }

    pub fn with_ssh_keys<I, S>(mut self, ssh_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ssh_keys = ssh_keys.into_iter().map(Into::into).collect();
        self
    }

    /// External ID, treating an empty string as absent
    pub fn external_id_value(&self) -> Option<&str> {
        self.external_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Owner, treating an empty string as absent
    pub fn owner_value(&self) -> Option<&str> {
        self.owner.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_agent(&self) -> bool {
        self.owner_value().is_some()
    }

    pub fn has_public_key(&self, key: &PublicKey) -> bool {
        self.public_keys
            .iter()
            .any(|k| k.as_bytes() == key.as_bytes())
    }

    /// Check the write-time invariants of an identity document.
    #[track_caller]
    pub fn validate(&self) -> CoreErrorResult<()> {
        let invalid = |message: &str| CoreError::InvalidRecord {
            message: message.to_string(),
            location: ErrorLocation::from(Location::caller()),
        };

        if self.username.is_empty() {
            return Err(invalid("no username specified"));
        }

        match (self.external_id_value(), self.owner_value()) {
            (None, None) => Err(invalid("no external_id or owner specified")),
            (Some(_), Some(_)) => Err(invalid("both external_id and owner specified")),
            _ => Ok(()),
        }
    }

    /// Copy of the document as it is written: empty optional identifiers
    /// dropped and groups de-duplicated.
    pub fn normalized(&self) -> Self {
        Self {
            external_id: self.external_id_value().map(str::to_string),
            owner: self.owner_value().map(str::to_string),
            groups: dedupe_groups(self.groups.iter().cloned()),
            ..self.clone()
        }
    }
}
