use crate::{Identity, PublicKey, dedupe_groups};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Partial update of an identity. Fields left as `None` are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub groups: Option<Vec<String>>,
    pub public_keys: Option<Vec<PublicKey>>,
    pub ssh_keys: Option<Vec<String>>,
    /// `Some` sets the entry, `None` removes it
    pub extra_info: BTreeMap<String, Option<Vec<u8>>>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_discharge: Option<DateTime<Utc>>,
}

impl IdentityUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_public_keys(mut self, public_keys: Vec<PublicKey>) -> Self {
        self.public_keys = Some(public_keys);
        self
    }

    pub fn with_ssh_keys<I, S>(mut self, ssh_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ssh_keys = Some(ssh_keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn set_extra_info(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.extra_info.insert(key.into(), Some(value.into()));
        self
    }

    pub fn remove_extra_info(mut self, key: impl Into<String>) -> Self {
        self.extra_info.insert(key.into(), None);
        self
    }

    pub fn with_last_login(mut self, at: DateTime<Utc>) -> Self {
        self.last_login = Some(at);
        self
    }

    pub fn with_last_discharge(mut self, at: DateTime<Utc>) -> Self {
        self.last_discharge = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, identity: &mut Identity) {
        if let Some(email) = &self.email {
            identity.email = email.clone();
        }
        if let Some(full_name) = &self.full_name {
            identity.full_name = full_name.clone();
        }
        if let Some(groups) = &self.groups {
            identity.groups = dedupe_groups(groups.iter().cloned());
        }
        if let Some(public_keys) = &self.public_keys {
            identity.public_keys = public_keys.clone();
        }
        if let Some(ssh_keys) = &self.ssh_keys {
            identity.ssh_keys = ssh_keys.clone();
        }
        for (key, value) in &self.extra_info {
            match value {
                Some(value) => {
                    identity.extra_info.insert(key.clone(), value.clone());
                }
                None => {
                    identity.extra_info.remove(key);
                }
            }
        }
        if let Some(at) = self.last_login {
            identity.last_login = Some(at);
        }
        if let Some(at) = self.last_discharge {
            identity.last_discharge = Some(at);
        }
    }
}
