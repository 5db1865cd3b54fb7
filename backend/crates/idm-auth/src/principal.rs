use idm_core::{Identity, dedupe_groups};

use std::iter;

/// Group held by the administrator.
pub const ADMIN_GROUP: &str = "admin@idm";

/// Who a request was resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Admin,
    User(Identity),
}

impl Principal {
    /// Group memberships: `admin@idm` for the administrator, otherwise the
    /// username followed by the stored groups.
    pub fn groups(&self) -> Vec<String> {
        match self {
            Self::Admin => vec![ADMIN_GROUP.to_string()],
            Self::User(identity) => dedupe_groups(
                iter::once(identity.username.clone()).chain(identity.groups.iter().cloned()),
            ),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Admin => None,
            Self::User(identity) => Some(identity),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.identity().map(|identity| identity.username.as_str())
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn is_member_of(&self, allowed: &[&str]) -> bool {
        self.groups()
            .iter()
            .any(|group| allowed.contains(&group.as_str()))
    }
}
