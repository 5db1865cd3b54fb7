use idm_core::{Identity, PublicKey, Username};

pub fn username(name: &str) -> Username {
    Username::parse(name).expect("valid test username")
}

/// A stored key is any byte string; these are 31 bytes like the legacy data
pub fn key(fill: u8) -> PublicKey {
    PublicKey::from_bytes(vec![fill; 31])
}

pub fn interactive(name: &str) -> Identity {
    Identity::interactive(name, format!("http://example.com/{}", name))
        .with_email(format!("{}@example.com", name))
        .with_full_name("Test User")
        .with_groups(["test"])
}

pub fn agent(name: &str, owner: &str) -> Identity {
    Identity::agent(name, owner)
        .with_email(format!("{}@example.com", name))
        .with_full_name("Test Agent")
        .with_groups(["test"])
        .with_public_keys(vec![key(b'0')])
}
