use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const COND_DECLARED: &str = "declared";
pub const COND_TIME_BEFORE: &str = "time-before";
pub const COND_ALLOW: &str = "allow";
pub const COND_DENY: &str = "deny";
pub const COND_NEED_DECLARED: &str = "need-declared";

/// A condition to attach to a macaroon. An empty location means the
/// condition is checked by the service itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caveat {
    #[serde(default)]
    pub location: String,
    pub condition: String,
}

impl Caveat {
    pub fn first_party(condition: impl Into<String>) -> Self {
        Self {
            location: String::new(),
            condition: condition.into(),
        }
    }

    pub fn third_party(location: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            condition: condition.into(),
        }
    }

    pub fn is_first_party(&self) -> bool {
        self.location.is_empty()
    }
}

pub fn declared_caveat(key: &str, value: &str) -> Caveat {
    Caveat::first_party(format!("{} {} {}", COND_DECLARED, key, value))
}

pub fn time_before_caveat(deadline: DateTime<Utc>) -> Caveat {
    Caveat::first_party(format!(
        "{} {}",
        COND_TIME_BEFORE,
        deadline.to_rfc3339_opts(SecondsFormat::Secs, true)
    ))
}

pub fn allow_caveat(operations: &[&str]) -> Caveat {
    Caveat::first_party(format!("{} {}", COND_ALLOW, operations.join(" ")))
}

pub fn deny_caveat(operations: &[&str]) -> Caveat {
    Caveat::first_party(format!("{} {}", COND_DENY, operations.join(" ")))
}

/// Split a condition into its name and argument.
pub fn parse_condition(condition: &str) -> (&str, &str) {
    match condition.split_once(' ') {
        Some((name, arg)) => (name, arg),
        None => (condition, ""),
    }
}
