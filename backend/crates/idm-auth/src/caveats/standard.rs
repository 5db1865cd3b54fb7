use crate::CaveatError;
use crate::bakery::caveat::{COND_ALLOW, COND_DECLARED, COND_DENY, COND_TIME_BEFORE};
use crate::bakery::parse_condition;

use idm_core::ErrorLocation;

use std::fmt;
use std::panic::Location;

use chrono::{DateTime, Utc};

/// The operation a request wants to perform, checked against `allow` and
/// `deny` caveats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation(String);

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks the conditions every service understands.
pub struct StandardChecker<'a> {
    operation: &'a Operation,
    now: DateTime<Utc>,
}

impl<'a> StandardChecker<'a> {
    pub fn new(operation: &'a Operation) -> Self {
        Self::at(operation, Utc::now())
    }

    pub fn at(operation: &'a Operation, now: DateTime<Utc>) -> Self {
        Self { operation, now }
    }

    /// `None` when the condition is not one of the standard ones.
    pub fn check(&self, condition: &str) -> Option<Result<(), CaveatError>> {
        let (name, arg) = parse_condition(condition);
        let result = match name {
            COND_DECLARED => match arg.split_once(' ') {
                Some((key, _)) if !key.is_empty() => Ok(()),
                _ => Err(CaveatError::badly_formatted()),
            },
            COND_TIME_BEFORE => self.check_time_before(arg),
            COND_ALLOW => self.check_operations(arg, true),
            COND_DENY => self.check_operations(arg, false),
            _ => return None,
        };
        Some(result)
    }

    fn check_time_before(&self, arg: &str) -> Result<(), CaveatError> {
        let deadline =
            DateTime::parse_from_rfc3339(arg.trim()).map_err(|_| CaveatError::badly_formatted())?;
        if self.now >= deadline {
            return Err(CaveatError::Expired {
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    fn check_operations(&self, arg: &str, allow: bool) -> Result<(), CaveatError> {
        let mut operations = arg.split_whitespace().peekable();
        if operations.peek().is_none() {
            return Err(CaveatError::badly_formatted());
        }
        let listed = operations.any(|op| op == self.operation.name());
        if listed == allow {
            Ok(())
        } else {
            Err(CaveatError::OperationNotAllowed {
                operation: self.operation.name().to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}
