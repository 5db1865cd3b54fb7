use std::fmt;

/// Error classification shared by every crate in the workspace.
///
/// Wrapping errors delegate to their source, so the code of a store failure
/// survives being surfaced through the authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotFound,
    AlreadyExists,
    BadRequest,
    Unauthorized,
    NoAdminCredsProvided,
    Forbidden,
    DischargeRequired,
    ServiceUnavailable,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NoAdminCredsProvided => "NO_ADMIN_CREDS_PROVIDED",
            Self::Forbidden => "FORBIDDEN",
            Self::DischargeRequired => "DISCHARGE_REQUIRED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
