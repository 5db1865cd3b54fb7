use crate::bakery::caveat::COND_NEED_DECLARED;
use crate::bakery::{
    Bakery, BakeryError, Caveat, Macaroon, macaroon_cookies, parse_condition, time_before_caveat,
};
use crate::{
    AdminCredentials, AuthError, CaveatChecker, CaveatError, Operation, Principal,
    Result as AuthErrorResult, StandardChecker, UserHasPublicKeyChecker,
};

use idm_core::{ErrorLocation, Identity, Username};
use idm_store::IdentityStore;

use std::panic::Location;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use http::HeaderMap;
use url::Url;

/// Declaration the discharger adds once it has authenticated the user
pub const USERNAME_DECLARATION: &str = "username";
pub const IS_AUTHENTICATED_USER: &str = "is-authenticated-user";

/// Lifetime of the macaroon minted for a discharge-required response
const DISCHARGE_REQUIRED_EXPIRY_HOURS: i64 = 24;

/// How one macaroon slice from the request turned out.
enum SliceOutcome {
    Authenticated(Identity),
    /// Could become valid with a fresh discharge
    NotYetUsable(String),
    Invalid(String),
}

/// Resolves request credentials to a [`Principal`] and enforces ACLs.
pub struct Authorizer {
    admin: AdminCredentials,
    bakery: Arc<Bakery>,
    checkers: Vec<Arc<dyn CaveatChecker>>,
    macaroon_path: String,
}

impl Authorizer {
    pub fn new(admin: AdminCredentials, bakery: Arc<Bakery>) -> Self {
        let macaroon_path = Url::parse(bakery.location())
            .ok()
            .map(|url| url.path().to_string())
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| "/".to_string());

        Self {
            admin,
            bakery,
            checkers: vec![Arc::new(UserHasPublicKeyChecker)],
            macaroon_path,
        }
    }

    pub fn with_checker(mut self, checker: Arc<dyn CaveatChecker>) -> Self {
        self.checkers.push(checker);
        self
    }

    pub fn bakery(&self) -> &Bakery {
        &self.bakery
    }

    /// Cookie path for macaroons minted by this service
    pub fn macaroon_path(&self) -> &str {
        &self.macaroon_path
    }

    /// Resolve the caller of a request.
    ///
    /// Admin basic-auth wins whenever the header is present. Otherwise each
    /// macaroon cookie is tried in turn; the first that verifies names the
    /// user. If none does, a malformed or failing credential is reported as
    /// unauthorized, and a missing or stale one as discharge-required.
    pub async fn authenticate(
        &self,
        store: &mut IdentityStore,
        operation: &Operation,
        headers: &HeaderMap,
    ) -> AuthErrorResult<Principal> {
        if let Some(admin) = self.check_admin(operation, headers)? {
            return Ok(admin);
        }

        let mut rejected = false;
        for slice in macaroon_cookies(headers) {
            let outcome = match slice {
                Ok(macaroons) => self.check_slice(store, operation, &macaroons).await?,
                Err(e) => SliceOutcome::Invalid(e.to_string()),
            };
            match outcome {
                SliceOutcome::Authenticated(identity) => {
                    log::debug!(
                        "Request authenticated as {} for {}",
                        identity.username,
                        operation
                    );
                    return Ok(Principal::User(identity));
                }
                SliceOutcome::NotYetUsable(reason) => {
                    log::debug!("Skipping macaroon: {}", reason);
                }
                SliceOutcome::Invalid(reason) => {
                    log::debug!("Rejecting macaroon: {}", reason);
                    rejected = true;
                }
            }
        }

        // Reasons carry source locations and stay in the log
        if rejected {
            return Err(AuthError::unauthorized("macaroon not valid"));
        }
        Err(self.discharge_required("authentication required"))
    }

    /// Admin basic-auth on its own, without touching the store. `None` when
    /// the request carries no `Authorization` header; a header that is
    /// present but wrong is an error.
    pub fn check_admin(
        &self,
        operation: &Operation,
        headers: &HeaderMap,
    ) -> AuthErrorResult<Option<Principal>> {
        match self.admin.check(headers) {
            Ok(()) => {
                log::debug!("Request authenticated as admin for {}", operation);
                Ok(Some(Principal::Admin))
            }
            Err(AuthError::NoAdminCredsProvided { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Groups of the request's caller
    pub async fn groups_from_request(
        &self,
        store: &mut IdentityStore,
        operation: &Operation,
        headers: &HeaderMap,
    ) -> AuthErrorResult<Vec<String>> {
        let principal = self.authenticate(store, operation, headers).await?;
        Ok(principal.groups())
    }

    /// Succeed when the caller belongs to at least one of `allowed`.
    pub async fn check_acl(
        &self,
        store: &mut IdentityStore,
        operation: &Operation,
        headers: &HeaderMap,
        allowed: &[&str],
    ) -> AuthErrorResult<Principal> {
        let principal = self.authenticate(store, operation, headers).await?;
        require_membership(principal, allowed)
    }

    /// Macaroon a client must discharge before retrying, wrapped as the
    /// error that carries it.
    #[track_caller]
    pub fn discharge_required(&self, message: &str) -> AuthError {
        let caveats = [
            Caveat::third_party(
                self.bakery.discharge_location(),
                format!(
                    "{} {} {}",
                    COND_NEED_DECLARED, USERNAME_DECLARATION, IS_AUTHENTICATED_USER
                ),
            ),
            time_before_caveat(Utc::now() + TimeDelta::hours(DISCHARGE_REQUIRED_EXPIRY_HOURS)),
        ];
        match self.bakery.new_macaroon(&caveats) {
            Ok(macaroon) => AuthError::DischargeRequired {
                message: message.to_string(),
                macaroon: Box::new(macaroon),
                macaroon_path: self.macaroon_path.clone(),
                location: ErrorLocation::from(Location::caller()),
            },
            Err(e) => e.into(),
        }
    }

    async fn check_slice(
        &self,
        store: &mut IdentityStore,
        operation: &Operation,
        macaroons: &[Macaroon],
    ) -> AuthErrorResult<SliceOutcome> {
        let verified = match self.bakery.verify(macaroons) {
            Ok(verified) => verified,
            Err(e @ BakeryError::MissingDischarge { .. }) => {
                return Ok(SliceOutcome::NotYetUsable(e.to_string()));
            }
            Err(e) => return Ok(SliceOutcome::Invalid(e.to_string())),
        };

        let standard = StandardChecker::new(operation);
        let mut key_holder: Option<Identity> = None;
        for condition in &verified.conditions {
            if let Some(result) = standard.check(condition) {
                match result {
                    Ok(()) => continue,
                    Err(e) if e.is_expired() => {
                        return Ok(SliceOutcome::NotYetUsable(e.to_string()));
                    }
                    Err(e) => return Ok(SliceOutcome::Invalid(e.to_string())),
                }
            }

            let (name, arg) = parse_condition(condition);
            let Some(checker) = self.checkers.iter().find(|c| c.condition() == name) else {
                let e = CaveatError::Unrecognized {
                    condition: condition.clone(),
                    location: ErrorLocation::from(Location::caller()),
                };
                return Ok(SliceOutcome::Invalid(e.to_string()));
            };

            match checker.check(store, arg).await {
                Ok(Some(identity)) => match &key_holder {
                    Some(existing) if existing.username != identity.username => {
                        return Ok(SliceOutcome::Invalid(
                            "caveats name different users".to_string(),
                        ));
                    }
                    _ => key_holder = Some(identity),
                },
                Ok(None) => {}
                Err(CaveatError::Store { source }) => return Err(source.into()),
                Err(e) => return Ok(SliceOutcome::Invalid(e.to_string())),
            }
        }

        let declared = verified.declared().remove(USERNAME_DECLARATION);
        let identity = match (declared, key_holder) {
            (Some(username), Some(holder)) if holder.username != username => {
                return Ok(SliceOutcome::Invalid(format!(
                    "declared user {:?} does not hold the public key",
                    username
                )));
            }
            (_, Some(holder)) => holder,
            (Some(username), None) => {
                let username = match Username::parse(&username) {
                    Ok(username) => username,
                    Err(e) => return Ok(SliceOutcome::Invalid(e.to_string())),
                };
                store.get_identity(&username).await?
            }
            (None, None) => {
                return Ok(SliceOutcome::Invalid("no user declared".to_string()));
            }
        };
        Ok(SliceOutcome::Authenticated(identity))
    }
}

/// Pass `principal` through when it belongs to at least one of `allowed`.
#[track_caller]
pub fn require_membership(principal: Principal, allowed: &[&str]) -> AuthErrorResult<Principal> {
    if principal.is_member_of(allowed) {
        return Ok(principal);
    }
    Err(AuthError::forbidden(format!(
        "{} is not a member of any of {:?}",
        principal.username().unwrap_or("admin"),
        allowed
    )))
}
