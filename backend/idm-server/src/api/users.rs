//! Identity REST handlers
//!
//! Every handler authenticates the caller through the [`Authorizer`] before
//! touching the store. Reads are the `read` operation, everything else is
//! `write`.
//!
//! [`Authorizer`]: idm_auth::Authorizer

use crate::{AppState, ApiResult};

use idm_auth::{ADMIN_GROUP, Operation, Principal, require_membership};
use idm_core::{Identity, PublicKey, Username};
use idm_store::{IdentityStore, Pooled};

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const READ: &str = "read";
const WRITE: &str = "write";

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    pub username: Option<String>,
    pub admin: bool,
    pub groups: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub uuid: Option<String>,
    pub external_id: Option<String>,
    pub owner: Option<String>,
    pub email: String,
    pub full_name: String,
    pub groups: Vec<String>,
    pub public_keys: Vec<String>,
    pub ssh_keys: Vec<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_discharge: Option<DateTime<Utc>>,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            username: identity.username,
            uuid: identity.uuid.map(|uuid| uuid.to_string()),
            external_id: identity.external_id,
            owner: identity.owner,
            email: identity.email,
            full_name: identity.full_name,
            groups: identity.groups,
            public_keys: identity
                .public_keys
                .iter()
                .map(PublicKey::to_string)
                .collect(),
            ssh_keys: identity.ssh_keys,
            last_login: identity.last_login,
            last_discharge: identity.last_discharge,
        }
    }
}

/// Body of `PUT /v1/u/{username}`. Exactly one of `external_id` and
/// `owner` must be given.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PutUserRequest {
    pub external_id: Option<String>,
    pub owner: Option<String>,
    pub email: String,
    pub full_name: String,
    pub groups: Vec<String>,
    /// Standard base64, 32 bytes each
    pub public_keys: Vec<String>,
    pub ssh_keys: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupsBody {
    pub groups: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicKeysBody {
    pub public_keys: Vec<String>,
}

/// Capacity-limited session for the data operation of a request.
async fn session(state: &AppState) -> ApiResult<Pooled<IdentityStore>> {
    Ok(state.pool.get().await?)
}

fn parse_public_keys(keys: &[String]) -> ApiResult<Vec<PublicKey>> {
    let keys = keys
        .iter()
        .map(|key| PublicKey::parse(key))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(keys)
}

/// Resolve the caller. Admin basic-auth needs no store; macaroon checks run
/// on a session outside the pool limit.
async fn authenticate(
    state: &AppState,
    operation: &str,
    headers: &HeaderMap,
) -> ApiResult<Principal> {
    let operation = Operation::new(operation);
    if let Some(admin) = state.authorizer.check_admin(&operation, headers)? {
        return Ok(admin);
    }

    let mut store = state.pool.get_no_limit().await?;
    let principal = state
        .authorizer
        .authenticate(&mut store, &operation, headers)
        .await?;
    Ok(principal)
}

async fn require(
    state: &AppState,
    operation: &str,
    headers: &HeaderMap,
    allowed: &[&str],
) -> ApiResult<Principal> {
    let principal = authenticate(state, operation, headers).await?;
    Ok(require_membership(principal, allowed)?)
}

/// GET /v1/whoami
pub async fn whoami(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<WhoAmIResponse>> {
    let principal = authenticate(&state, READ, &headers).await?;

    Ok(Json(WhoAmIResponse {
        username: principal.username().map(str::to_string),
        admin: principal.is_admin(),
        groups: principal.groups(),
    }))
}

/// GET /v1/u/{username}
///
/// Visible to the admin and to the user themself.
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<UserResponse>> {
    let username = Username::parse(&username)?;
    require(&state, READ, &headers, &[ADMIN_GROUP, username.as_str()]).await?;
    let mut store = session(&state).await?;

    let identity = store.get_identity(&username).await?;
    Ok(Json(identity.into()))
}

/// PUT /v1/u/{username}
///
/// Create or replace an identity.
pub async fn put_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Json(request): Json<PutUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let username = Username::parse(&username)?;
    require(&state, WRITE, &headers, &[ADMIN_GROUP]).await?;
    let mut store = session(&state).await?;

    let public_keys = parse_public_keys(&request.public_keys)?;
    let identity = Identity {
        username: username.to_string(),
        external_id: request.external_id,
        owner: request.owner,
        email: request.email,
        full_name: request.full_name,
        groups: request.groups,
        public_keys,
        ssh_keys: request.ssh_keys,
        ..Identity::default()
    };
    let stored = store.upsert_identity(&identity, None).await?;
    log::info!("Stored identity {}", stored.username);

    Ok(Json(stored.into()))
}

/// GET /v1/u/{username}/groups
pub async fn get_groups(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<GroupsBody>> {
    let username = Username::parse(&username)?;
    require(&state, READ, &headers, &[ADMIN_GROUP]).await?;
    let mut store = session(&state).await?;

    let identity = store.get_identity(&username).await?;
    Ok(Json(GroupsBody {
        groups: identity.groups,
    }))
}

/// PUT /v1/u/{username}/groups
pub async fn put_groups(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Json(body): Json<GroupsBody>,
) -> ApiResult<Json<GroupsBody>> {
    let username = Username::parse(&username)?;
    require(&state, WRITE, &headers, &[ADMIN_GROUP]).await?;
    let mut store = session(&state).await?;

    store.set_groups(&username, &body.groups).await?;
    let identity = store.get_identity(&username).await?;
    Ok(Json(GroupsBody {
        groups: identity.groups,
    }))
}

/// PUT /v1/u/{username}/public-keys
pub async fn put_public_keys(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Json(body): Json<PublicKeysBody>,
) -> ApiResult<Json<PublicKeysBody>> {
    let username = Username::parse(&username)?;
    require(&state, WRITE, &headers, &[ADMIN_GROUP]).await?;
    let mut store = session(&state).await?;

    let public_keys = parse_public_keys(&body.public_keys)?;
    store.set_public_keys(&username, &public_keys).await?;
    Ok(Json(PublicKeysBody {
        public_keys: public_keys.iter().map(PublicKey::to_string).collect(),
    }))
}

/// POST /v1/u/{username}/groups/refresh
///
/// Merge the external directory's groups into the stored ones.
pub async fn refresh_groups(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<GroupsBody>> {
    let username = Username::parse(&username)?;
    require(&state, WRITE, &headers, &[ADMIN_GROUP]).await?;
    let mut store = session(&state).await?;

    let groups = store.merge_external_groups(&username).await?;
    Ok(Json(GroupsBody { groups }))
}
