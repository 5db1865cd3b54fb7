pub mod api;
pub mod app_state;
pub mod error;
pub mod health;
pub mod logger;
pub mod routes;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use api::{
    error::{ApiError, Result as ApiResult},
    users::{
        GroupsBody, PublicKeysBody, PutUserRequest, UserResponse, WhoAmIResponse, get_groups,
        get_user, put_groups, put_public_keys, put_user, refresh_groups, whoami,
    },
};
pub use app_state::AppState;
pub use routes::build_router;
