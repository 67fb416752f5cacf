//! HTTP surface: one `#[OpenApi]` group per resource, merged into a single service.

pub mod address;
pub mod auth;
pub mod health;
pub mod messages;
pub mod posts;
pub mod profiles;
pub mod roles;
pub mod users;

use std::sync::Arc;

use poem_openapi::{Object, OpenApiService, Tags};

use crate::state::AppState;

#[derive(Tags)]
pub enum ApiTags {
    /// Signup, login and token flows
    Auth,
    /// The caller's own profile
    Profiles,
    /// Administration and people search
    Users,
    Address,
    Roles,
    /// Condominium feed
    Posts,
    Messages,
    Health,
}

/// Returned by delete routes.
#[derive(Debug, Object)]
pub struct Deleted {
    pub id: i32,
}

pub type Apis = (
    auth::AuthApi,
    profiles::ProfileApi,
    users::UserApi,
    address::AddressApi,
    roles::RoleApi,
    posts::PostApi,
    messages::MessageApi,
    health::HealthApi,
);

pub fn service(state: Arc<AppState>) -> OpenApiService<Apis, ()> {
    OpenApiService::new(
        (
            auth::AuthApi { state: state.clone() },
            profiles::ProfileApi { state: state.clone() },
            users::UserApi { state: state.clone() },
            address::AddressApi { state: state.clone() },
            roles::RoleApi { state: state.clone() },
            posts::PostApi { state: state.clone() },
            messages::MessageApi { state: state.clone() },
            health::HealthApi { state },
        ),
        "Condo API",
        env!("CARGO_PKG_VERSION"),
    )
    .server("/v1")
}
