use std::sync::Arc;

use poem_openapi::{Object, OpenApi};

use super::ApiTags;
use crate::envelope::{ApiResult, Reply, RouteMessages};
use crate::error::AppError;
use crate::state::AppState;

const HEALTH: RouteMessages = RouteMessages::new("Service is healthy.", "Database unreachable.");

#[derive(Debug, Object)]
pub struct Health {
    pub database: bool,
    pub version: String,
}

pub struct HealthApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Health")]
impl HealthApi {
    /// Liveness check; pings the database
    #[oai(path = "/health", method = "get")]
    async fn health(&self) -> ApiResult<Health> {
        self.state
            .db
            .ping()
            .await
            .map(|()| Health { database: true, version: env!("CARGO_PKG_VERSION").to_owned() })
            .map_err(|e| AppError::Internal(e.into()))
            .reply(HEALTH)
    }
}
