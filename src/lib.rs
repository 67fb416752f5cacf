pub mod api;
pub mod auth;
pub mod config;
pub mod entities;
pub mod envelope;
pub mod error;
pub mod mailer;
pub mod migration;
pub mod services;
pub mod state;
pub mod validation;

use std::sync::Arc;

use poem::middleware::{CookieJarManager, Cors, Tracing};
use poem::{Endpoint, EndpointExt, Route};

use crate::state::AppState;

/// The full HTTP application: API under `/v1`, Swagger UI under `/docs`.
///
/// Every error leaving the router, including unknown routes and rejected
/// payloads, is rendered as an error envelope.
pub fn app(state: Arc<AppState>) -> impl Endpoint {
    let api = api::service(state.clone());
    let ui = api.swagger_ui();
    let openapi_json = api.spec_endpoint();

    Route::new()
        .nest("/v1", api)
        .nest("/docs", ui)
        .at("/openapi.json", openapi_json)
        .with(Cors::new().allow_credentials(true))
        .with(CookieJarManager::new())
        .with(Tracing)
        .data(state)
        .catch_all_error(envelope::catch_all)
}
