use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::TokenService;
use crate::config::Config;
use crate::mailer::Mailer;

/// Shared by every API group and the security checkers.
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub tokens: TokenService,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.access_token_ttl_secs);
        Self { db, config, tokens, mailer }
    }

    /// `{FRONTEND_URL}{path}` with url-encoded query parameters.
    pub fn frontend_link(&self, path: &str, params: &[(&str, &str)]) -> String {
        let base = format!("{}{}", self.config.frontend_url, path);
        match reqwest::Url::parse_with_params(&base, params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(%base, error = %e, "FRONTEND_URL is not a valid url");
                base
            }
        }
    }
}
