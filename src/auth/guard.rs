use std::sync::Arc;

use poem::Request;
use poem_openapi::SecurityScheme;
use poem_openapi::auth::{ApiKey, Bearer};

use super::token::Purpose;
use crate::entities::enums::Role;
use crate::error::AppError;
use crate::services::users;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "access_token";

/// Account behind a verified session, as currently stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id_user: i32,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Insufficient permissions."))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Resolves an access token to the account it was issued for.
///
/// The account is reloaded on every request: deleted or deactivated users are
/// rejected and the role comes from the stored row, not from the token.
async fn authenticate(req: &Request, token: &str) -> Option<AuthUser> {
    let state = req.data::<Arc<AppState>>()?;
    let claims = state.tokens.verify(token, Purpose::Access).ok()?;
    let id_user = claims.sub?;
    let found = match users::find_by_id(&state.db, id_user).await {
        Ok(found) => found,
        Err(e) => {
            tracing::error!(id_user, error = %e, "session lookup failed");
            return None;
        }
    };
    match found {
        Some(u) if u.is_active => Some(AuthUser { id_user: u.id_user, email: u.email, role: u.role }),
        Some(_) => {
            tracing::debug!(id_user, "session rejected, user inactive");
            None
        }
        None => {
            tracing::debug!(id_user, "session rejected, user no longer exists");
            None
        }
    }
}

/// Access token sent as `Authorization: Bearer <jwt>`.
/// Either this or the `access_token` cookie is enough.
#[derive(SecurityScheme)]
#[oai(ty = "bearer", bearer_format = "JWT", checker = "check_bearer")]
pub struct BearerSession(AuthUser);

async fn check_bearer(req: &Request, bearer: Bearer) -> Option<AuthUser> {
    authenticate(req, &bearer.token).await
}

/// Access token in the `access_token` cookie set by `/auth/login`.
/// Either this or a bearer token is enough.
#[derive(SecurityScheme)]
#[oai(ty = "api_key", key_name = "access_token", key_in = "cookie", checker = "check_cookie")]
pub struct CookieSession(AuthUser);

async fn check_cookie(req: &Request, key: ApiKey) -> Option<AuthUser> {
    authenticate(req, &key.key).await
}

/// Bearer header first, then the session cookie.
#[derive(SecurityScheme)]
pub enum Session {
    Bearer(BearerSession),
    Cookie(CookieSession),
}

impl Session {
    pub fn user(&self) -> &AuthUser {
        match self {
            Session::Bearer(BearerSession(user)) | Session::Cookie(CookieSession(user)) => user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_check() {
        let mut user = AuthUser { id_user: 1, email: "a@b.co".into(), role: Role::User };
        assert!(matches!(user.require_admin(), Err(AppError::Forbidden(_))));
        user.role = Role::AdminRoot;
        assert!(user.require_admin().is_ok());
    }
}
