use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::entities::enums::Role;
use crate::error::AppError;

const INVITE_TTL_SECS: i64 = 7 * 24 * 60 * 60;
const RECOVERY_TTL_SECS: i64 = 60 * 60;
const EMAIL_CONFIRMATION_TTL_SECS: i64 = 2 * 24 * 60 * 60;

/// What a token may be used for. A token is only accepted for its own purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Access,
    Invite,
    Recovery,
    EmailConfirmation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// `id_user`; absent on invitations, which precede the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<i32>,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub purpose: Purpose,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer/verifier built from `JWT_SECRET_KEY`.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    fn ttl(&self, purpose: Purpose) -> i64 {
        match purpose {
            Purpose::Access => self.access_ttl_secs,
            Purpose::Invite => INVITE_TTL_SECS,
            Purpose::Recovery => RECOVERY_TTL_SECS,
            Purpose::EmailConfirmation => EMAIL_CONFIRMATION_TTL_SECS,
        }
    }

    pub fn issue(
        &self,
        purpose: Purpose,
        sub: Option<i32>,
        email: &str,
        role: Role,
        name: Option<&str>,
    ) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub,
            email: email.to_owned(),
            role,
            name: name.map(str::to_owned),
            purpose,
            iat: now,
            exp: now + self.ttl(purpose),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {e}")))
    }

    /// Decodes `token` and checks signature, expiry and purpose.
    pub fn verify(&self, token: &str, purpose: Purpose) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            tracing::debug!(error = %e, "rejected token");
            AppError::unauthorized("Invalid or expired token.")
        })?;
        if data.claims.purpose != purpose {
            return Err(AppError::unauthorized("Invalid or expired token."));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 3600)
    }

    #[test]
    fn access_token_round_trip() {
        let tokens = service();
        let token = tokens
            .issue(Purpose::Access, Some(42), "ana@condo.app", Role::Admin, None)
            .unwrap();
        let claims = tokens.verify(&token, Purpose::Access).unwrap();
        assert_eq!(claims.sub, Some(42));
        assert_eq!(claims.email, "ana@condo.app");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn purpose_is_enforced() {
        let tokens = service();
        let token = tokens
            .issue(Purpose::Recovery, Some(1), "a@b.co", Role::User, None)
            .unwrap();
        assert!(tokens.verify(&token, Purpose::Access).is_err());
        assert!(tokens.verify(&token, Purpose::Recovery).is_ok());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = TokenService::new("other", 60)
            .issue(Purpose::Access, Some(1), "a@b.co", Role::User, None)
            .unwrap();
        let err = service().verify(&token, Purpose::Access).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new("test-secret", -3600);
        let token = tokens
            .issue(Purpose::Access, Some(1), "a@b.co", Role::User, None)
            .unwrap();
        assert!(tokens.verify(&token, Purpose::Access).is_err());
    }

    #[test]
    fn invitation_carries_name_without_subject() {
        let tokens = service();
        let token = tokens
            .issue(Purpose::Invite, None, "new@condo.app", Role::User, Some("Maria Souza"))
            .unwrap();
        let claims = tokens.verify(&token, Purpose::Invite).unwrap();
        assert_eq!(claims.sub, None);
        assert_eq!(claims.name.as_deref(), Some("Maria Souza"));
    }
}
