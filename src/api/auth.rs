use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use poem::web::cookie::{Cookie, CookieJar, SameSite};
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use sea_orm::Set;
use validator::Validate;

use super::ApiTags;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthUser, Purpose, SESSION_COOKIE, Session};
use crate::entities::enums::Role;
use crate::entities::user;
use crate::envelope::{ApiResult, Reply, RouteMessages};
use crate::error::{AppError, AppResult};
use crate::mailer;
use crate::services::users::{self, NewUser, capitalize_full_name};
use crate::state::AppState;
use crate::validation;

const SEND_SIGNUP_EMAIL: RouteMessages =
    RouteMessages::new("Signup e-mail sent successfully.", "Could not send the signup e-mail.");
const SIGNUP: RouteMessages =
    RouteMessages::new("User created successfully. Check your e-mail.", "Could not create the user.");
const LOGIN: RouteMessages = RouteMessages::new("User logged in successfully.", "Could not log the user in.");
const LOGOUT: RouteMessages = RouteMessages::success("User logged out.");
const NEW_PASSWORD: RouteMessages =
    RouteMessages::new("Password updated successfully.", "Could not update the password.");
const PASSWORD_RECOVERY: RouteMessages = RouteMessages::new(
    "E-mail sent successfully.",
    "Could not send the e-mail. Try again later.",
);
const VALIDATE_EMAIL: RouteMessages =
    RouteMessages::new("E-mail validated successfully!", "Could not validate the e-mail.");
const TOKEN_VALIDATION: RouteMessages = RouteMessages::success("Token validated successfully!");

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Object, Validate)]
#[oai(rename_all = "camelCase")]
pub struct InviteRequest {
    #[validate(custom(function = "validation::full_name"))]
    pub name: String,
    #[validate(email(message = "Invalid e-mail format."))]
    pub email: String,
    pub role: Option<Role>,
}

#[derive(Debug, Object)]
pub struct InviteResponse {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Object, Validate)]
#[oai(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(custom(function = "validation::full_name"))]
    pub name: String,
    #[validate(email(message = "Invalid e-mail format."))]
    pub email: String,
    #[validate(custom(function = "validation::strong_password"))]
    pub password: String,
    #[validate(custom(function = "validation::adult_birth_date"))]
    pub birth_date: NaiveDate,
    #[validate(custom(function = "validation::accepted"))]
    pub agreed_with_terms: bool,
    /// Token from an invitation e-mail; grants the invited role.
    pub invite_token: Option<String>,
}

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub id_user: i32,
    pub name: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub agreed_with_terms: bool,
    pub role: Role,
}

#[derive(Debug, Object, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid e-mail format."))]
    pub email: String,
    #[validate(custom(function = "validation::login_password"))]
    pub password: String,
}

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id_user: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub access_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

#[derive(Debug, Object, Validate)]
pub struct NewPasswordRequest {
    #[validate(custom(function = "validation::strong_password"))]
    pub password: String,
}

#[derive(Debug, Object, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "The token must not be empty."))]
    pub token: String,
    #[validate(custom(function = "validation::strong_password"))]
    pub password: String,
}

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct AccountRef {
    pub id_user: i32,
    pub name: String,
    pub email: String,
}

impl From<user::Model> for AccountRef {
    fn from(u: user::Model) -> Self {
        Self { id_user: u.id_user, name: u.name, email: u.email }
    }
}

#[derive(Debug, Object, Validate)]
pub struct RecoveryRequest {
    #[validate(email(message = "Invalid e-mail format."))]
    pub email: String,
}

#[derive(Debug, Object)]
pub struct RecoveryResponse {
    pub email: String,
}

#[derive(Debug, Object, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "The token must not be empty."))]
    pub token: String,
}

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct TokenOwner {
    pub id_user: i32,
    pub email: String,
}

fn session_cookie(token: &str, ttl_secs: i64, secure: bool) -> Cookie {
    let mut cookie = Cookie::new_with_str(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(secure);
    cookie.set_path("/");
    cookie.set_max_age(Duration::from_secs(ttl_secs.max(0) as u64));
    cookie
}

pub struct AuthApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Auth")]
impl AuthApi {
    /// Invite a resident by e-mail (admins only)
    #[oai(path = "/auth/send-signup-email", method = "post")]
    async fn send_signup_email(&self, auth: Session, Json(body): Json<InviteRequest>) -> ApiResult<InviteResponse> {
        self.invite(auth.user(), body).await.reply(SEND_SIGNUP_EMAIL)
    }

    /// Create an account
    #[oai(path = "/auth/signup", method = "post")]
    async fn signup(&self, Json(body): Json<SignUpRequest>) -> ApiResult<SignUpResponse> {
        self.register(body).await.reply(SIGNUP)
    }

    /// E-mail and password login; also sets the session cookie
    #[oai(path = "/auth/login", method = "post")]
    async fn login(&self, cookies: &CookieJar, Json(body): Json<LoginRequest>) -> ApiResult<LoginResponse> {
        self.authenticate(cookies, body).await.reply(LOGIN)
    }

    /// Expire the session cookie
    #[oai(path = "/auth/logout", method = "post")]
    async fn logout(&self, cookies: &CookieJar) -> ApiResult<bool> {
        let mut cookie = session_cookie("", 0, self.state.config.production);
        cookie.set_max_age(Duration::ZERO);
        cookies.add(cookie);
        Ok(true).reply(LOGOUT)
    }

    /// Change the caller's password
    #[oai(path = "/auth/new-password", method = "post")]
    async fn new_password(&self, auth: Session, Json(body): Json<NewPasswordRequest>) -> ApiResult<AccountRef> {
        self.change_password(auth.user(), body).await.reply(NEW_PASSWORD)
    }

    /// Mail a password recovery link
    #[oai(path = "/auth/password-recovery", method = "post")]
    async fn password_recovery(&self, Json(body): Json<RecoveryRequest>) -> ApiResult<RecoveryResponse> {
        self.start_recovery(body).await.reply(PASSWORD_RECOVERY)
    }

    /// Set a new password with a recovery token
    #[oai(path = "/auth/reset-password", method = "post")]
    async fn reset_password(&self, Json(body): Json<ResetPasswordRequest>) -> ApiResult<AccountRef> {
        self.finish_recovery(body).await.reply(NEW_PASSWORD)
    }

    /// Confirm the e-mail address with the token sent at signup
    #[oai(path = "/auth/validate-email", method = "post")]
    async fn validate_email(&self, Json(body): Json<TokenRequest>) -> ApiResult<AccountRef> {
        self.confirm_email(body).await.reply(VALIDATE_EMAIL)
    }

    /// Check that the caller's token still belongs to an account
    #[oai(path = "/auth/token-validation", method = "post")]
    async fn token_validation(&self, auth: Session) -> ApiResult<TokenOwner> {
        self.token_owner(auth.user()).await.reply(TOKEN_VALIDATION)
    }
}

impl AuthApi {
    async fn invite(&self, caller: &AuthUser, body: InviteRequest) -> AppResult<InviteResponse> {
        caller.require_admin()?;
        body.validate()?;
        let role = body.role.unwrap_or(Role::User);
        if role == Role::AdminRoot && caller.role != Role::AdminRoot {
            return Err(AppError::forbidden("Only root administrators can invite root administrators."));
        }

        let email = normalize_email(&body.email);
        if users::find_by_email(&self.state.db, &email).await?.is_some() {
            return Err(AppError::bad_request("E-mail already registered."));
        }

        let name = capitalize_full_name(&body.name);
        let token = self.state.tokens.issue(Purpose::Invite, None, &email, role, Some(&name))?;
        let url = self
            .state
            .frontend_link("/web/signup", &[("email", &email), ("name", &name), ("token", &token)]);
        self.state.mailer.send(mailer::signup_invitation(&email, &name, &url)).await?;
        tracing::info!(%email, ?role, invited_by = caller.id_user, "signup invitation sent");

        Ok(InviteResponse { email, name })
    }

    async fn register(&self, body: SignUpRequest) -> AppResult<SignUpResponse> {
        body.validate()?;
        let email = normalize_email(&body.email);

        let role = match body.invite_token.as_deref() {
            Some(token) => {
                let claims = self.state.tokens.verify(token, Purpose::Invite)?;
                if claims.email != email {
                    return Err(AppError::bad_request("The invitation was issued for another e-mail."));
                }
                claims.role
            }
            None => Role::User,
        };

        if users::find_by_email(&self.state.db, &email).await?.is_some() {
            return Err(AppError::conflict("E-mail already registered."));
        }

        let created = users::create(
            &self.state.db,
            NewUser {
                name: capitalize_full_name(&body.name),
                email,
                password_hash: hash_password(&body.password)?,
                birth_date: Some(body.birth_date),
                agreed_with_terms: body.agreed_with_terms,
                role,
            },
        )
        .await?;
        tracing::info!(id_user = created.id_user, ?role, "user registered");

        let token = self.state.tokens.issue(
            Purpose::EmailConfirmation,
            Some(created.id_user),
            &created.email,
            created.role,
            None,
        )?;
        let url = self.state.frontend_link("/web/validate-email", &[("token", &token)]);
        mailer::send_detached(
            self.state.mailer.clone(),
            mailer::email_confirmation(&created.email, &created.name, &url),
        );

        Ok(SignUpResponse {
            id_user: created.id_user,
            name: created.name,
            email: created.email,
            birth_date: created.birth_date,
            agreed_with_terms: created.agreed_with_terms,
            role: created.role,
        })
    }

    async fn authenticate(&self, cookies: &CookieJar, body: LoginRequest) -> AppResult<LoginResponse> {
        body.validate()?;
        let email = normalize_email(&body.email);
        let found = users::find_by_email(&self.state.db, &email)
            .await?
            .filter(|u| verify_password(&body.password, &u.password))
            .ok_or_else(|| AppError::unauthorized("Invalid credentials."))?;
        if !found.is_active {
            return Err(AppError::forbidden("User is inactive."));
        }

        let ttl = self.state.tokens.access_ttl_secs();
        let token = self
            .state
            .tokens
            .issue(Purpose::Access, Some(found.id_user), &found.email, found.role, None)?;
        cookies.add(session_cookie(&token, ttl, self.state.config.production));
        tracing::info!(id_user = found.id_user, "user logged in");

        Ok(LoginResponse {
            id_user: found.id_user,
            name: found.name,
            email: found.email,
            role: found.role,
            access_token: token,
            expires_in: ttl,
        })
    }

    async fn change_password(&self, caller: &AuthUser, body: NewPasswordRequest) -> AppResult<AccountRef> {
        body.validate()?;
        let found = users::find_by_id(&self.state.db, caller.id_user)
            .await?
            .ok_or_else(|| AppError::bad_request("User not found."))?;
        let updated = users::set_password(&self.state.db, found, hash_password(&body.password)?).await?;
        Ok(updated.into())
    }

    async fn start_recovery(&self, body: RecoveryRequest) -> AppResult<RecoveryResponse> {
        body.validate()?;
        let email = normalize_email(&body.email);
        let found = users::find_by_email(&self.state.db, &email)
            .await?
            .ok_or_else(|| AppError::bad_request("There is no account for the provided e-mail."))?;

        let token = self
            .state
            .tokens
            .issue(Purpose::Recovery, Some(found.id_user), &found.email, found.role, None)?;
        let url = self.state.frontend_link("/new-password", &[("token", &token)]);
        mailer::send_detached(
            self.state.mailer.clone(),
            mailer::password_recovery(&found.email, &found.name, &url),
        );

        Ok(RecoveryResponse { email: found.email })
    }

    async fn finish_recovery(&self, body: ResetPasswordRequest) -> AppResult<AccountRef> {
        body.validate()?;
        let claims = self.state.tokens.verify(&body.token, Purpose::Recovery)?;
        let id_user = claims.sub.ok_or_else(|| AppError::unauthorized("Invalid or expired token."))?;
        let found = users::find_by_id(&self.state.db, id_user)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;
        let updated = users::set_password(&self.state.db, found, hash_password(&body.password)?).await?;
        tracing::info!(id_user, "password reset");
        Ok(updated.into())
    }

    async fn confirm_email(&self, body: TokenRequest) -> AppResult<AccountRef> {
        body.validate()?;
        let claims = self.state.tokens.verify(&body.token, Purpose::EmailConfirmation)?;
        let id_user = claims.sub.ok_or_else(|| AppError::unauthorized("Invalid or expired token."))?;
        let found = users::find_by_id(&self.state.db, id_user)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;
        if found.is_email_confirmed {
            return Err(AppError::bad_request(format!(
                "The e-mail {} was already confirmed.",
                found.email
            )));
        }
        let mut am: user::ActiveModel = found.into();
        am.is_email_confirmed = Set(true);
        Ok(users::update(&self.state.db, am).await?.into())
    }

    async fn token_owner(&self, caller: &AuthUser) -> AppResult<TokenOwner> {
        let found = users::find_by_id(&self.state.db, caller.id_user)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;
        Ok(TokenOwner { id_user: found.id_user, email: found.email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_flags() {
        let cookie = session_cookie("abc", 60, true);
        let rendered = cookie.to_string();
        assert!(rendered.starts_with("access_token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("Max-Age=60"));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ana@Condo.App "), "ana@condo.app");
    }

    #[test]
    fn signup_request_rules() {
        let mut req = SignUpRequest {
            name: "Ana Souza".into(),
            email: "ana@condo.app".into(),
            password: "Condo#2025".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            agreed_with_terms: true,
            invite_token: None,
        };
        assert!(req.validate().is_ok());

        req.agreed_with_terms = false;
        req.email = "not-an-email".into();
        let err = AppError::from(req.validate().unwrap_err());
        let text = err.to_string();
        assert!(text.contains("Invalid e-mail format."));
        assert!(text.contains("The terms of use must be accepted."));
    }
}
