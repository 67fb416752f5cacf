use std::sync::Arc;

use chrono::NaiveDate;
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{Set, TransactionTrait};
use validator::Validate;

use super::ApiTags;
use super::address::{AddressInput, AddressView};
use crate::auth::{AuthUser, Session};
use crate::entities::enums::Role;
use crate::entities::{address, user};
use crate::envelope::{ApiResult, Reply, RouteMessages};
use crate::error::{AppError, AppResult};
use crate::services::addresses;
use crate::services::users::{self, capitalize_full_name, fallback_initials};
use crate::state::AppState;
use crate::validation;

const ME: RouteMessages = RouteMessages::new("Profile loaded.", "Could not load the profile.");
const UPDATE: RouteMessages = RouteMessages::new("Profile updated.", "Could not update the profile.");

/// Header card shown on every page.
#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id_user: i32,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    /// Initials used when there is no photo.
    pub fallback_name: String,
}

impl From<user::Model> for ProfileSummary {
    fn from(u: user::Model) -> Self {
        Self {
            fallback_name: fallback_initials(&u.name),
            id_user: u.id_user,
            email: u.email,
            name: u.name,
            photo_url: u.photo_path,
        }
    }
}

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct ProfileDetail {
    pub id_user: i32,
    pub name: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub is_email_confirmed: bool,
    pub agreed_with_terms: bool,
    pub photo_url: Option<String>,
    pub fallback_name: String,
    pub address: Option<AddressView>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl ProfileDetail {
    fn new(u: user::Model, address: Option<address::Model>) -> Self {
        Self {
            fallback_name: fallback_initials(&u.name),
            id_user: u.id_user,
            name: u.name,
            email: u.email,
            birth_date: u.birth_date,
            phone: u.phone,
            role: u.role,
            is_active: u.is_active,
            is_email_confirmed: u.is_email_confirmed,
            agreed_with_terms: u.agreed_with_terms,
            photo_url: u.photo_path,
            address: address.map(AddressView::from),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Object, Validate)]
#[oai(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(custom(function = "validation::full_name"))]
    pub name: String,
    #[validate(custom(function = "validation::adult_birth_date"))]
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 10, max = 20, message = "The phone must have between 10 and 20 characters."))]
    pub phone: Option<String>,
    #[validate(nested)]
    pub address: Option<AddressInput>,
}

pub struct ProfileApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Profiles")]
impl ProfileApi {
    /// Summary of the logged-in user
    #[oai(path = "/profiles/me", method = "get")]
    async fn me(&self, auth: Session) -> ApiResult<ProfileSummary> {
        self.summary(auth.user()).await.reply(ME)
    }

    /// Full profile of the logged-in user, address included
    #[oai(path = "/profiles/me/detail", method = "get")]
    async fn detail(&self, auth: Session) -> ApiResult<ProfileDetail> {
        self.load_detail(auth.user()).await.reply(ME)
    }

    /// Update name, birth date, phone and address in one go
    #[oai(path = "/profiles/me", method = "put")]
    async fn update(&self, auth: Session, Json(body): Json<ProfileUpdate>) -> ApiResult<ProfileDetail> {
        self.save(auth.user(), body).await.reply(UPDATE)
    }
}

impl ProfileApi {
    async fn summary(&self, caller: &AuthUser) -> AppResult<ProfileSummary> {
        users::find_by_id(&self.state.db, caller.id_user)
            .await?
            .map(ProfileSummary::from)
            .ok_or_else(|| AppError::unauthorized("Unauthorized user."))
    }

    async fn load_detail(&self, caller: &AuthUser) -> AppResult<ProfileDetail> {
        let (found, address) = users::find_with_address(&self.state.db, caller.id_user)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unauthorized user."))?;
        Ok(ProfileDetail::new(found, address))
    }

    async fn save(&self, caller: &AuthUser, body: ProfileUpdate) -> AppResult<ProfileDetail> {
        body.validate()?;
        let txn = self.state.db.begin().await?;
        let found = users::find_by_id(&txn, caller.id_user)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unauthorized user."))?;

        let address = match (body.address, found.id_address) {
            (Some(input), Some(id_address)) => Some(addresses::update(&txn, id_address, input.into_fields()).await?),
            (Some(input), None) => Some(addresses::create(&txn, input.into_fields()).await?),
            (None, Some(id_address)) => addresses::find(&txn, id_address).await?,
            (None, None) => None,
        };

        let mut am: user::ActiveModel = found.into();
        am.name = Set(capitalize_full_name(&body.name));
        am.birth_date = Set(body.birth_date);
        am.phone = Set(body.phone);
        am.id_address = Set(address.as_ref().map(|a| a.id_address));
        let updated = users::update(&txn, am).await?;
        txn.commit().await?;

        tracing::info!(id_user = updated.id_user, "profile updated");
        Ok(ProfileDetail::new(updated, address))
    }
}
