use std::sync::Arc;

use poem_openapi::param::Path;
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use sea_orm::{Set, TransactionTrait};
use validator::Validate;

use super::{ApiTags, Deleted};
use crate::auth::{AuthUser, Session};
use crate::entities::{address, user};
use crate::envelope::{ApiResult, Reply, RouteMessages};
use crate::error::{AppError, AppResult};
use crate::services::addresses::{self, AddressFields};
use crate::services::users;
use crate::state::AppState;

const GET_ADDRESS: RouteMessages = RouteMessages::new("Address loaded.", "Could not load the address.");
const SAVE_ADDRESS: RouteMessages = RouteMessages::new("Address saved.", "Could not save the address.");
const DELETE_ADDRESS: RouteMessages = RouteMessages::new("Address deleted.", "Could not delete the address.");

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct AddressView {
    pub id_address: i32,
    pub postal_code: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub block: Option<String>,
    pub lot: Option<String>,
}

impl From<address::Model> for AddressView {
    fn from(a: address::Model) -> Self {
        Self {
            id_address: a.id_address,
            postal_code: a.postal_code,
            street: a.street,
            number: a.number,
            district: a.district,
            city: a.city,
            state: a.state,
            block: a.block,
            lot: a.lot,
        }
    }
}

#[derive(Debug, Clone, Default, Object, Validate)]
#[oai(rename_all = "camelCase")]
pub struct AddressInput {
    /// Present to update an existing address.
    pub id_address: Option<i32>,
    #[validate(length(max = 9, message = "The postal code must have at most 9 characters."))]
    pub postal_code: Option<String>,
    #[validate(length(max = 120, message = "The street must have at most 120 characters."))]
    pub street: Option<String>,
    #[validate(length(max = 10, message = "The number must have at most 10 characters."))]
    pub number: Option<String>,
    #[validate(length(max = 80, message = "The district must have at most 80 characters."))]
    pub district: Option<String>,
    #[validate(length(max = 80, message = "The city must have at most 80 characters."))]
    pub city: Option<String>,
    #[validate(length(equal = 2, message = "The state must be a 2-letter code."))]
    pub state: Option<String>,
    #[validate(length(max = 10, message = "The block must have at most 10 characters."))]
    pub block: Option<String>,
    #[validate(length(max = 10, message = "The lot must have at most 10 characters."))]
    pub lot: Option<String>,
}

impl AddressInput {
    pub fn into_fields(self) -> AddressFields {
        AddressFields {
            postal_code: self.postal_code,
            street: self.street,
            number: self.number,
            district: self.district,
            city: self.city,
            state: self.state.map(|s| s.to_uppercase()),
            block: self.block,
            lot: self.lot,
        }
    }
}

pub struct AddressApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Address")]
impl AddressApi {
    /// Load an address by id
    #[oai(path = "/address/:id", method = "get")]
    async fn get(&self, _auth: Session, id: Path<i32>) -> ApiResult<AddressView> {
        addresses::find(&self.state.db, id.0)
            .await
            .map_err(AppError::from)
            .and_then(|found| {
                found
                    .map(AddressView::from)
                    .ok_or_else(|| AppError::bad_request("Could not load the address."))
            })
            .reply(GET_ADDRESS)
    }

    /// Create or update an address; a new one is linked to the caller when they have none
    #[oai(path = "/address", method = "post")]
    async fn save(&self, auth: Session, Json(body): Json<AddressInput>) -> ApiResult<AddressView> {
        self.upsert(auth.user(), body).await.reply(SAVE_ADDRESS)
    }

    #[oai(path = "/address/:id", method = "delete")]
    async fn delete(&self, _auth: Session, id: Path<i32>) -> ApiResult<Deleted> {
        addresses::delete(&self.state.db, id.0)
            .await
            .map(|()| Deleted { id: id.0 })
            .map_err(AppError::from)
            .reply(DELETE_ADDRESS)
    }
}

impl AddressApi {
    async fn upsert(&self, caller: &AuthUser, body: AddressInput) -> AppResult<AddressView> {
        body.validate()?;
        if let Some(id_address) = body.id_address.filter(|id| *id > 0) {
            let saved = addresses::update(&self.state.db, id_address, body.into_fields()).await?;
            return Ok(saved.into());
        }

        let txn = self.state.db.begin().await?;
        let saved = addresses::create(&txn, body.into_fields()).await?;
        if let Some(owner) = users::find_by_id(&txn, caller.id_user).await? {
            if owner.id_address.is_none() {
                let mut am: user::ActiveModel = owner.into();
                am.id_address = Set(Some(saved.id_address));
                users::update(&txn, am).await?;
            }
        }
        txn.commit().await?;
        tracing::info!(id_address = saved.id_address, id_user = caller.id_user, "address created");
        Ok(saved.into())
    }
}
