use std::sync::Arc;

use poem_openapi::param::Path;
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use validator::Validate;

use super::{ApiTags, Deleted};
use crate::auth::Session;
use crate::entities::role;
use crate::envelope::{ApiResult, Reply, RouteMessages};
use crate::error::{AppError, AppResult};
use crate::services::roles;
use crate::state::AppState;

const LIST: RouteMessages = RouteMessages::new("Roles loaded.", "Could not load the roles.");
const CREATE: RouteMessages = RouteMessages::new("Role created.", "Could not create the role.");
const DELETE: RouteMessages = RouteMessages::new("Role deleted.", "Could not delete the role.");

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct RoleView {
    pub id_role: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<role::Model> for RoleView {
    fn from(r: role::Model) -> Self {
        Self { id_role: r.id_role, name: r.name, description: r.description }
    }
}

#[derive(Debug, Object, Validate)]
pub struct NewRole {
    #[validate(length(min = 2, max = 40, message = "The role name must have between 2 and 40 characters."))]
    pub name: String,
    #[validate(length(max = 200, message = "The description must have at most 200 characters."))]
    pub description: Option<String>,
}

pub struct RoleApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Roles")]
impl RoleApi {
    #[oai(path = "/roles", method = "get")]
    async fn list(&self, _auth: Session) -> ApiResult<Vec<RoleView>> {
        roles::list(&self.state.db)
            .await
            .map(|rows| rows.into_iter().map(RoleView::from).collect::<Vec<_>>())
            .map_err(AppError::from)
            .reply(LIST)
    }

    /// Admins only
    #[oai(path = "/roles", method = "post")]
    async fn create(&self, auth: Session, Json(body): Json<NewRole>) -> ApiResult<RoleView> {
        let created: AppResult<RoleView> = async move {
            auth.user().require_admin()?;
            let body = NewRole { name: body.name.trim().to_uppercase(), ..body };
            body.validate()?;
            if roles::find_by_name(&self.state.db, &body.name).await?.is_some() {
                return Err(AppError::conflict("Role already exists."));
            }
            Ok(roles::create(&self.state.db, body.name, body.description).await?.into())
        }
        .await;
        created.reply(CREATE)
    }

    /// Admins only
    #[oai(path = "/roles/:id", method = "delete")]
    async fn delete(&self, auth: Session, id: Path<i32>) -> ApiResult<Deleted> {
        let deleted: AppResult<Deleted> = async move {
            auth.user().require_admin()?;
            roles::delete(&self.state.db, id.0).await?;
            Ok(Deleted { id: id.0 })
        }
        .await;
        deleted.reply(DELETE)
    }
}
