use std::sync::Arc;

use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;

use super::{ApiTags, Deleted};
use crate::auth::{AuthUser, Session};
use crate::entities::enums::Role;
use crate::entities::user;
use crate::envelope::{ApiResult, Reply, RouteMessages};
use crate::error::{AppError, AppResult};
use crate::services::users::{self, NameMatch, fallback_initials};
use crate::services::page;
use crate::state::AppState;

const LIST: RouteMessages = RouteMessages::new("Users loaded.", "Could not load the users.");
const PERMISSIONS: RouteMessages =
    RouteMessages::new("Permissions updated.", "Could not update the permissions.");
const DELETE: RouteMessages = RouteMessages::new("User deleted.", "Could not delete the user.");
const SEARCH: RouteMessages = RouteMessages::new("Search completed.", "Could not search the users.");

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct UserView {
    pub id_user: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub is_email_confirmed: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl From<user::Model> for UserView {
    fn from(u: user::Model) -> Self {
        Self {
            id_user: u.id_user,
            name: u.name,
            email: u.email,
            role: u.role,
            is_active: u.is_active,
            is_email_confirmed: u.is_email_confirmed,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct PermissionsUpdate {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct SearchHit {
    pub id_user: i32,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub fallback_name: String,
    /// Trigram similarity in 0..=1.
    pub score: f32,
}

impl From<NameMatch> for SearchHit {
    fn from(m: NameMatch) -> Self {
        Self {
            fallback_name: fallback_initials(&m.name),
            id_user: m.id_user,
            name: m.name,
            email: m.email,
            photo_url: m.photo_path,
            score: m.score,
        }
    }
}

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct SearchPage {
    pub items: Vec<SearchHit>,
    /// Pass back as `cursor` to fetch the next page; absent on the last one.
    pub next_cursor: Option<i32>,
}

/// Splits the `take + 1` rows fetched by the search into a page and its cursor.
fn paginate(mut rows: Vec<NameMatch>, take: u64) -> SearchPage {
    let has_more = rows.len() as u64 > take;
    rows.truncate(take as usize);
    let next_cursor = if has_more { rows.last().map(|m| m.id_user) } else { None };
    SearchPage { items: rows.into_iter().map(SearchHit::from).collect(), next_cursor }
}

pub struct UserApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Users")]
impl UserApi {
    /// List every user (admins only)
    #[oai(path = "/users", method = "get")]
    async fn list(&self, auth: Session, skip: Query<Option<u64>>, take: Query<Option<u64>>) -> ApiResult<Vec<UserView>> {
        self.list_users(auth.user(), skip.0, take.0).await.reply(LIST)
    }

    /// Change role or activation of a user (admins only)
    #[oai(path = "/users/:id/permissions", method = "patch")]
    async fn permissions(&self, auth: Session, id: Path<i32>, Json(body): Json<PermissionsUpdate>) -> ApiResult<UserView> {
        self.set_permissions(auth.user(), id.0, body).await.reply(PERMISSIONS)
    }

    /// Remove a user (admins only)
    #[oai(path = "/users/:id", method = "delete")]
    async fn delete(&self, auth: Session, id: Path<i32>) -> ApiResult<Deleted> {
        self.remove(auth.user(), id.0).await.reply(DELETE)
    }

    /// Fuzzy search by name
    #[oai(path = "/users/search", method = "get")]
    async fn search(
        &self,
        _auth: Session,
        q: Query<Option<String>>,
        cursor: Query<Option<i32>>,
        take: Query<Option<u64>>,
    ) -> ApiResult<SearchPage> {
        self.search_names(q.0, cursor.0, take.0).await.reply(SEARCH)
    }
}

impl UserApi {
    async fn list_users(&self, caller: &AuthUser, skip: Option<u64>, take: Option<u64>) -> AppResult<Vec<UserView>> {
        caller.require_admin()?;
        let (skip, take) = page(skip, take);
        let rows = users::list(&self.state.db, skip, take).await?;
        Ok(rows.into_iter().map(UserView::from).collect())
    }

    async fn set_permissions(&self, caller: &AuthUser, id_user: i32, body: PermissionsUpdate) -> AppResult<UserView> {
        caller.require_admin()?;
        if body.role == Some(Role::AdminRoot) && caller.role != Role::AdminRoot {
            return Err(AppError::forbidden("Only root administrators can grant the root role."));
        }
        let found = users::find_by_id(&self.state.db, id_user)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;
        if found.role == Role::AdminRoot && caller.role != Role::AdminRoot {
            return Err(AppError::forbidden("Insufficient permissions."));
        }

        let mut am: user::ActiveModel = found.into();
        if let Some(role) = body.role {
            am.role = Set(role);
        }
        if let Some(is_active) = body.is_active {
            am.is_active = Set(is_active);
        }
        let updated = users::update(&self.state.db, am).await?;
        tracing::info!(id_user, role = ?updated.role, is_active = updated.is_active, by = caller.id_user, "permissions changed");
        Ok(updated.into())
    }

    async fn remove(&self, caller: &AuthUser, id_user: i32) -> AppResult<Deleted> {
        caller.require_admin()?;
        if caller.id_user == id_user {
            return Err(AppError::bad_request("Administrators cannot delete their own account."));
        }
        let target = users::find_by_id(&self.state.db, id_user)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;
        if target.role == Role::AdminRoot && caller.role != Role::AdminRoot {
            return Err(AppError::forbidden("Insufficient permissions."));
        }
        users::delete(&self.state.db, id_user).await?;
        tracing::info!(id_user, by = caller.id_user, "user deleted");
        Ok(Deleted { id: id_user })
    }

    async fn search_names(&self, q: Option<String>, cursor: Option<i32>, take: Option<u64>) -> AppResult<SearchPage> {
        let term = q.as_deref().map(str::trim).unwrap_or_default();
        if term.is_empty() {
            return Err(AppError::bad_request("The search term must not be empty."));
        }
        let (_, take) = page(None, take);
        let rows = users::search_by_name(
            &self.state.db,
            term,
            self.state.config.search_similarity_threshold,
            cursor.unwrap_or(0),
            take,
        )
        .await?;
        Ok(paginate(rows, take))
    }
}
