use std::sync::Arc;

use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use sea_orm::prelude::DateTimeWithTimeZone;
use validator::Validate;

use super::{ApiTags, Deleted};
use crate::auth::{AuthUser, Session};
use crate::entities::enums::PostType;
use crate::entities::{comment, post};
use crate::envelope::{ApiResult, Reply, RouteMessages};
use crate::error::{AppError, AppResult};
use crate::services::posts::{self, PostFields};
use crate::services::{page, users};
use crate::state::AppState;

const LIST: RouteMessages = RouteMessages::new("Posts loaded.", "Could not load the posts.");
const GET: RouteMessages = RouteMessages::new("Post loaded.", "Could not load the post.");
const CREATE: RouteMessages = RouteMessages::new("Post created.", "Could not create the post.");
const UPDATE: RouteMessages = RouteMessages::new("Post updated.", "Could not update the post.");
const DELETE: RouteMessages = RouteMessages::new("Post deleted.", "Could not delete the post.");
const COMMENT: RouteMessages = RouteMessages::new("Comment added.", "Could not add the comment.");
const UNCOMMENT: RouteMessages = RouteMessages::new("Comment deleted.", "Could not delete the comment.");
const LIKE: RouteMessages = RouteMessages::new("Post liked.", "Could not like the post.");
const UNLIKE: RouteMessages = RouteMessages::new("Like removed.", "Could not remove the like.");

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct PostView {
    pub id_post: i32,
    #[oai(rename = "type")]
    pub post_type: PostType,
    pub type_label: String,
    pub profile_fallback: String,
    pub profile_url: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub media_list: Vec<String>,
    pub is_saved: bool,
    pub comments_qty: i32,
    pub likes_qty: i32,
    pub sender_id: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<post::Model> for PostView {
    fn from(p: post::Model) -> Self {
        Self {
            id_post: p.id_post,
            type_label: p.post_type.label().to_owned(),
            post_type: p.post_type,
            profile_fallback: p.profile_fallback,
            profile_url: p.profile_url,
            name: p.name,
            description: p.description,
            media_list: p.media_list,
            is_saved: p.is_saved,
            comments_qty: p.comments_qty,
            likes_qty: p.likes_qty,
            sender_id: p.sender_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct CommentView {
    pub id_comment: i32,
    pub id_post: i32,
    pub sender_id: i32,
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
}

impl From<comment::Model> for CommentView {
    fn from(c: comment::Model) -> Self {
        Self {
            id_comment: c.id_comment,
            id_post: c.id_post,
            sender_id: c.sender_id,
            description: c.description,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Object)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Object, Validate)]
#[oai(rename_all = "camelCase")]
pub struct PostInput {
    #[oai(rename = "type")]
    pub post_type: PostType,
    /// Defaults to the sender's initials.
    #[validate(length(max = 4, message = "The profile fallback must have at most 4 characters."))]
    pub profile_fallback: Option<String>,
    /// Defaults to the sender's photo.
    pub profile_url: Option<String>,
    #[validate(length(min = 1, max = 120, message = "The title must have between 1 and 120 characters."))]
    pub name: String,
    #[validate(length(max = 2000, message = "The description must have at most 2000 characters."))]
    pub description: Option<String>,
    #[validate(length(max = 10, message = "A post can carry at most 10 media items."))]
    #[oai(default)]
    pub media_list: Vec<String>,
    #[oai(default)]
    pub is_saved: bool,
}

impl PostInput {
    /// Surrounding whitespace is dropped before the length rules run; a blank description becomes `None`.
    fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_owned();
        self.description = self
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());
        self
    }
}

#[derive(Debug, Object, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 1000, message = "The comment must have between 1 and 1000 characters."))]
    pub description: String,
}

impl CommentInput {
    fn trimmed(mut self) -> Self {
        self.description = self.description.trim().to_owned();
        self
    }
}

pub struct PostApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Posts")]
impl PostApi {
    /// Feed, newest first; `userId` narrows it to one sender
    #[oai(path = "/posts", method = "get")]
    async fn list(
        &self,
        _auth: Session,
        #[oai(name = "userId")] user_id: Query<Option<i32>>,
        skip: Query<Option<u64>>,
        take: Query<Option<u64>>,
    ) -> ApiResult<Vec<PostView>> {
        let (skip, take) = page(skip.0, take.0);
        posts::list(&self.state.db, user_id.0, skip, take)
            .await
            .map(|rows| rows.into_iter().map(PostView::from).collect::<Vec<_>>())
            .map_err(AppError::from)
            .reply(LIST)
    }

    /// One post with its comments
    #[oai(path = "/posts/:id", method = "get")]
    async fn get(&self, _auth: Session, id: Path<i32>) -> ApiResult<PostDetail> {
        self.detail(id.0).await.reply(GET)
    }

    #[oai(path = "/posts", method = "post")]
    async fn create(&self, auth: Session, Json(body): Json<PostInput>) -> ApiResult<PostView> {
        self.publish(auth.user(), body).await.reply(CREATE)
    }

    /// Only the sender may edit
    #[oai(path = "/posts/:id", method = "put")]
    async fn update(&self, auth: Session, id: Path<i32>, Json(body): Json<PostInput>) -> ApiResult<PostView> {
        self.edit(auth.user(), id.0, body).await.reply(UPDATE)
    }

    /// The sender or an admin may delete
    #[oai(path = "/posts/:id", method = "delete")]
    async fn delete(&self, auth: Session, id: Path<i32>) -> ApiResult<Deleted> {
        self.remove(auth.user(), id.0).await.reply(DELETE)
    }

    #[oai(path = "/posts/:id/comments", method = "post")]
    async fn comment(&self, auth: Session, id: Path<i32>, Json(body): Json<CommentInput>) -> ApiResult<CommentView> {
        self.add_comment(auth.user(), id.0, body).await.reply(COMMENT)
    }

    /// The comment author or an admin may delete
    #[oai(path = "/posts/:id/comments/:comment_id", method = "delete")]
    async fn uncomment(&self, auth: Session, id: Path<i32>, comment_id: Path<i32>) -> ApiResult<Deleted> {
        self.remove_comment(auth.user(), id.0, comment_id.0).await.reply(UNCOMMENT)
    }

    /// Liking twice is a no-op
    #[oai(path = "/posts/:id/likes", method = "post")]
    async fn like(&self, auth: Session, id: Path<i32>) -> ApiResult<PostView> {
        posts::like(&self.state.db, id.0, auth.user().id_user)
            .await
            .map(PostView::from)
            .map_err(AppError::from)
            .reply(LIKE)
    }

    #[oai(path = "/posts/:id/likes", method = "delete")]
    async fn unlike(&self, auth: Session, id: Path<i32>) -> ApiResult<PostView> {
        posts::unlike(&self.state.db, id.0, auth.user().id_user)
            .await
            .map(PostView::from)
            .map_err(AppError::from)
            .reply(UNLIKE)
    }
}

impl PostApi {
    async fn require(&self, id_post: i32) -> AppResult<post::Model> {
        posts::find(&self.state.db, id_post)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found."))
    }

    async fn detail(&self, id_post: i32) -> AppResult<PostDetail> {
        let found = self.require(id_post).await?;
        let comments = posts::comments_of(&self.state.db, id_post).await?;
        Ok(PostDetail {
            post: found.into(),
            comments: comments.into_iter().map(CommentView::from).collect(),
        })
    }

    /// Header fields not sent by the client are copied from the sender's profile.
    async fn fields(&self, caller: &AuthUser, body: PostInput) -> AppResult<PostFields> {
        let body = body.trimmed();
        body.validate()?;
        if body.media_list.iter().any(|url| reqwest::Url::parse(url).is_err()) {
            return Err(AppError::bad_request("Every media item must be a valid URL."));
        }
        let sender = users::find_by_id(&self.state.db, caller.id_user)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unauthorized user."))?;
        Ok(PostFields {
            post_type: body.post_type,
            profile_fallback: body
                .profile_fallback
                .unwrap_or_else(|| users::fallback_initials(&sender.name)),
            profile_url: body.profile_url.or(sender.photo_path),
            name: body.name,
            description: body.description,
            media_list: body.media_list,
            is_saved: body.is_saved,
        })
    }

    async fn publish(&self, caller: &AuthUser, body: PostInput) -> AppResult<PostView> {
        let fields = self.fields(caller, body).await?;
        let created = posts::create(&self.state.db, caller.id_user, fields).await?;
        tracing::info!(id_post = created.id_post, sender_id = caller.id_user, "post created");
        Ok(created.into())
    }

    async fn edit(&self, caller: &AuthUser, id_post: i32, body: PostInput) -> AppResult<PostView> {
        let found = self.require(id_post).await?;
        if found.sender_id != caller.id_user {
            return Err(AppError::forbidden("Only the author can edit this post."));
        }
        let fields = self.fields(caller, body).await?;
        Ok(posts::update(&self.state.db, found, fields).await?.into())
    }

    async fn remove(&self, caller: &AuthUser, id_post: i32) -> AppResult<Deleted> {
        let found = self.require(id_post).await?;
        if found.sender_id != caller.id_user && !caller.is_admin() {
            return Err(AppError::forbidden("Only the author can delete this post."));
        }
        posts::delete(&self.state.db, id_post).await?;
        tracing::info!(id_post, by = caller.id_user, "post deleted");
        Ok(Deleted { id: id_post })
    }

    async fn add_comment(&self, caller: &AuthUser, id_post: i32, body: CommentInput) -> AppResult<CommentView> {
        let body = body.trimmed();
        body.validate()?;
        let created = posts::add_comment(&self.state.db, id_post, caller.id_user, body.description).await?;
        Ok(created.into())
    }

    async fn remove_comment(&self, caller: &AuthUser, id_post: i32, id_comment: i32) -> AppResult<Deleted> {
        let found = posts::find_comment(&self.state.db, id_post, id_comment)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found."))?;
        if found.sender_id != caller.id_user && !caller.is_admin() {
            return Err(AppError::forbidden("Only the author can delete this comment."));
        }
        posts::remove_comment(&self.state.db, found).await?;
        Ok(Deleted { id: id_comment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn view_carries_type_label() {
        let now = Utc::now().fixed_offset();
        let view = PostView::from(post::Model {
            id_post: 1,
            post_type: PostType::BulletinBoard,
            profile_fallback: "AS".into(),
            profile_url: None,
            name: "Water shutdown".into(),
            description: None,
            media_list: vec![],
            is_saved: false,
            comments_qty: 0,
            likes_qty: 0,
            sender_id: 3,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(view.type_label, "Avisos");
    }

    #[test]
    fn media_list_is_capped() {
        let body = PostInput {
            post_type: PostType::Other,
            profile_fallback: None,
            profile_url: None,
            name: "Garage sale".into(),
            description: None,
            media_list: vec!["https://cdn.condo.app/a.png".into(); 11],
            is_saved: false,
        };
        let err = AppError::from(body.validate().unwrap_err());
        assert_eq!(err.to_string(), "A post can carry at most 10 media items.");
    }

    #[test]
    fn blank_title_and_comment_are_rejected() {
        let body = PostInput {
            post_type: PostType::Other,
            profile_fallback: None,
            profile_url: None,
            name: "   ".into(),
            description: Some("  ".into()),
            media_list: vec![],
            is_saved: false,
        }
        .trimmed();
        assert_eq!(body.description, None);
        let err = AppError::from(body.validate().unwrap_err());
        assert_eq!(err.to_string(), "The title must have between 1 and 120 characters.");

        let comment = CommentInput { description: "   ".into() }.trimmed();
        let err = AppError::from(comment.validate().unwrap_err());
        assert_eq!(err.to_string(), "The comment must have between 1 and 1000 characters.");
    }
}
