use std::sync::Arc;

use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use sea_orm::prelude::DateTimeWithTimeZone;
use validator::Validate;

use super::ApiTags;
use crate::auth::Session;
use crate::entities::message;
use crate::envelope::{ApiResult, Reply, RouteMessages};
use crate::error::{AppError, AppResult};
use crate::services::{messages, page};
use crate::state::AppState;

const LIST: RouteMessages = RouteMessages::new("Messages loaded.", "Could not load the messages.");
const SEND: RouteMessages = RouteMessages::new("Message sent.", "Could not send the message.");
const READ: RouteMessages = RouteMessages::new("Message marked as read.", "Could not update the message.");

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct MessageView {
    pub id_message: i32,
    pub content: String,
    pub sender_id: i32,
    pub is_read: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl From<message::Model> for MessageView {
    fn from(m: message::Model) -> Self {
        Self {
            id_message: m.id_message,
            content: m.content,
            sender_id: m.sender_id,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Object, Validate)]
pub struct NewMessage {
    #[validate(length(min = 1, max = 2000, message = "The message must have between 1 and 2000 characters."))]
    pub content: String,
}

impl NewMessage {
    fn trimmed(mut self) -> Self {
        self.content = self.content.trim().to_owned();
        self
    }
}

pub struct MessageApi {
    pub state: Arc<AppState>,
}

#[OpenApi(tag = "ApiTags::Messages")]
impl MessageApi {
    /// Condominium-wide message board, newest first
    #[oai(path = "/messages", method = "get")]
    async fn list(&self, _auth: Session, skip: Query<Option<u64>>, take: Query<Option<u64>>) -> ApiResult<Vec<MessageView>> {
        let (skip, take) = page(skip.0, take.0);
        messages::list(&self.state.db, skip, take)
            .await
            .map(|rows| rows.into_iter().map(MessageView::from).collect::<Vec<_>>())
            .map_err(AppError::from)
            .reply(LIST)
    }

    #[oai(path = "/messages", method = "post")]
    async fn send(&self, auth: Session, Json(body): Json<NewMessage>) -> ApiResult<MessageView> {
        let sent: AppResult<MessageView> = async move {
            let body = body.trimmed();
            body.validate()?;
            let created = messages::create(&self.state.db, auth.user().id_user, body.content).await?;
            Ok(created.into())
        }
        .await;
        sent.reply(SEND)
    }

    #[oai(path = "/messages/:id/read", method = "put")]
    async fn mark_read(&self, _auth: Session, id: Path<i32>) -> ApiResult<MessageView> {
        messages::mark_read(&self.state.db, id.0)
            .await
            .map(MessageView::from)
            .map_err(AppError::from)
            .reply(READ)
    }
}
