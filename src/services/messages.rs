use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryOrder, QuerySelect, Set};

use super::now;
use crate::entities::message;

pub async fn list<C: ConnectionTrait>(db: &C, skip: u64, take: u64) -> Result<Vec<message::Model>, DbErr> {
    message::Entity::find()
        .order_by_desc(message::Column::CreatedAt)
        .order_by_desc(message::Column::IdMessage)
        .offset(skip)
        .limit(take)
        .all(db)
        .await
}

pub async fn create<C: ConnectionTrait>(db: &C, sender_id: i32, content: String) -> Result<message::Model, DbErr> {
    message::ActiveModel {
        content: Set(content),
        sender_id: Set(sender_id),
        is_read: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn mark_read<C: ConnectionTrait>(db: &C, id_message: i32) -> Result<message::Model, DbErr> {
    let found = message::Entity::find_by_id(id_message)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("message {id_message}")))?;
    let mut am: message::ActiveModel = found.into();
    am.is_read = Set(true);
    am.updated_at = Set(now());
    am.update(db).await
}
