use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use super::now;
use crate::entities::enums::PostType;
use crate::entities::{comment, like, post};

#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub post_type: PostType,
    pub profile_fallback: String,
    pub profile_url: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub media_list: Vec<String>,
    pub is_saved: bool,
}

impl PostFields {
    fn apply(self, am: &mut post::ActiveModel) {
        am.post_type = Set(self.post_type);
        am.profile_fallback = Set(self.profile_fallback);
        am.profile_url = Set(self.profile_url);
        am.name = Set(self.name);
        am.description = Set(self.description);
        am.media_list = Set(self.media_list);
        am.is_saved = Set(self.is_saved);
    }
}

pub async fn find<C: ConnectionTrait>(db: &C, id_post: i32) -> Result<Option<post::Model>, DbErr> {
    post::Entity::find_by_id(id_post).one(db).await
}

async fn require<C: ConnectionTrait>(db: &C, id_post: i32) -> Result<post::Model, DbErr> {
    find(db, id_post)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("post {id_post}")))
}

/// Newest first, optionally restricted to one sender.
pub async fn list<C: ConnectionTrait>(
    db: &C,
    sender_id: Option<i32>,
    skip: u64,
    take: u64,
) -> Result<Vec<post::Model>, DbErr> {
    let mut query = post::Entity::find();
    if let Some(sender_id) = sender_id {
        query = query.filter(post::Column::SenderId.eq(sender_id));
    }
    query
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::IdPost)
        .offset(skip)
        .limit(take)
        .all(db)
        .await
}

pub async fn comments_of<C: ConnectionTrait>(db: &C, id_post: i32) -> Result<Vec<comment::Model>, DbErr> {
    comment::Entity::find()
        .filter(comment::Column::IdPost.eq(id_post))
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::IdComment)
        .all(db)
        .await
}

pub async fn create<C: ConnectionTrait>(db: &C, sender_id: i32, fields: PostFields) -> Result<post::Model, DbErr> {
    let mut am = post::ActiveModel {
        sender_id: Set(sender_id),
        ..Default::default()
    };
    fields.apply(&mut am);
    am.insert(db).await
}

pub async fn update<C: ConnectionTrait>(db: &C, found: post::Model, fields: PostFields) -> Result<post::Model, DbErr> {
    let mut am: post::ActiveModel = found.into();
    fields.apply(&mut am);
    am.updated_at = Set(now());
    am.update(db).await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id_post: i32) -> Result<(), DbErr> {
    let res = post::Entity::delete_by_id(id_post).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("post {id_post}")));
    }
    Ok(())
}

async fn bump<C: ConnectionTrait>(db: &C, id_post: i32, column: post::Column, delta: i32) -> Result<(), DbErr> {
    post::Entity::update_many()
        .col_expr(column, Expr::col(column).add(delta))
        .filter(post::Column::IdPost.eq(id_post))
        .exec(db)
        .await?;
    Ok(())
}

/// Inserts the comment and bumps `comments_qty` atomically.
pub async fn add_comment<C: TransactionTrait>(
    db: &C,
    id_post: i32,
    sender_id: i32,
    description: String,
) -> Result<comment::Model, DbErr> {
    let txn = db.begin().await?;
    require(&txn, id_post).await?;
    let created = comment::ActiveModel {
        id_post: Set(id_post),
        sender_id: Set(sender_id),
        description: Set(description),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    bump(&txn, id_post, post::Column::CommentsQty, 1).await?;
    txn.commit().await?;
    Ok(created)
}

pub async fn find_comment<C: ConnectionTrait>(
    db: &C,
    id_post: i32,
    id_comment: i32,
) -> Result<Option<comment::Model>, DbErr> {
    comment::Entity::find_by_id(id_comment)
        .filter(comment::Column::IdPost.eq(id_post))
        .one(db)
        .await
}

pub async fn remove_comment<C: TransactionTrait>(db: &C, found: comment::Model) -> Result<(), DbErr> {
    let txn = db.begin().await?;
    let res = comment::Entity::delete_by_id(found.id_comment).exec(&txn).await?;
    if res.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("comment {}", found.id_comment)));
    }
    bump(&txn, found.id_post, post::Column::CommentsQty, -1).await?;
    txn.commit().await
}

/// A repeated like by the same user leaves the post untouched, also when two
/// requests race: the unique `(id_post, sender_id)` index absorbs the second insert.
pub async fn like<C: TransactionTrait>(db: &C, id_post: i32, sender_id: i32) -> Result<post::Model, DbErr> {
    let txn = db.begin().await?;
    let current = require(&txn, id_post).await?;
    let inserted = like::Entity::insert(like::ActiveModel {
        id_post: Set(id_post),
        sender_id: Set(sender_id),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([like::Column::IdPost, like::Column::SenderId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;
    if inserted == 0 {
        txn.commit().await?;
        return Ok(current);
    }
    bump(&txn, id_post, post::Column::LikesQty, 1).await?;
    let updated = require(&txn, id_post).await?;
    txn.commit().await?;
    Ok(updated)
}

pub async fn unlike<C: TransactionTrait>(db: &C, id_post: i32, sender_id: i32) -> Result<post::Model, DbErr> {
    let txn = db.begin().await?;
    let current = require(&txn, id_post).await?;
    let res = like::Entity::delete_many()
        .filter(like::Column::IdPost.eq(id_post))
        .filter(like::Column::SenderId.eq(sender_id))
        .exec(&txn)
        .await?;
    if res.rows_affected == 0 {
        txn.commit().await?;
        return Ok(current);
    }
    bump(&txn, id_post, post::Column::LikesQty, -1).await?;
    let updated = require(&txn, id_post).await?;
    txn.commit().await?;
    Ok(updated)
}
