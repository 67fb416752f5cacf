use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::role;

pub async fn list<C: ConnectionTrait>(db: &C) -> Result<Vec<role::Model>, DbErr> {
    role::Entity::find().order_by_asc(role::Column::IdRole).all(db).await
}

pub async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<role::Model>, DbErr> {
    role::Entity::find().filter(role::Column::Name.eq(name)).one(db).await
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    name: String,
    description: Option<String>,
) -> Result<role::Model, DbErr> {
    role::ActiveModel {
        name: Set(name),
        description: Set(description),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id_role: i32) -> Result<(), DbErr> {
    let res = role::Entity::delete_by_id(id_role).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("role {id_role}")));
    }
    Ok(())
}
