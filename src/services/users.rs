use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};

use super::now;
use crate::entities::enums::Role;
use crate::entities::{address, user};

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id_user: i32) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find_by_id(id_user).one(db).await
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

pub async fn find_with_address<C: ConnectionTrait>(
    db: &C,
    id_user: i32,
) -> Result<Option<(user::Model, Option<address::Model>)>, DbErr> {
    user::Entity::find_by_id(id_user)
        .find_also_related(address::Entity)
        .one(db)
        .await
}

pub async fn list<C: ConnectionTrait>(db: &C, skip: u64, take: u64) -> Result<Vec<user::Model>, DbErr> {
    user::Entity::find()
        .order_by_asc(user::Column::IdUser)
        .offset(skip)
        .limit(take)
        .all(db)
        .await
}

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub birth_date: Option<chrono::NaiveDate>,
    pub agreed_with_terms: bool,
    pub role: Role,
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewUser) -> Result<user::Model, DbErr> {
    user::ActiveModel {
        name: Set(new.name),
        email: Set(new.email),
        password: Set(new.password_hash),
        birth_date: Set(new.birth_date),
        agreed_with_terms: Set(new.agreed_with_terms),
        role: Set(new.role),
        is_active: Set(true),
        is_email_confirmed: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Saves the changed columns of `am`, bumping `updated_at`.
pub async fn update<C: ConnectionTrait>(db: &C, mut am: user::ActiveModel) -> Result<user::Model, DbErr> {
    am.updated_at = Set(now());
    am.update(db).await
}

pub async fn set_password<C: ConnectionTrait>(
    db: &C,
    found: user::Model,
    password_hash: String,
) -> Result<user::Model, DbErr> {
    let mut am: user::ActiveModel = found.into();
    am.password = Set(password_hash);
    update(db, am).await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id_user: i32) -> Result<(), DbErr> {
    let res = user::Entity::delete_by_id(id_user).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("user {id_user}")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct NameMatch {
    pub id_user: i32,
    pub name: String,
    pub email: String,
    pub photo_path: Option<String>,
    pub score: f32,
}

const NAME_SEARCH_SQL: &str = r#"
SELECT id_user, name, email, photo_path, similarity(name, $1) AS score
FROM users
WHERE is_active AND similarity(name, $1) > $2 AND id_user > $3
ORDER BY id_user
LIMIT $4"#;

/// Trigram fuzzy match on `users.name`, keyset-paginated by id.
///
/// Fetches one row past `take` so the caller can tell whether a next page exists.
pub async fn search_by_name<C: ConnectionTrait>(
    db: &C,
    query: &str,
    threshold: f32,
    cursor: i32,
    take: u64,
) -> Result<Vec<NameMatch>, DbErr> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        NAME_SEARCH_SQL,
        [query.into(), threshold.into(), cursor.into(), ((take + 1) as i64).into()],
    );
    NameMatch::find_by_statement(stmt).all(db).await
}

/// "joão DA silva" -> "João Da Silva".
pub fn capitalize_full_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| {
            let lower = part.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Initials of the first two name parts; empty for single names.
pub fn fallback_initials(name: &str) -> String {
    let mut parts = name.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(first), Some(second)) => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalizes_each_word() {
        assert_eq!(capitalize_full_name("joão DA silva"), "João Da Silva");
        assert_eq!(capitalize_full_name("  ana   souza "), "Ana Souza");
        assert_eq!(capitalize_full_name(""), "");
    }

    #[test]
    fn initials() {
        assert_eq!(fallback_initials("ana souza lima"), "AS");
        assert_eq!(fallback_initials("Élio"), "");
        assert_eq!(fallback_initials("élio öst"), "ÉÖ");
    }
}
