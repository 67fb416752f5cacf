#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use poem::Endpoint;
use poem::test::TestClient;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

use condo_api::auth::Purpose;
use condo_api::auth::password::hash_password;
use condo_api::config::Config;
use condo_api::entities::enums::{PostType, Role};
use condo_api::entities::{comment, message, post, user};
use condo_api::mailer::LogMailer;
use condo_api::state::AppState;

pub const PASSWORD: &str = "Condo#2025";

/// Id of the account behind every token issued by [`bearer`].
pub const CALLER_ID: i32 = 3;

pub fn config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        bind_addr: "127.0.0.1:0".into(),
        jwt_secret: "test-secret".into(),
        access_token_ttl_secs: 3600,
        frontend_url: "http://localhost:5173".into(),
        production: false,
        resend_api_key: None,
        resend_from_email: "no-reply@condo.test".into(),
        run_migrations: false,
        search_similarity_threshold: 0.3,
    }
}

pub fn member(id_user: i32, role: Role) -> user::Model {
    let now = Utc::now().fixed_offset();
    user::Model {
        id_user,
        name: "Ana Souza".into(),
        email: format!("user{id_user}@condo.app"),
        password: hash_password(PASSWORD).unwrap(),
        birth_date: NaiveDate::from_ymd_opt(1990, 1, 1),
        phone: None,
        agreed_with_terms: true,
        is_active: true,
        is_email_confirmed: true,
        role,
        photo_path: None,
        id_address: None,
        created_at: now,
        updated_at: now,
    }
}

/// The calling account, as the guard loads it.
pub fn resident(role: Role) -> user::Model {
    user::Model { email: "ana@condo.app".into(), ..member(CALLER_ID, role) }
}

pub fn post_model(id_post: i32, sender_id: i32, likes_qty: i32, comments_qty: i32) -> post::Model {
    let now = Utc::now().fixed_offset();
    post::Model {
        id_post,
        post_type: PostType::BulletinBoard,
        profile_fallback: "AS".into(),
        profile_url: None,
        name: "Water shutdown".into(),
        description: Some("Tuesday 9h to 12h".into()),
        media_list: vec![],
        is_saved: false,
        comments_qty,
        likes_qty,
        sender_id,
        created_at: now,
        updated_at: now,
    }
}

pub fn comment_model(id_comment: i32, id_post: i32, sender_id: i32, description: &str) -> comment::Model {
    comment::Model {
        id_comment,
        id_post,
        sender_id,
        description: description.into(),
        created_at: Utc::now().fixed_offset(),
    }
}

pub fn message_model(id_message: i32, sender_id: i32, content: &str) -> message::Model {
    let now = Utc::now().fixed_offset();
    message::Model {
        id_message,
        content: content.into(),
        sender_id,
        is_read: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn rows(rows_affected: u64) -> MockExecResult {
    MockExecResult { last_insert_id: 0, rows_affected }
}

pub fn mock() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

/// A mock whose first query answers the session lookup for the caller.
pub fn signed_in(role: Role) -> MockDatabase {
    mock().append_query_results([vec![resident(role)]])
}

pub fn state(db: DatabaseConnection) -> Arc<AppState> {
    Arc::new(AppState::new(db, config(), Arc::new(LogMailer)))
}

pub fn client(state: Arc<AppState>) -> TestClient<impl Endpoint> {
    TestClient::new(condo_api::app(state))
}

pub fn bearer(state: &AppState, role: Role) -> String {
    let token = state
        .tokens
        .issue(Purpose::Access, Some(CALLER_ID), "ana@condo.app", role, None)
        .unwrap();
    format!("Bearer {token}")
}

/// A second handle onto the same mock; `DatabaseConnection` is not `Clone`
/// when sea-orm's `mock` feature is enabled.
pub fn share(db: &DatabaseConnection) -> DatabaseConnection {
    DatabaseConnection::MockDatabaseConnection(Arc::clone(match db {
        DatabaseConnection::MockDatabaseConnection(conn) => conn,
        _ => panic!("not a mock connection"),
    }))
}

/// Every statement the mock received, quotes unescaped.
pub fn executed_sql(db: &DatabaseConnection) -> String {
    format!("{:?}", share(db).into_transaction_log()).replace('\\', "")
}
