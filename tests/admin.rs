mod common;

use std::collections::BTreeMap;

use chrono::Utc;
use poem::http::StatusCode;
use sea_orm::Value;
use serde_json::json;

use condo_api::entities::enums::Role;
use condo_api::entities::{role, user};

use common::{CALLER_ID, bearer, client, member, resident, rows, signed_in, state};

fn name_match(id_user: i32, name: &str) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("id_user", Value::from(id_user)),
        ("name", Value::from(name.to_owned())),
        ("email", Value::from(format!("user{id_user}@condo.app"))),
        ("photo_path", Value::from(Option::<String>::None)),
        ("score", Value::from(0.8f32)),
    ])
}

#[tokio::test]
async fn role_is_read_from_the_stored_account() {
    let state = state(signed_in(Role::User).into_connection());
    let auth = bearer(&state, Role::Admin);
    let cli = client(state);

    let resp = cli.get("/v1/users").header("Authorization", auth).send().await;
    resp.assert_status(StatusCode::FORBIDDEN);
    resp.json().await.value().object().get("message").assert_string("Insufficient permissions.");
}

#[tokio::test]
async fn deleted_accounts_lose_their_session() {
    let db = common::mock()
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::Admin);
    let cli = client(state);

    let resp = cli.get("/v1/profiles/me").header("Authorization", auth).send().await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    resp.json().await.value().object().get("message").assert_string("Unauthorized user.");
}

#[tokio::test]
async fn deactivated_accounts_lose_their_session() {
    let mut inactive = resident(Role::User);
    inactive.is_active = false;
    let db = common::mock().append_query_results([vec![inactive]]).into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::User);
    let cli = client(state);

    let resp = cli.get("/v1/profiles/me").header("Authorization", auth).send().await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admins_cannot_delete_root_accounts() {
    let db = signed_in(Role::Admin)
        .append_query_results([vec![member(1, Role::AdminRoot)]])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::Admin);
    let cli = client(state);

    let resp = cli.delete("/v1/users/1").header("Authorization", auth).send().await;
    resp.assert_status(StatusCode::FORBIDDEN);
    resp.json().await.value().object().get("message").assert_string("Insufficient permissions.");
}

#[tokio::test]
async fn root_deletes_an_admin() {
    let db = signed_in(Role::AdminRoot)
        .append_query_results([vec![member(5, Role::Admin)]])
        .append_exec_results([rows(1)])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::AdminRoot);
    let cli = client(state);

    let resp = cli.delete("/v1/users/5").header("Authorization", auth).send().await;
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let body = json.value().object();
    body.get("message").assert_string("User deleted.");
    body.get("data").object().get("id").assert_i64(5);
}

#[tokio::test]
async fn admins_cannot_delete_themselves() {
    let state = state(signed_in(Role::Admin).into_connection());
    let auth = bearer(&state, Role::Admin);
    let cli = client(state);

    let resp = cli
        .delete(format!("/v1/users/{CALLER_ID}"))
        .header("Authorization", auth)
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.json()
        .await
        .value()
        .object()
        .get("message")
        .assert_string("Administrators cannot delete their own account.");
}

#[tokio::test]
async fn deleting_a_missing_user_is_not_found() {
    let db = signed_in(Role::Admin)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::Admin);
    let cli = client(state);

    let resp = cli.delete("/v1/users/40").header("Authorization", auth).send().await;
    resp.assert_status(StatusCode::NOT_FOUND);
    resp.json().await.value().object().get("message").assert_string("User not found.");
}

#[tokio::test]
async fn permissions_of_a_missing_user_are_not_found() {
    let db = signed_in(Role::Admin)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::Admin);
    let cli = client(state);

    let resp = cli
        .patch("/v1/users/40/permissions")
        .header("Authorization", auth)
        .body_json(&json!({ "isActive": false }))
        .send()
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
    resp.json().await.value().object().get("message").assert_string("User not found.");
}

#[tokio::test]
async fn admins_cannot_change_root_permissions() {
    let db = signed_in(Role::Admin)
        .append_query_results([vec![member(1, Role::AdminRoot)]])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::Admin);
    let cli = client(state);

    let resp = cli
        .patch("/v1/users/1/permissions")
        .header("Authorization", auth)
        .body_json(&json!({ "isActive": false }))
        .send()
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_role_names_conflict() {
    let existing = role::Model {
        id_role: 2,
        name: "SINDICO".into(),
        description: None,
        created_at: Utc::now().fixed_offset(),
    };
    let db = signed_in(Role::Admin)
        .append_query_results([vec![existing]])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::Admin);
    let cli = client(state);

    let resp = cli
        .post("/v1/roles")
        .header("Authorization", auth)
        .body_json(&json!({ "name": " sindico " }))
        .send()
        .await;
    resp.assert_status(StatusCode::CONFLICT);
    resp.json().await.value().object().get("message").assert_string("Role already exists.");
}

#[tokio::test]
async fn search_returns_a_cursor_when_more_rows_exist() {
    let db = signed_in(Role::User)
        .append_query_results([vec![
            name_match(4, "Ana Souza"),
            name_match(6, "Ana Paula Souza"),
            name_match(9, "Anna Sousa"),
        ]])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::User);
    let cli = client(state);

    let resp = cli
        .get("/v1/users/search")
        .query("q", &"ana souza")
        .query("take", &2)
        .header("Authorization", auth)
        .send()
        .await;
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let data = json.value().object().get("data").object();
    data.get("items").array().assert_len(2);
    data.get("nextCursor").assert_i64(6);
}

#[tokio::test]
async fn inviting_a_registered_email_is_rejected() {
    let db = signed_in(Role::Admin)
        .append_query_results([vec![member(5, Role::User)]])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::Admin);
    let cli = client(state);

    let resp = cli
        .post("/v1/auth/send-signup-email")
        .header("Authorization", auth)
        .body_json(&json!({ "name": "Bruno Lima", "email": "USER5@condo.app" }))
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.json().await.value().object().get("message").assert_string("E-mail already registered.");
}
