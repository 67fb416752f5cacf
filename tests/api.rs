mod common;

use poem::http::StatusCode;
use sea_orm::DatabaseConnection;
use serde_json::json;

use condo_api::auth::Purpose;
use condo_api::entities::address;
use condo_api::entities::enums::Role;

use common::{PASSWORD, bearer, client, mock, resident, signed_in, state};

fn empty_db() -> DatabaseConnection {
    mock().into_connection()
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let cli = client(state(empty_db()));
    let resp = cli.get("/v1/nothing-here").send().await;
    resp.assert_status(StatusCode::NOT_FOUND);
    let json = resp.json().await;
    let body = json.value().object();
    body.get("status").assert_bool(false);
    body.get("message").assert_string("Resource not found.");
}

#[tokio::test]
async fn guarded_route_without_token_is_unauthorized() {
    let cli = client(state(empty_db()));
    let resp = cli.get("/v1/profiles/me").send().await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    resp.json().await.value().object().get("message").assert_string("Unauthorized user.");
}

#[tokio::test]
async fn guarded_route_rejects_tokens_of_other_purposes() {
    let state = state(empty_db());
    let recovery = state
        .tokens
        .issue(Purpose::Recovery, Some(3), "ana@condo.app", Role::User, None)
        .unwrap();
    let cli = client(state);
    let resp = cli
        .get("/v1/profiles/me")
        .header("Authorization", format!("Bearer {recovery}"))
        .send()
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_summary_with_bearer_token() {
    let db = signed_in(Role::User)
        .append_query_results([vec![resident(Role::User)]])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::User);
    let cli = client(state);

    let resp = cli.get("/v1/profiles/me").header("Authorization", auth).send().await;
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let body = json.value().object();
    body.get("status").assert_bool(true);
    body.get("message").assert_string("Profile loaded.");
    let data = body.get("data").object();
    data.get("idUser").assert_i64(3);
    data.get("fallbackName").assert_string("AS");
}

#[tokio::test]
async fn profile_summary_with_session_cookie() {
    let db = signed_in(Role::User)
        .append_query_results([vec![resident(Role::User)]])
        .into_connection();
    let state = state(db);
    let token = state
        .tokens
        .issue(Purpose::Access, Some(3), "ana@condo.app", Role::User, None)
        .unwrap();
    let cli = client(state);

    let resp = cli
        .get("/v1/profiles/me")
        .header("Cookie", format!("access_token={token}"))
        .send()
        .await;
    resp.assert_status_is_ok();
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let db = mock().append_query_results([vec![resident(Role::User)]]).into_connection();
    let cli = client(state(db));

    let resp = cli
        .post("/v1/auth/login")
        .body_json(&json!({ "email": "ana@condo.app", "password": "Wrong#123" }))
        .send()
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    resp.json().await.value().object().get("message").assert_string("Invalid credentials.");
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let db = mock().append_query_results([vec![resident(Role::User)]]).into_connection();
    let cli = client(state(db));

    let resp = cli
        .post("/v1/auth/login")
        .body_json(&json!({ "email": "Ana@Condo.app", "password": PASSWORD }))
        .send()
        .await;
    resp.assert_status_is_ok();
    let cookie = resp
        .0
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));

    let json = resp.json().await;
    let data = json.value().object().get("data").object();
    data.get("role").assert_string("USER");
    data.get("expiresIn").assert_i64(3600);
}

#[tokio::test]
async fn inactive_users_cannot_log_in() {
    let mut inactive = resident(Role::User);
    inactive.is_active = false;
    let db = mock().append_query_results([vec![inactive]]).into_connection();
    let cli = client(state(db));

    let resp = cli
        .post("/v1/auth/login")
        .body_json(&json!({ "email": "ana@condo.app", "password": PASSWORD }))
        .send()
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn signup_validation_errors_are_joined() {
    let cli = client(state(empty_db()));
    let resp = cli
        .post("/v1/auth/signup")
        .body_json(&json!({
            "name": "Ana Souza",
            "email": "not-an-email",
            "password": "weak",
            "birthDate": "1990-01-01",
            "agreedWithTerms": true
        }))
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let json = resp.json().await;
    let body = json.value().object();
    body.get("status").assert_bool(false);
    let message = body.get("message").string().to_owned();
    assert!(message.contains("Invalid e-mail format."), "{message}");
    assert!(message.contains(", "), "{message}");
}

#[tokio::test]
async fn signup_with_taken_email_conflicts() {
    let db = mock().append_query_results([vec![resident(Role::User)]]).into_connection();
    let cli = client(state(db));

    let resp = cli
        .post("/v1/auth/signup")
        .body_json(&json!({
            "name": "ana souza",
            "email": "ana@condo.app",
            "password": PASSWORD,
            "birthDate": "1990-01-01",
            "agreedWithTerms": true
        }))
        .send()
        .await;
    resp.assert_status(StatusCode::CONFLICT);
    resp.json().await.value().object().get("message").assert_string("E-mail already registered.");
}

#[tokio::test]
async fn missing_address_is_a_bad_request() {
    let db = signed_in(Role::User)
        .append_query_results([Vec::<address::Model>::new()])
        .into_connection();
    let state = state(db);
    let auth = bearer(&state, Role::User);
    let cli = client(state);

    let resp = cli.get("/v1/address/42").header("Authorization", auth).send().await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.json().await.value().object().get("message").assert_string("Could not load the address.");
}

#[tokio::test]
async fn admin_routes_reject_residents() {
    let state = state(signed_in(Role::User).into_connection());
    let auth = bearer(&state, Role::User);
    let cli = client(state);

    let resp = cli.get("/v1/users").header("Authorization", auth).send().await;
    resp.assert_status(StatusCode::FORBIDDEN);
    resp.json().await.value().object().get("message").assert_string("Insufficient permissions.");
}

#[tokio::test]
async fn search_requires_a_term() {
    let state = state(signed_in(Role::User).into_connection());
    let auth = bearer(&state, Role::User);
    let cli = client(state);

    let resp = cli
        .get("/v1/users/search")
        .query("q", &"   ")
        .header("Authorization", auth)
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.json()
        .await
        .value()
        .object()
        .get("message")
        .assert_string("The search term must not be empty.");
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let cli = client(state(empty_db()));
    let resp = cli.post("/v1/auth/logout").send().await;
    resp.assert_status_is_ok();
    let cookie = resp
        .0
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
}
