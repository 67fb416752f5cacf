use chrono::{DateTime, Utc};
use poem::http::StatusCode;
use poem::{IntoResponse, Response};
use poem_openapi::payload::Json;
use poem_openapi::types::{ParseFromJSON, ToJSON};
use poem_openapi::Object;
use serde::Serialize;

use crate::error::{AppError, Failure, INTERNAL_ERROR_MESSAGE};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Request processed successfully";

/// Uniform success body.
#[derive(Debug, Object)]
pub struct Envelope<T: ParseFromJSON + ToJSON> {
    pub status: bool,
    pub date: DateTime<Utc>,
    pub message: String,
    pub data: T,
}

impl<T: ParseFromJSON + ToJSON> Envelope<T> {
    pub fn success(message: Option<&str>, data: T) -> Self {
        Self {
            status: true,
            date: Utc::now(),
            message: message.unwrap_or(DEFAULT_SUCCESS_MESSAGE).to_owned(),
            data,
        }
    }
}

/// Uniform failure body. Rendered by [`catch_all`], never returned by handlers.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: bool,
    pub date: DateTime<Utc>,
    pub message: String,
}

/// Success and error texts attached to one route.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteMessages {
    pub success: Option<&'static str>,
    pub error: Option<&'static str>,
}

impl RouteMessages {
    pub const fn new(success: &'static str, error: &'static str) -> Self {
        Self { success: Some(success), error: Some(error) }
    }

    pub const fn success(success: &'static str) -> Self {
        Self { success: Some(success), error: None }
    }
}

pub type ApiResult<T> = poem::Result<Json<Envelope<T>>>;

/// Wraps a handler outcome in the envelope, classifying errors.
pub trait Reply<T: ParseFromJSON + ToJSON> {
    fn reply(self, route: RouteMessages) -> ApiResult<T>;
}

impl<T: ParseFromJSON + ToJSON> Reply<T> for Result<T, AppError> {
    fn reply(self, route: RouteMessages) -> ApiResult<T> {
        match self {
            Ok(data) => Ok(Json(Envelope::success(route.success, data))),
            Err(err) => Err(err.resolve(route.error).into()),
        }
    }
}

/// Last stop for every error leaving the app: handler failures, unknown
/// routes, payload parse errors and failed security checks.
pub async fn catch_all(err: poem::Error) -> Response {
    let status = err.status();
    let message = match err.downcast_ref::<Failure>() {
        Some(failure) => failure.message.clone(),
        None if status.is_server_error() => {
            tracing::error!(error = %err, "unhandled error");
            INTERNAL_ERROR_MESSAGE.to_owned()
        }
        None => {
            tracing::debug!(%status, error = %err, "request rejected");
            framework_message(status, &err)
        }
    };
    error_response(status, message)
}

fn framework_message(status: StatusCode, err: &poem::Error) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "Unauthorized user.".to_owned(),
        StatusCode::NOT_FOUND => "Resource not found.".to_owned(),
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed.".to_owned(),
        _ => err.to_string(),
    }
}

pub fn error_response(status: StatusCode, message: String) -> Response {
    poem::web::Json(ErrorEnvelope { status: false, date: Utc::now(), message })
        .with_status(status)
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_uses_route_message_or_default() {
        let envelope = Envelope::success(Some("Address saved."), 7i32);
        assert!(envelope.status);
        assert_eq!(envelope.message, "Address saved.");
        assert_eq!(envelope.data, 7);

        let envelope = Envelope::success(None, true);
        assert_eq!(envelope.message, DEFAULT_SUCCESS_MESSAGE);
    }

    #[test]
    fn reply_classifies_errors() {
        let route = RouteMessages::new("ok", "Could not load.");
        let err = Err::<i32, _>(AppError::not_found("Post not found.")).reply(route).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Post not found.");
    }

    #[tokio::test]
    async fn catch_all_keeps_classified_messages() {
        let err: poem::Error = Failure::new(StatusCode::CONFLICT, "Duplicate record.").into();
        let resp = catch_all(err).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = resp.into_body().into_string().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], false);
        assert_eq!(json["message"], "Duplicate record.");
        assert!(json["date"].is_string());
    }

    #[tokio::test]
    async fn catch_all_hides_internal_details() {
        let err = poem::Error::from_string("pool timed out", StatusCode::INTERNAL_SERVER_ERROR);
        let resp = catch_all(err).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = resp.into_body().into_string().await.unwrap();
        assert!(body.contains(INTERNAL_ERROR_MESSAGE));
        assert!(!body.contains("pool timed out"));
    }
}
