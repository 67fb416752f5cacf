use std::borrow::Cow;

use poem::error::ResponseError;
use poem::http::StatusCode;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

/// Everything a route handler can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Db(#[from] DbErr),

    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    /// Maps the error to the status and message sent to the client.
    ///
    /// `route_message` is the route's own error message; it only replaces the
    /// text of unclassified internal failures, never of explicit HTTP errors.
    pub fn resolve(self, route_message: Option<&str>) -> Failure {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Validation(msgs) => (StatusCode::BAD_REQUEST, msgs.join(", ")),
            AppError::Db(err) => classify_db(&err),
            AppError::Mail(reason) => {
                tracing::error!(%reason, "mail delivery failed");
                (StatusCode::INTERNAL_SERVER_ERROR, internal_message(route_message))
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, internal_message(route_message))
            }
        };
        Failure { status, message }
    }
}

fn internal_message(route_message: Option<&str>) -> String {
    route_message.unwrap_or(INTERNAL_ERROR_MESSAGE).to_owned()
}

fn classify_db(err: &DbErr) -> (StatusCode, String) {
    match err {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => {
            tracing::warn!(error = %err, "record not found");
            (StatusCode::NOT_FOUND, "Record not found.".to_owned())
        }
        _ => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::warn!(%detail, "unique constraint violation");
                (StatusCode::CONFLICT, "Duplicate record.".to_owned())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::warn!(%detail, "foreign key violation");
                (StatusCode::BAD_REQUEST, "Referenced record does not exist.".to_owned())
            }
            _ => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database operation failed unexpectedly.".to_owned(),
                )
            }
        },
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages(&errors, &mut messages);
        AppError::Validation(messages)
    }
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    for (field, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    out.push(match &err.message {
                        Some(msg) => msg.to_string(),
                        None => format!("{field} is invalid"),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, out),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_messages(nested, out);
                }
            }
        }
    }
}

/// A classified error, ready to be rendered as an error envelope.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Failure {
    pub status: StatusCode,
    pub message: String,
}

impl Failure {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self { status, message: message.into().into_owned() }
    }
}

impl ResponseError for Failure {
    fn status(&self) -> StatusCode {
        self.status
    }
}
