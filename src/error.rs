use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

/// One failed field check. Serialized as `{"<field>": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.message)?;
        map.end()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("User already exists")]
    Conflict,

    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("Dish Not Found")]
    NotFound,

    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("USDA API Error")]
    UpstreamUnavailable,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotAuthenticated => StatusCode::FORBIDDEN,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Conflict | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::UpstreamUnavailable | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> Value {
        match self {
            AppError::Validation(fields) => json!(fields),
            AppError::Internal(_) => json!("Internal Server Error"),
            other => json!(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(detail = %rejection.body_text(), "json body rejected");
        let message = match rejection {
            JsonRejection::JsonSyntaxError(_) => "Invalid JSON",
            JsonRejection::MissingJsonContentType(_) => "Expected Content-Type: application/json",
            JsonRejection::JsonDataError(_) => "Invalid request body",
            _ => "Could not read request body",
        };
        AppError::Validation(vec![FieldError::new("body", message)])
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(e) = &self {
            error!(error = ?e, "internal error");
        }

        let body = Json(json!({
            "code": status.as_u16(),
            "message": self.message(),
        }));
        let mut response = (status, body).into_response();

        if let AppError::RateLimited {
            retry_after: Some(secs),
            ..
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
