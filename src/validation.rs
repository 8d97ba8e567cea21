use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, FieldError};

/// Field-level checks run after a request body has been deserialized.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;
}

/// `Json<T>` that also runs `T::validate`, turning every failure into a 422.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<Value>::from_request(req, state).await?;
        let value: T = serde_path_to_error::deserialize(raw)
            .map_err(|e| AppError::Validation(vec![shape_error(&e)]))?;
        let errors = value.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(Self(value))
    }
}

/// Turns a deserialization failure into a field error without echoing serde's text.
fn shape_error(err: &serde_path_to_error::Error<serde_json::Error>) -> FieldError {
    let path = err.path().to_string();
    let message = err.inner().to_string();
    let at_root = path == ".";

    if let Some(name) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'))
    {
        let field = if at_root {
            name.to_owned()
        } else {
            format!("{path}.{name}")
        };
        return FieldError::new(field, "Field required");
    }

    let field = if at_root { "body".to_owned() } else { path };
    FieldError::new(field, describe_type_error(&message))
}

fn describe_type_error(message: &str) -> String {
    if message.starts_with("Input should be") {
        return message.to_owned();
    }
    let described = if message.contains("expected a string") {
        "Input should be a valid string"
    } else if message.contains("expected i") || message.contains("expected u") {
        "Input should be a valid integer"
    } else if message.contains("expected struct") || message.contains("expected a map") {
        "Input should be a valid dictionary"
    } else {
        "Invalid value"
    };
    described.to_owned()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        name: String,
    }

    impl Validate for Probe {
        fn validate(&self) -> Vec<FieldError> {
            if self.name.is_empty() {
                vec![FieldError::new("name", "Name Required")]
            } else {
                vec![]
            }
        }
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let ValidJson(probe) = ValidJson::<Probe>::from_request(json_request(r#"{"name":"x"}"#), &())
            .await
            .expect("valid");
        assert_eq!(probe.name, "x");
    }

    #[tokio::test]
    async fn field_check_failure_is_validation_error() {
        let err = ValidJson::<Probe>::from_request(json_request(r#"{"name":""}"#), &())
            .await
            .err()
            .expect("should reject");
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields, vec![FieldError::new("name", "Name Required")])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    async fn rejection(body: &'static str) -> Vec<FieldError> {
        let err = ValidJson::<Probe>::from_request(json_request(body), &())
            .await
            .err()
            .expect("should reject");
        match err {
            AppError::Validation(fields) => fields,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_field_is_named() {
        assert_eq!(
            rejection(r#"{"nom":1}"#).await,
            vec![FieldError::new("name", "Field required")]
        );
    }

    #[tokio::test]
    async fn wrong_type_is_reported_on_its_field() {
        assert_eq!(
            rejection(r#"{"name":5}"#).await,
            vec![FieldError::new("name", "Input should be a valid string")]
        );
        assert_eq!(
            rejection(r#""just text""#).await,
            vec![FieldError::new("body", "Input should be a valid dictionary")]
        );
    }

    #[tokio::test]
    async fn syntax_errors_do_not_echo_parser_text() {
        let fields = rejection(r#"{"name": "#).await;
        assert_eq!(fields, vec![FieldError::new("body", "Invalid JSON")]);
    }

    #[tokio::test]
    async fn missing_content_type_is_generic() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(r#"{"name":"x"}"#))
            .unwrap();
        let err = ValidJson::<Probe>::from_request(req, &())
            .await
            .err()
            .expect("should reject");
        match err {
            AppError::Validation(fields) => assert_eq!(
                fields,
                vec![FieldError::new("body", "Expected Content-Type: application/json")]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("alice@wonderland.com"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@wonderland"));
        assert!(!is_valid_email("a b@c.d"));
    }
}
