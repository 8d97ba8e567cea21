use serde::{Deserialize, Serialize};

use crate::{
    error::FieldError,
    validation::{is_valid_email, Validate},
};

const MIN_PASSWORD_LEN: usize = 8;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: &'static str,
    pub access_token: String,
}

fn credential_errors(email: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_email(email.trim()) {
        errors.push(FieldError::new(
            "email",
            "value is not a valid email address",
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 8 characters long",
        ));
    }
    errors
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = credential_errors(&self.email, &self.password);
        if self.first_name.is_empty() {
            errors.push(FieldError::new("first_name", "First Name Required"));
        }
        if self.last_name.is_empty() {
            errors.push(FieldError::new("last_name", "Last Name Required"));
        }
        errors
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Vec<FieldError> {
        credential_errors(&self.email, &self.password)
    }
}
