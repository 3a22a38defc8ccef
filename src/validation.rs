// Request validation shared by the services and the HTTP layer

use thiserror::Error;

use crate::types::{CreateCompanyRequest, CreateEmployeeRequest, UpdateCompanyRequest};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Malformed or missing input, reported against the offending field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn require(field: &'static str, value: &str, label: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, format!("{} is required", label)));
    }
    Ok(())
}

pub fn validate_create_company(request: &CreateCompanyRequest) -> Result<(), ValidationError> {
    require("name", &request.name, "Company name")?;
    require("country", &request.country, "Country")?;
    require("timezone", &request.timezone, "Timezone")?;
    require("admin_name", &request.admin_name, "Admin name")?;
    require("admin_email", &request.admin_email, "Admin email")?;

    if !is_valid_email(request.admin_email.trim()) {
        return Err(ValidationError::new("admin_email", "Admin email is invalid"));
    }

    validate_password("admin_password", &request.admin_password)
}

pub fn validate_update_company(request: &UpdateCompanyRequest) -> Result<(), ValidationError> {
    require("name", &request.name, "Company name")?;
    require("country", &request.country, "Country")?;
    require("timezone", &request.timezone, "Timezone")
}

pub fn validate_create_employee(request: &CreateEmployeeRequest) -> Result<(), ValidationError> {
    require("first_name", &request.first_name, "First name")?;
    require("email", &request.email, "Email")?;

    if !is_valid_email(request.email.trim()) {
        return Err(ValidationError::new("email", "Email is invalid"));
    }

    validate_password("password", &request.password)
}

pub fn validate_password(field: &'static str, password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new(
            field,
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    Ok(())
}

/// Emails are compared case-insensitively, so they are stored lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Accepts `local@domain.tld` where the local part uses `[A-Za-z0-9._%+-]`,
/// the domain uses `[A-Za-z0-9.-]`, and the final label is at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'));
    if !local_ok {
        return false;
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}
