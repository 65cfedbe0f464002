//! Field validators shared by catalog and account operations.

use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_required(value: &str, field: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "{field} cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    let invalid = || Error::Validation(format!("invalid email address: {email}"));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Percentages are stored as plain numbers in [0, 100].
pub fn validate_percentage(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(Error::Validation(format!(
            "{field} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

pub fn validate_optional_percentage(value: Option<f64>, field: &str) -> Result<()> {
    value.map_or(Ok(()), |v| validate_percentage(v, field))
}

pub fn validate_amount(value: Option<f64>, field: &str) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(Error::Validation(format!(
            "{field} must be a non-negative amount"
        ))),
        _ => Ok(()),
    }
}
