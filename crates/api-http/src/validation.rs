//! Request validation for POST /yt
//!
//! Runs before the submission core; rejected bodies never reach it.

use crate::types::{FieldError, SubmitBody};
use ytflow_core::application::submission::SubmitRequest;

/// Longest address accepted (RFC 5321 path limit)
const MAX_EMAIL_LEN: usize = 254;

/// Validate a decoded body into a core request
///
/// Every failing field is reported, not just the first.
pub fn validate_submit(body: SubmitBody) -> Result<SubmitRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let channel = body.channel.unwrap_or_default();
    if channel.is_empty() {
        errors.push(FieldError::new("channel", "Channel is required"));
    }

    let email = match body.email {
        None => {
            errors.push(FieldError::new("email", "Email is required"));
            String::new()
        }
        Some(email) => {
            if !is_valid_email(&email) {
                errors.push(FieldError::new("email", "Invalid email format"));
            }
            email
        }
    };

    if errors.is_empty() {
        Ok(SubmitRequest { channel, email })
    } else {
        Err(errors)
    }
}

/// Structural email check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}
