use regex::Regex;
use std::sync::LazyLock;

use super::types::RegisterRequest;
use crate::shared::AppError;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+251|251|0)?([79][0-9]{8})$").unwrap());

static DECIMAL_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{Nd}").unwrap());

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}

/// Addresses may not contain decimal digits of any script
pub fn is_valid_address(address: &str) -> bool {
    !DECIMAL_DIGIT.is_match(address)
}

/// Checks a registration request, naming the first field that fails
pub fn validate_registration(request: &RegisterRequest) -> Result<(), AppError> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::SaveFailure(
            "username and/or password cannot be empty".to_string(),
        ));
    }

    if !is_valid_email(&request.email) {
        return Err(AppError::SaveFailure("invalid email format".to_string()));
    }

    if let Some(phone) = non_blank(&request.phone) {
        if !is_valid_phone(phone) {
            return Err(AppError::SaveFailure("invalid phone number format".to_string()));
        }
    }

    if let Some(address) = non_blank(&request.address) {
        if !is_valid_address(address) {
            return Err(AppError::SaveFailure("address cannot contain numbers".to_string()));
        }
    }

    Ok(())
}

/// Treats empty optional fields as absent
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
