//! Synchronous form validation.
//!
//! Runs before any request is sent to the commerce API. A failing check
//! blocks the request entirely; the form is re-rendered with the message.

use std::sync::LazyLock;

use regex::Regex;

use crate::password::MIN_PASSWORD_LENGTH;
use crate::{Email, EmailError};

/// Digits with an optional leading `+`, 10 to 15 long, once spaces and
/// dashes are stripped.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9]{10,15}$").unwrap_or_else(|e| unreachable!("static phone regex: {e}"))
});

/// A single validation failure, phrased for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("enter a valid phone number")]
    Phone,

    #[error("password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    #[error("passwords don't match")]
    PasswordMismatch,

    #[error("rating must be between 1 and 5")]
    Rating,

    #[error("discount must be between 1 and 100")]
    Discount,
}

/// Normalize and check a phone number.
///
/// # Errors
///
/// Returns [`ValidationError::Phone`] when the number does not match the
/// accepted pattern.
pub fn normalize_phone(input: &str) -> Result<String, ValidationError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if PHONE_PATTERN.is_match(&compact) {
        Ok(compact)
    } else {
        Err(ValidationError::Phone)
    }
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

fn new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Signup form input.
#[derive(Debug, Clone, Copy)]
pub struct SignupFields<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
}

/// Contact details after validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfile {
    pub name: String,
    pub email: Email,
    pub phone: String,
}

/// Validate the signup form, reporting the first failure in field order.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_signup(fields: &SignupFields<'_>) -> Result<ValidProfile, ValidationError> {
    let profile = validate_profile(fields.name, fields.email, fields.phone)?;
    new_password(fields.password, fields.password_confirm)?;
    Ok(profile)
}

/// Validate the profile form (name, email, phone).
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_profile(
    name: &str,
    email: &str,
    phone: &str,
) -> Result<ValidProfile, ValidationError> {
    required(name, "name")?;
    let email = Email::parse(email)?;
    let phone = normalize_phone(phone)?;

    Ok(ValidProfile {
        name: name.trim().to_owned(),
        email,
        phone,
    })
}

/// Validate the change-password form.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_password_change(
    current: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    required(current, "current password")?;
    new_password(password, confirm)
}

/// Validate a password reset (new password twice).
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_password_reset(password: &str, confirm: &str) -> Result<(), ValidationError> {
    new_password(password, confirm)
}

/// Address form input.
#[derive(Debug, Clone, Copy)]
pub struct AddressFields<'a> {
    pub alias: &'a str,
    pub details: &'a str,
    pub phone: &'a str,
    pub city: &'a str,
    pub postal_code: &'a str,
}

/// Validate an address form. Returns the normalized phone number.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_address(fields: &AddressFields<'_>) -> Result<String, ValidationError> {
    required(fields.alias, "alias")?;
    required(fields.details, "details")?;
    let phone = normalize_phone(fields.phone)?;
    required(fields.city, "city")?;
    required(fields.postal_code, "postal code")?;
    Ok(phone)
}

/// Validate a product review.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_review(title: &str, ratings: u8) -> Result<(), ValidationError> {
    required(title, "review")?;
    if !(1..=5).contains(&ratings) {
        return Err(ValidationError::Rating);
    }
    Ok(())
}

/// Validate a coupon form (admin).
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_coupon(name: &str, discount: u8) -> Result<(), ValidationError> {
    required(name, "coupon name")?;
    if !(1..=100).contains(&discount) {
        return Err(ValidationError::Discount);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signup<'a>(password: &'a str, confirm: &'a str) -> SignupFields<'a> {
        SignupFields {
            name: "Mona Adel",
            email: "mona@example.com",
            phone: "0101 234-5678",
            password,
            password_confirm: confirm,
        }
    }

    #[test]
    fn test_valid_signup_is_normalized() {
        let valid = validate_signup(&signup("s3cret-pass", "s3cret-pass")).unwrap();
        assert_eq!(valid.phone, "01012345678");
        assert_eq!(valid.email.as_str(), "mona@example.com");
    }

    #[test]
    fn test_mismatched_passwords_are_rejected() {
        let err = validate_signup(&signup("s3cret-pass", "s3cret-pas")).unwrap_err();
        assert_eq!(err, ValidationError::PasswordMismatch);
        assert_eq!(err.to_string(), "passwords don't match");
    }

    #[test]
    fn test_short_password_is_rejected_first() {
        let err = validate_signup(&signup("short", "other")).unwrap_err();
        assert_eq!(err, ValidationError::PasswordTooShort);
    }

    #[test]
    fn test_missing_name() {
        let mut fields = signup("s3cret-pass", "s3cret-pass");
        fields.name = "  ";
        assert_eq!(
            validate_signup(&fields).unwrap_err().to_string(),
            "name is required"
        );
    }

    #[test]
    fn test_profile_normalizes_email() {
        let profile = validate_profile(" Mona ", "Mona@Example.com", "01012345678").unwrap();
        assert_eq!(profile.name, "Mona");
        assert_eq!(profile.email.as_str(), "mona@example.com");
        assert!(matches!(
            validate_profile("Mona", "not-an-email", "01012345678"),
            Err(ValidationError::Email(_))
        ));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(normalize_phone("+201012345678").is_ok());
        assert!(normalize_phone("010-1234-5678").is_ok());
        assert_eq!(normalize_phone("12345"), Err(ValidationError::Phone));
        assert_eq!(normalize_phone("01012abc678"), Err(ValidationError::Phone));
    }

    #[test]
    fn test_address_requires_every_field() {
        let fields = AddressFields {
            alias: "Home",
            details: "12 Nile St, Apt 4",
            phone: "01012345678",
            city: "Cairo",
            postal_code: "",
        };
        assert_eq!(
            validate_address(&fields),
            Err(ValidationError::Required("postal code"))
        );
    }

    #[test]
    fn test_review_rating_bounds() {
        assert!(validate_review("Great fit", 5).is_ok());
        assert_eq!(validate_review("Meh", 0), Err(ValidationError::Rating));
        assert_eq!(validate_review("Meh", 6), Err(ValidationError::Rating));
    }

    #[test]
    fn test_coupon_discount_bounds() {
        assert!(validate_coupon("SUMMER10", 10).is_ok());
        assert_eq!(validate_coupon("ZERO", 0), Err(ValidationError::Discount));
    }
}
