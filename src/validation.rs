// Validation utilities module
// Custom validators for delivery addresses and cart input

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use validator::ValidationError;

fn pincode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{6}$").expect("pincode pattern is valid"))
}

/// Strip everything but digits, then drop a leading "91" country code
/// from 12-digit numbers
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.strip_prefix("91") {
        Some(rest) if digits.len() == 12 => rest.to_string(),
        _ => digits,
    }
}

/// Phone must normalize to exactly 10 digits
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if normalize_phone(phone).len() == 10 {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// Pincode must be exactly 6 digits
pub fn validate_pincode(pincode: &str) -> Result<(), ValidationError> {
    if pincode_pattern().is_match(pincode.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_pincode"))
    }
}

/// Free text must contain something other than whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required"))
    } else {
        Ok(())
    }
}

/// Prices may be zero but never negative
pub fn validate_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        Err(ValidationError::new("price_must_not_be_negative"))
    } else {
        Ok(())
    }
}
