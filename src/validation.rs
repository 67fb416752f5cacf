//! Field rules shared by the request bodies.

use chrono::{Months, NaiveDate, Utc};
use validator::ValidationError;

const MIN_AGE_YEARS: u32 = 18;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// First and last name, the first with at least two letters.
pub fn full_name(name: &str) -> Result<(), ValidationError> {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default();
    let valid = first.chars().count() >= 2
        && parts.next().is_some()
        && name.chars().all(|c| c.is_alphabetic() || c.is_whitespace() || c == '\'' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(invalid(
            "full_name",
            "Provide first and last name; the first name must have at least 2 letters.",
        ))
    }
}

fn has_required_classes(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_ascii_alphanumeric())
}

/// Signup and password changes.
pub fn strong_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(invalid("password_length", "The password must have at least 8 characters."));
    }
    if !has_required_classes(password) {
        return Err(invalid(
            "password_strength",
            "The password must contain at least 1 uppercase letter, 1 number and 1 symbol.",
        ));
    }
    Ok(())
}

/// Login accepts the older 6-character minimum.
pub fn login_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 6 {
        return Err(invalid("password_length", "The password must have at least 6 characters."));
    }
    if !has_required_classes(password) {
        return Err(invalid(
            "password_strength",
            "The password must contain at least 1 uppercase letter, 1 number and 1 symbol.",
        ));
    }
    Ok(())
}

pub fn adult_birth_date(birth_date: &NaiveDate) -> Result<(), ValidationError> {
    adult_on(*birth_date, Utc::now().date_naive())
}

fn adult_on(birth_date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    let limit = today.checked_sub_months(Months::new(12 * MIN_AGE_YEARS));
    match limit {
        Some(limit) if birth_date <= limit => Ok(()),
        _ => Err(invalid("age", "The user must be at least 18 years old.")),
    }
}

pub fn accepted(value: &bool) -> Result<(), ValidationError> {
    if *value {
        Ok(())
    } else {
        Err(invalid("terms", "The terms of use must be accepted."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert!(full_name("Ana Souza").is_ok());
        assert!(full_name("  João   da Silva ").is_ok());
        assert!(full_name("Ana").is_err());
        assert!(full_name("A Souza").is_err());
        assert!(full_name("Ana S0uza").is_err());
    }

    #[test]
    fn passwords() {
        assert!(strong_password("Condo#2025").is_ok());
        assert!(strong_password("C#1abc").is_err());
        assert!(strong_password("condo#2025").is_err());
        assert!(strong_password("Condo2025").is_err());
        assert!(login_password("C#1abc").is_ok());
        assert!(login_password("C#1ab").is_err());
    }

    #[test]
    fn age_boundary() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
        assert!(adult_on(NaiveDate::from_ymd_opt(2007, 10, 19).unwrap(), today).is_ok());
        assert!(adult_on(NaiveDate::from_ymd_opt(2007, 10, 20).unwrap(), today).is_err());
    }

    #[test]
    fn terms() {
        assert!(accepted(&true).is_ok());
        assert!(accepted(&false).is_err());
    }
}
