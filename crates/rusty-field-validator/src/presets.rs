// File: src/presets.rs
// Purpose: Ready-made rules for common input fields

use crate::rule::Rule;
use crate::validity::Validity;
use once_cell::sync::Lazy;
use regex::Regex;

// Email validation regex
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

// URL validation regex
static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid url regex")
});

static DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid digits regex"));

/// Email address format
pub fn email() -> Rule {
    Rule::Pattern(EMAIL_REGEX.clone())
}

/// http(s) URL format
pub fn url() -> Rule {
    Rule::Pattern(URL_REGEX.clone())
}

/// One or more ASCII digits and nothing else
pub fn digits() -> Rule {
    Rule::Pattern(DIGITS_REGEX.clone())
}

/// Value must contain something besides whitespace
pub fn required() -> Rule {
    Rule::predicate(|value: &str| !value.trim().is_empty())
}

/// At least `min` characters
pub fn min_length(min: usize) -> Rule {
    Rule::predicate(move |value: &str| value.chars().count() >= min)
}

/// At most `max` characters
pub fn max_length(max: usize) -> Rule {
    Rule::predicate(move |value: &str| value.chars().count() <= max)
}

/// Password strength score
///
/// Produces `Validity::Unknown` for an empty value, otherwise a custom
/// score from 0 to 4: one point each for length >= 8, mixed case, a digit
/// and a special character.
pub fn password_strength() -> Rule {
    Rule::predicate(|value: &str| {
        if value.is_empty() {
            return Validity::Unknown;
        }
        Validity::from(strength_score(value))
    })
}

/// Look up a preset by name, as used in [`ValidatorSettings`](crate::ValidatorSettings)
pub fn by_name(name: &str) -> Option<Rule> {
    match name {
        "email" => Some(email()),
        "url" => Some(url()),
        "digits" => Some(digits()),
        "required" => Some(required()),
        "password_strength" => Some(password_strength()),
        _ => None,
    }
}

fn strength_score(password: &str) -> u8 {
    let checks = [
        password.chars().count() >= 8,
        password.chars().any(|c| c.is_uppercase()) && password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_numeric()),
        password.chars().any(|c| !c.is_alphanumeric()),
    ];
    checks.iter().filter(|&&passed| passed).count() as u8
}
