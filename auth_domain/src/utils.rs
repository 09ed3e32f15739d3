use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
            .expect("email regex is valid")
    })
}

/// Lookup form of an email address. Stored and compared this way everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates an email address using regex and additional checks
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.contains("..") {
        return false;
    }

    if !email_regex().is_match(email) {
        return false;
    }

    let Some((_, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.len() > 253 {
        return false;
    }

    // Require a TLD of at least two characters
    match domain.rsplit_once('.') {
        Some((_, tld)) => tld.len() >= 2,
        None => false,
    }
}

/// Validates a phone number
pub fn is_valid_phone(phone: &str) -> bool {
    // Allow '+' as the first character for international numbers
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) && phone.len() >= 10
}
