use crate::error::AuthError;
use crate::models::PasswordStrength;

/// Longest accepted password, bounding the work done by the hasher.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Checks the strength of a password and returns a PasswordStrength enum
pub fn check_password_strength(password: &str) -> PasswordStrength {
    let length = password.chars().count();
    let checks = [
        length >= 8,
        length >= 12,
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric()),
    ];

    match checks.iter().filter(|passed| **passed).count() {
        0..=2 => PasswordStrength::TooWeak,
        3..=4 => PasswordStrength::Basic,
        5 => PasswordStrength::Strong,
        _ => PasswordStrength::VeryStrong,
    }
}

/// Rejects passwords that are too weak or too long to hash.
pub fn ensure_acceptable(password: &str) -> Result<(), AuthError> {
    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(AuthError::BadRequest(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }

    if password.chars().count() < 8 || check_password_strength(password) == PasswordStrength::TooWeak
    {
        return Err(AuthError::BadRequest(
            "password does not meet strength requirements".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength() {
        assert_eq!(check_password_strength("short"), PasswordStrength::TooWeak);
        assert_eq!(check_password_strength("longenough"), PasswordStrength::TooWeak);
        assert_eq!(check_password_strength("Longenough"), PasswordStrength::Basic);
        assert_eq!(check_password_strength("Secret123!"), PasswordStrength::Strong);
        assert_eq!(
            check_password_strength("Very$tr0ngPass!"),
            PasswordStrength::VeryStrong
        );
    }

    #[test]
    fn test_ensure_acceptable() {
        assert!(ensure_acceptable("Secret123!").is_ok());
        assert!(matches!(
            ensure_acceptable("Ab1!"),
            Err(AuthError::BadRequest(_))
        ));
        assert!(matches!(
            ensure_acceptable("password"),
            Err(AuthError::BadRequest(_))
        ));
        assert!(matches!(
            ensure_acceptable(&"Ab1!".repeat(40)),
            Err(AuthError::BadRequest(_))
        ));
    }
}
