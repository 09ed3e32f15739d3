use chrono::{DateTime, Utc};

/// Fields recovered from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub subject: String,
    pub token_id: String,
    /// Whole seconds, as carried in the token
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Access and refresh token issued together at login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_id: String,
    pub refresh_token_id: String,
}

/// Registration input
#[derive(Debug, Clone)]
pub struct RegistrationData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
}

/// Login input
#[derive(Debug, Clone)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ForgotPasswordData {
    pub email: String,
    /// Where the emailed link sends the user, supplied by the caller
    pub redirect_to: String,
}

#[derive(Debug, Clone)]
pub struct ResetPasswordData {
    pub token: String,
    pub new_password: String,
}

/// Authenticated session returned by login and registration
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Public view of a user. Carries no credential material.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub colour: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq)]
pub enum PasswordStrength {
    TooWeak,    // Doesn't meet minimum requirements
    Basic,      // Meets minimum requirements
    Strong,     // Good complexity
    VeryStrong, // Excellent complexity
}
