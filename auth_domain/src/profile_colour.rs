use crate::error::AuthError;

const PALETTE: [&str; 12] = [
    "#C0392B", "#E74C3C", "#9B59B6", "#8E44AD", "#2980B9", "#3498DB", "#1ABC9C", "#16A085",
    "#27AE60", "#2ECC71", "#F39C12", "#D35400",
];

fn initial(name: &str, field: &str) -> Result<char, AuthError> {
    name.trim()
        .chars()
        .next()
        .filter(|c| c.is_alphabetic())
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .ok_or_else(|| AuthError::BadRequest(format!("{field} must start with a letter")))
}

/// Default avatar colour for a user, derived from the initials of their name.
///
/// The same name always yields the same colour.
pub fn default_profile_colour(first_name: &str, last_name: &str) -> Result<String, AuthError> {
    let first = initial(first_name, "first name")?;
    let last = initial(last_name, "last name")?;

    let index = (first as usize * 31 + last as usize) % PALETTE.len();
    Ok(PALETTE[index].to_string())
}
