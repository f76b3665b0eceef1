use crate::models::Credential;

const PLACEHOLDER_TOKEN: &str = "null";

/// Picks the caller's bearer token when one was really supplied, otherwise the
/// application key. Browsers send the literal "null" for an unset token.
pub fn select_credential(supplied: Option<&str>, app_key: &str) -> Credential {
    match supplied.map(str::trim) {
        Some(token) if !token.is_empty() && token != PLACEHOLDER_TOKEN => {
            Credential::BearerToken(token.to_string())
        }
        _ => Credential::ApplicationKey(app_key.to_string()),
    }
}
