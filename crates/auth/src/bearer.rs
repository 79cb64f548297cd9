//! `Authorization: Bearer <token>` parsing.

use crate::error::AuthError;

/// Extract the bearer token from a raw `Authorization` header value.
///
/// The value must be exactly two space-separated parts and the scheme must be
/// `Bearer` (any case). No trimming: stray whitespace makes the header malformed.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;

    let mut parts = header.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AuthError::MalformedHeader);
    };

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}
