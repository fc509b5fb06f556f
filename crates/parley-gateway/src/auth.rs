use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use parley_types::UserId;
use parley_types::api::Claims;

/// Check a bearer token and return the user it was issued to.
/// Expired, malformed or wrongly signed tokens are rejected with `None`.
pub fn authenticate(jwt_secret: &str, token: &str) -> Option<UserId> {
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => Some(data.claims.sub),
        Err(e) => {
            debug!("token rejected: {}", e);
            None
        }
    }
}
