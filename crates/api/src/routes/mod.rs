pub mod cart;
pub mod events;
pub mod ops;
pub mod orders;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses an id path segment, naming the segment in the error.
pub(crate) fn parse_id<T: FromStr>(raw: &str, name: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {name}: {raw}")))
}
