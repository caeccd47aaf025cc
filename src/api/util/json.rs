use axum::Json;

use crate::errors::AppError;

/// Map a domain result into a JSON response, converting the error through
/// its `AppError` mapping.
pub fn to_json<T, E>(result: Result<T, E>) -> Result<Json<T>, AppError>
where
    T: serde::Serialize,
    E: Into<AppError>,
{
    result.map(Json).map_err(Into::into)
}
