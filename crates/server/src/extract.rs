use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, NaiveDate, Utc};
use tally_core::OwnerId;

use crate::error::ApiError;

pub const OWNER_HEADER: &str = "x-owner-id";

/// Caller identity. Authentication happens upstream; this only reads the
/// header the gateway sets.
pub struct Owner(pub OwnerId);

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        OwnerId::new(raw).map(Owner).map_err(|_| ApiError::Unauthorized)
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid date '{raw}'")))
}

/// Calendar date of either accepted timestamp form, in UTC.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    parse_timestamp(raw).map(|at| at.date_naive())
}
