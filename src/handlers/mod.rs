// handlers/mod.rs - request handlers by security tier
//
// Public (no credential) -> Protected (bearer token, optionally role-gated)

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

use crate::error::ApiError;

pub mod health;
pub mod protected;
pub mod public;

/// Unwrap a JSON body, answering 400 `INVALID_JSON` when it does not parse
pub(crate) fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::invalid_json(e.body_text()))
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// Single-field validation failure
pub(crate) fn invalid_field(message: &str, field: &str, problem: &str) -> ApiError {
    let mut field_errors = HashMap::new();
    field_errors.insert(field.to_string(), problem.to_string());
    ApiError::validation_error(message, field_errors)
}

/// Empty query values count as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a query-string date bound: RFC 3339, or a bare `YYYY-MM-DD` taken
/// as midnight UTC.
pub(crate) fn date_bound(field: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(value) = non_empty(value) else {
        return Ok(None);
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(&value) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| invalid_field("Invalid query parameters", field, "Must be a date (YYYY-MM-DD) or RFC 3339 timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_bounds_accept_days_and_timestamps() {
        assert_eq!(
            date_bound("startDate", Some("2025-03-01".into())).unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            date_bound("startDate", Some("2025-03-01T12:30:00+02:00".into())).unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap())
        );
        assert_eq!(date_bound("startDate", Some("".into())).unwrap(), None);
        assert_eq!(date_bound("startDate", None).unwrap(), None);
    }

    #[test]
    fn unparseable_date_bound_names_the_field() {
        match date_bound("endDate", Some("last tuesday".into())) {
            Err(ApiError::ValidationError { field_errors, .. }) => assert!(field_errors.contains_key("endDate")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
