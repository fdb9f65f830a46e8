// handlers/protected/appointments.rs - the caller's own appointments

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Identity;
use crate::database::models::appointment::{AppointmentChanges, AppointmentFilter, AppointmentStatus, NewAppointment};
use crate::error::ApiError;
use crate::handlers::{date_bound, invalid_field, json_payload, non_empty, query_params};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// `?status=scheduled&upcoming=true` or `?startDate=...&endDate=...`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub status: Option<String>,
    pub upcoming: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl AppointmentQuery {
    /// `upcoming=true` means "from now on" and overrides the date window
    fn into_filter(self, now: DateTime<Utc>) -> Result<AppointmentFilter, ApiError> {
        let status = match non_empty(self.status) {
            Some(tag) => Some(
                tag.parse::<AppointmentStatus>()
                    .map_err(|e| invalid_field("Invalid query parameters", "status", &e.to_string()))?,
            ),
            None => None,
        };

        if self.upcoming.as_deref() == Some("true") {
            return Ok(AppointmentFilter {
                status,
                from: Some(now),
                to: None,
            });
        }

        Ok(AppointmentFilter {
            status,
            from: date_bound("startDate", self.start_date)?,
            to: date_bound("endDate", self.end_date)?,
        })
    }
}

fn appointment_not_found() -> ApiError {
    ApiError::not_found("Appointment not found")
}

fn validate(provider_name: Option<&str>, duration: Option<i32>) -> Result<(), ApiError> {
    if provider_name.is_some_and(|name| name.trim().is_empty()) {
        return Err(invalid_field("Invalid appointment", "providerName", "Must not be empty"));
    }
    if duration.is_some_and(|minutes| minutes <= 0) {
        return Err(invalid_field("Invalid appointment", "duration", "Must be a positive number of minutes"));
    }
    Ok(())
}

/// GET /api/v1/appointments - soonest first
pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
    query: Result<Query<AppointmentQuery>, QueryRejection>,
) -> ApiResult<Value> {
    let filter = query_params(query)?.into_filter(Utc::now())?;
    let appointments = state.appointments.list(identity.id, &filter).await?;
    Ok(ApiResponse::success(json!({ "appointments": appointments })))
}

/// GET /api/v1/appointments/:id
pub async fn get(State(state): State<AppState>, identity: Identity, Path(id): Path<Uuid>) -> ApiResult<Value> {
    let appointment = state
        .appointments
        .get(identity.id, id)
        .await?
        .ok_or_else(appointment_not_found)?;
    Ok(ApiResponse::success(json!({ "appointment": appointment })))
}

/// POST /api/v1/appointments
///
/// ```json
/// {
///   "appointmentType": "telemedicine",
///   "providerName": "Dr. Okafor",
///   "appointmentDate": "2025-04-02T15:00:00Z",
///   "duration": 45,
///   "reason": "Follow-up"
/// }
/// ```
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewAppointment>, JsonRejection>,
) -> ApiResult<Value> {
    let new_appointment = json_payload(payload)?;
    validate(Some(&new_appointment.provider_name), new_appointment.duration)?;

    let appointment = state.appointments.create(identity.id, new_appointment).await?;
    tracing::info!("Appointment {} booked for {}", appointment.id, identity.id);

    Ok(ApiResponse::created(json!({
        "message": "Appointment created successfully",
        "appointment": appointment
    })))
}

/// PUT /api/v1/appointments/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    payload: Result<Json<AppointmentChanges>, JsonRejection>,
) -> ApiResult<Value> {
    let changes = json_payload(payload)?;
    validate(changes.provider_name.as_deref(), changes.duration)?;

    let appointment = state
        .appointments
        .update(identity.id, id, changes)
        .await?
        .ok_or_else(appointment_not_found)?;

    Ok(ApiResponse::success(json!({
        "message": "Appointment updated successfully",
        "appointment": appointment
    })))
}

/// PATCH /api/v1/appointments/:id/cancel
pub async fn cancel(State(state): State<AppState>, identity: Identity, Path(id): Path<Uuid>) -> ApiResult<Value> {
    let appointment = state
        .appointments
        .cancel(identity.id, id)
        .await?
        .ok_or_else(appointment_not_found)?;

    tracing::info!("Appointment {} cancelled by {}", appointment.id, identity.id);
    Ok(ApiResponse::success(json!({
        "message": "Appointment cancelled successfully",
        "appointment": appointment
    })))
}

/// DELETE /api/v1/appointments/:id
pub async fn delete(State(state): State<AppState>, identity: Identity, Path(id): Path<Uuid>) -> ApiResult<Value> {
    if !state.appointments.delete(identity.id, id).await? {
        return Err(appointment_not_found());
    }

    Ok(ApiResponse::success(json!({ "message": "Appointment deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn upcoming_overrides_the_date_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let filter = AppointmentQuery {
            upcoming: Some("true".into()),
            start_date: Some("2020-01-01".into()),
            end_date: Some("2020-12-31".into()),
            ..Default::default()
        }
        .into_filter(now)
        .unwrap();

        assert_eq!(filter.from, Some(now));
        assert_eq!(filter.to, None);
    }

    #[test]
    fn upcoming_other_than_true_is_ignored() {
        let filter = AppointmentQuery {
            upcoming: Some("yes".into()),
            ..Default::default()
        }
        .into_filter(Utc::now())
        .unwrap();
        assert!(filter.from.is_none());
    }

    #[test]
    fn status_filter_is_parsed() {
        let filter = AppointmentQuery {
            status: Some("cancelled".into()),
            ..Default::default()
        }
        .into_filter(Utc::now())
        .unwrap();
        assert_eq!(filter.status, Some(AppointmentStatus::Cancelled));

        let unknown = AppointmentQuery {
            status: Some("postponed".into()),
            ..Default::default()
        };
        assert!(unknown.into_filter(Utc::now()).is_err());
    }

    #[test]
    fn provider_and_duration_are_validated() {
        assert!(validate(Some(""), None).is_err());
        assert!(validate(Some("Dr. Okafor"), Some(0)).is_err());
        assert!(validate(Some("Dr. Okafor"), Some(45)).is_ok());
        assert!(validate(None, None).is_ok());
    }
}
