// handlers/protected/medical_records.rs - the caller's own health records
//
// Any active role may keep records; every query is scoped by the caller's id
// and a record owned by someone else answers 404.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Identity;
use crate::database::models::medical_record::{MedicalRecordChanges, NewMedicalRecord, RecordFilter, RecordType};
use crate::error::ApiError;
use crate::handlers::{date_bound, invalid_field, json_payload, non_empty, query_params};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// `?recordType=lab_result&startDate=2025-01-01&endDate=2025-06-30&search=lipid`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    pub record_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
}

impl RecordQuery {
    fn into_filter(self) -> Result<RecordFilter, ApiError> {
        let record_type = match non_empty(self.record_type) {
            Some(tag) => Some(tag.parse::<RecordType>().map_err(|e| {
                invalid_field("Invalid query parameters", "recordType", &e.to_string())
            })?),
            None => None,
        };

        Ok(RecordFilter {
            record_type,
            from: date_bound("startDate", self.start_date)?,
            to: date_bound("endDate", self.end_date)?,
            search: non_empty(self.search).map(|s| s.trim().to_string()),
        })
    }
}

fn record_not_found() -> ApiError {
    ApiError::not_found("Medical record not found")
}

fn require_title(title: Option<&str>) -> Result<(), ApiError> {
    match title {
        Some(title) if title.trim().is_empty() => {
            Err(invalid_field("Invalid medical record", "title", "Must not be empty"))
        }
        _ => Ok(()),
    }
}

/// GET /api/v1/medical-records - newest first
pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
    query: Result<Query<RecordQuery>, QueryRejection>,
) -> ApiResult<Value> {
    let filter = query_params(query)?.into_filter()?;
    let records = state.records.list(identity.id, &filter).await?;
    Ok(ApiResponse::success(json!({ "records": records })))
}

/// GET /api/v1/medical-records/:id
pub async fn get(State(state): State<AppState>, identity: Identity, Path(id): Path<Uuid>) -> ApiResult<Value> {
    let record = state.records.get(identity.id, id).await?.ok_or_else(record_not_found)?;
    Ok(ApiResponse::success(json!({ "record": record })))
}

/// POST /api/v1/medical-records
///
/// ```json
/// {
///   "recordType": "lab_result",
///   "title": "Lipid panel",
///   "date": "2025-03-01T09:00:00Z",
///   "provider": "Dr. Okafor",
///   "medications": ["atorvastatin"]
/// }
/// ```
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewMedicalRecord>, JsonRejection>,
) -> ApiResult<Value> {
    let new_record = json_payload(payload)?;
    require_title(Some(&new_record.title))?;

    let record = state.records.create(identity.id, new_record).await?;
    tracing::info!("Medical record {} created for {}", record.id, identity.id);

    Ok(ApiResponse::created(json!({
        "message": "Medical record created successfully",
        "record": record
    })))
}

/// PUT /api/v1/medical-records/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    payload: Result<Json<MedicalRecordChanges>, JsonRejection>,
) -> ApiResult<Value> {
    let changes = json_payload(payload)?;
    require_title(changes.title.as_deref())?;

    let record = state
        .records
        .update(identity.id, id, changes)
        .await?
        .ok_or_else(record_not_found)?;

    Ok(ApiResponse::success(json!({
        "message": "Medical record updated successfully",
        "record": record
    })))
}

/// DELETE /api/v1/medical-records/:id
pub async fn delete(State(state): State<AppState>, identity: Identity, Path(id): Path<Uuid>) -> ApiResult<Value> {
    if !state.records.delete(identity.id, id).await? {
        return Err(record_not_found());
    }

    tracing::info!("Medical record {} deleted by {}", id, identity.id);
    Ok(ApiResponse::success(json!({ "message": "Medical record deleted successfully" })))
}
