// handlers/protected/pets.rs - pet profiles, pet owners only
//
// Every query is scoped by the caller's id; someone else's pet answers 404
// exactly like a missing one.

use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Identity;
use crate::database::models::pet::{LostDetails, NewPet, PetChanges};
use crate::error::ApiError;
use crate::handlers::{invalid_field, json_payload};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

fn pet_not_found() -> ApiError {
    ApiError::not_found("Pet not found")
}

fn require_name(name: Option<&str>) -> Result<(), ApiError> {
    match name {
        Some(name) if name.trim().is_empty() => Err(invalid_field("Invalid pet details", "name", "Must not be empty")),
        _ => Ok(()),
    }
}

/// GET /api/v1/pets
pub async fn list(State(state): State<AppState>, identity: Identity) -> ApiResult<Value> {
    let pets = state.pets.list(identity.id).await?;
    Ok(ApiResponse::success(json!({ "pets": pets })))
}

/// GET /api/v1/pets/:id
pub async fn get(State(state): State<AppState>, identity: Identity, Path(id): Path<Uuid>) -> ApiResult<Value> {
    let pet = state.pets.get(identity.id, id).await?.ok_or_else(pet_not_found)?;
    Ok(ApiResponse::success(json!({ "pet": pet })))
}

/// POST /api/v1/pets
///
/// ```json
/// { "name": "Rex", "petType": "dog", "gender": "male", "breed": "Beagle" }
/// ```
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewPet>, JsonRejection>,
) -> ApiResult<Value> {
    let new_pet = json_payload(payload)?;
    require_name(Some(&new_pet.name))?;

    let pet = state.pets.create(identity.id, new_pet).await?;
    tracing::info!("Pet {} added for owner {}", pet.id, identity.id);

    Ok(ApiResponse::created(json!({
        "message": "Pet added successfully",
        "pet": pet
    })))
}

/// PUT /api/v1/pets/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    payload: Result<Json<PetChanges>, JsonRejection>,
) -> ApiResult<Value> {
    let changes = json_payload(payload)?;
    require_name(changes.name.as_deref())?;

    let pet = state
        .pets
        .update(identity.id, id, changes)
        .await?
        .ok_or_else(pet_not_found)?;

    Ok(ApiResponse::success(json!({
        "message": "Pet updated successfully",
        "pet": pet
    })))
}

/// POST /api/v1/pets/:id/lost
///
/// ```json
/// {
///   "lastSeenDate": "2025-03-01T18:00:00Z",
///   "lastSeenLocation": "Riverside park",
///   "description": "Red collar, answers to Rex"
/// }
/// ```
pub async fn report_lost(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    payload: Result<Json<LostDetails>, JsonRejection>,
) -> ApiResult<Value> {
    let details = json_payload(payload)?;

    let pet = state
        .pets
        .report_lost(identity.id, id, details)
        .await?
        .ok_or_else(pet_not_found)?;

    tracing::info!("Pet {} reported lost by {}", pet.id, identity.id);
    Ok(ApiResponse::success(json!({
        "message": "Pet reported as lost",
        "pet": pet
    })))
}

/// DELETE /api/v1/pets/:id
pub async fn delete(State(state): State<AppState>, identity: Identity, Path(id): Path<Uuid>) -> ApiResult<Value> {
    if !state.pets.delete(identity.id, id).await? {
        return Err(pet_not_found());
    }

    Ok(ApiResponse::success(json!({ "message": "Pet removed successfully" })))
}
