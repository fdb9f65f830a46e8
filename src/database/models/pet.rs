use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::types::text_enum;

text_enum! {
    pub enum PetType {
        Dog => "dog",
        Cat => "cat",
        Bird => "bird",
        Rabbit => "rabbit",
        Hamster => "hamster",
        GuineaPig => "guinea_pig",
        Reptile => "reptile",
        Fish => "fish",
        Horse => "horse",
        Other => "other",
    }
}

text_enum! {
    pub enum PetGender {
        Male => "male",
        Female => "female",
        NeuteredMale => "neutered_male",
        SpayedFemale => "spayed_female",
    }
}

/// Where and when a lost pet was last seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LostDetails {
    pub last_seen_date: DateTime<Utc>,
    pub last_seen_location: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub pet_type: PetType,
    pub breed: Option<String>,
    pub gender: PetGender,
    pub is_lost: bool,
    pub lost_details: Option<LostDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPet {
    pub name: String,
    pub pet_type: PetType,
    pub gender: PetGender,
    pub breed: Option<String>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetChanges {
    pub name: Option<String>,
    pub pet_type: Option<PetType>,
    pub gender: Option<PetGender>,
    pub breed: Option<String>,
}

impl Pet {
    pub fn from_new(owner_id: Uuid, new_pet: NewPet, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: new_pet.name,
            pet_type: new_pet.pet_type,
            breed: new_pet.breed,
            gender: new_pet.gender,
            is_lost: false,
            lost_details: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: PetChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(pet_type) = changes.pet_type {
            self.pet_type = pet_type;
        }
        if let Some(gender) = changes.gender {
            self.gender = gender;
        }
        if changes.breed.is_some() {
            self.breed = changes.breed;
        }
        self.updated_at = now;
    }

    pub fn mark_lost(&mut self, details: LostDetails, now: DateTime<Utc>) {
        self.is_lost = true;
        self.lost_details = Some(details);
        self.updated_at = now;
    }
}

#[derive(Debug, FromRow)]
pub struct PetRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub pet_type: String,
    pub breed: Option<String>,
    pub gender: String,
    pub is_lost: bool,
    pub lost_details: Option<Json<LostDetails>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PetRow> for Pet {
    type Error = DatabaseError;

    fn try_from(row: PetRow) -> Result<Self, Self::Error> {
        Ok(Self {
            pet_type: row.pet_type.parse().map_err(|e| DatabaseError::InvalidRow(format!("pet {}: {}", row.id, e)))?,
            gender: row.gender.parse().map_err(|e| DatabaseError::InvalidRow(format!("pet {}: {}", row.id, e)))?,
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            breed: row.breed,
            is_lost: row.is_lost,
            lost_details: row.lost_details.map(|Json(details)| details),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
