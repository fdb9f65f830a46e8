use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::pet::{LostDetails, NewPet, Pet, PetChanges, PetRow};

/// Pet storage. Every operation is scoped to one owner; another owner's pet
/// looks exactly like a missing one.
#[async_trait]
pub trait PetStore: Send + Sync {
    /// Newest first
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Pet>, DatabaseError>;

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Pet>, DatabaseError>;

    async fn create(&self, owner_id: Uuid, new_pet: NewPet) -> Result<Pet, DatabaseError>;

    async fn update(&self, owner_id: Uuid, id: Uuid, changes: PetChanges) -> Result<Option<Pet>, DatabaseError>;

    async fn report_lost(&self, owner_id: Uuid, id: Uuid, details: LostDetails) -> Result<Option<Pet>, DatabaseError>;

    /// Returns whether a pet was removed
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
}

const PET_COLUMNS: &str = "id, owner_id, name, pet_type, breed, gender, is_lost, lost_details, created_at, updated_at";

/// `PetStore` backed by the `pets` table
#[derive(Clone)]
pub struct PgPetStore {
    pool: PgPool,
}

impl PgPetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn save(&self, pet: &Pet) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE pets
            SET name = $3, pet_type = $4, breed = $5, gender = $6,
                is_lost = $7, lost_details = $8, updated_at = $9
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(pet.id)
        .bind(pet.owner_id)
        .bind(&pet.name)
        .bind(pet.pet_type.as_str())
        .bind(&pet.breed)
        .bind(pet.gender.as_str())
        .bind(pet.is_lost)
        .bind(pet.lost_details.as_ref().map(Json))
        .bind(pet.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PetStore for PgPetStore {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Pet>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM pets WHERE owner_id = $1 ORDER BY created_at DESC",
            PET_COLUMNS
        );
        sqlx::query_as::<_, PetRow>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Pet::try_from)
            .collect()
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Pet>, DatabaseError> {
        let query = format!("SELECT {} FROM pets WHERE id = $1 AND owner_id = $2", PET_COLUMNS);
        sqlx::query_as::<_, PetRow>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Pet::try_from)
            .transpose()
    }

    async fn create(&self, owner_id: Uuid, new_pet: NewPet) -> Result<Pet, DatabaseError> {
        let pet = Pet::from_new(owner_id, new_pet, Utc::now());
        sqlx::query(
            r#"
            INSERT INTO pets
                (id, owner_id, name, pet_type, breed, gender, is_lost, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(pet.id)
        .bind(pet.owner_id)
        .bind(&pet.name)
        .bind(pet.pet_type.as_str())
        .bind(&pet.breed)
        .bind(pet.gender.as_str())
        .bind(pet.is_lost)
        .bind(pet.created_at)
        .bind(pet.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(pet)
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, changes: PetChanges) -> Result<Option<Pet>, DatabaseError> {
        let Some(mut pet) = self.get(owner_id, id).await? else {
            return Ok(None);
        };
        pet.apply(changes, Utc::now());
        self.save(&pet).await?;
        Ok(Some(pet))
    }

    async fn report_lost(&self, owner_id: Uuid, id: Uuid, details: LostDetails) -> Result<Option<Pet>, DatabaseError> {
        let Some(mut pet) = self.get(owner_id, id).await? else {
            return Ok(None);
        };
        pet.mark_lost(details, Utc::now());
        self.save(&pet).await?;
        Ok(Some(pet))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM pets WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
