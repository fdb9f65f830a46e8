use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::manager::{like_pattern, DatabaseError};
use super::models::medical_record::{
    MedicalRecord, MedicalRecordChanges, MedicalRecordRow, NewMedicalRecord, RecordFilter,
};

/// Medical record storage, scoped to one owner like [`super::PetStore`]
#[async_trait]
pub trait MedicalRecordStore: Send + Sync {
    /// Matching records, most recent `date` first
    async fn list(&self, owner_id: Uuid, filter: &RecordFilter) -> Result<Vec<MedicalRecord>, DatabaseError>;

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<MedicalRecord>, DatabaseError>;

    async fn create(&self, owner_id: Uuid, new_record: NewMedicalRecord) -> Result<MedicalRecord, DatabaseError>;

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: MedicalRecordChanges,
    ) -> Result<Option<MedicalRecord>, DatabaseError>;

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
}

const RECORD_COLUMNS: &str = "id, owner_id, record_type, title, description, date, provider, facility, \
                              diagnosis, medications, notes, attachments, is_critical, is_shared, \
                              created_at, updated_at";

#[derive(Clone)]
pub struct PgMedicalRecordStore {
    pool: PgPool,
}

impl PgMedicalRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn save(&self, record: &MedicalRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE medical_records
            SET record_type = $3, title = $4, description = $5, date = $6, provider = $7,
                facility = $8, diagnosis = $9, medications = $10, notes = $11,
                attachments = $12, is_critical = $13, is_shared = $14, updated_at = $15
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(record.id)
        .bind(record.owner_id)
        .bind(record.record_type.as_str())
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.date)
        .bind(&record.provider)
        .bind(&record.facility)
        .bind(&record.diagnosis)
        .bind(&record.medications)
        .bind(&record.notes)
        .bind(&record.attachments)
        .bind(record.is_critical)
        .bind(record.is_shared)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MedicalRecordStore for PgMedicalRecordStore {
    async fn list(&self, owner_id: Uuid, filter: &RecordFilter) -> Result<Vec<MedicalRecord>, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM medical_records WHERE owner_id = ",
            RECORD_COLUMNS
        ));
        query.push_bind(owner_id);

        if let Some(record_type) = filter.record_type {
            query.push(" AND record_type = ").push_bind(record_type.as_str());
        }
        if let Some(from) = filter.from {
            query.push(" AND date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND date <= ").push_bind(to);
        }
        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR provider ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY date DESC");

        query
            .build_query_as::<MedicalRecordRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(MedicalRecord::try_from)
            .collect()
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<MedicalRecord>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM medical_records WHERE id = $1 AND owner_id = $2",
            RECORD_COLUMNS
        );
        sqlx::query_as::<_, MedicalRecordRow>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .map(MedicalRecord::try_from)
            .transpose()
    }

    async fn create(&self, owner_id: Uuid, new_record: NewMedicalRecord) -> Result<MedicalRecord, DatabaseError> {
        let record = MedicalRecord::from_new(owner_id, new_record, Utc::now());
        sqlx::query(
            r#"
            INSERT INTO medical_records
                (id, owner_id, record_type, title, description, date, provider, facility,
                 diagnosis, medications, notes, attachments, is_critical, is_shared,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(record.id)
        .bind(record.owner_id)
        .bind(record.record_type.as_str())
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.date)
        .bind(&record.provider)
        .bind(&record.facility)
        .bind(&record.diagnosis)
        .bind(&record.medications)
        .bind(&record.notes)
        .bind(&record.attachments)
        .bind(record.is_critical)
        .bind(record.is_shared)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: MedicalRecordChanges,
    ) -> Result<Option<MedicalRecord>, DatabaseError> {
        let Some(mut record) = self.get(owner_id, id).await? else {
            return Ok(None);
        };
        record.apply(changes, Utc::now());
        self.save(&record).await?;
        Ok(Some(record))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM medical_records WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
