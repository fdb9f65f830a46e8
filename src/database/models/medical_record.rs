use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::types::text_enum;

text_enum! {
    pub enum RecordType {
        Visit => "visit",
        LabResult => "lab_result",
        Imaging => "imaging",
        Prescription => "prescription",
        Procedure => "procedure",
        Hospitalization => "hospitalization",
        Vaccination => "vaccination",
        Allergy => "allergy",
        Diagnosis => "diagnosis",
        DischargeSummary => "discharge_summary",
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub record_type: RecordType,
    pub title: String,
    pub description: Option<String>,
    /// When the visit, test or procedure happened
    pub date: DateTime<Utc>,
    pub provider: Option<String>,
    pub facility: Option<String>,
    pub diagnosis: Vec<String>,
    pub medications: Vec<String>,
    pub notes: Option<String>,
    pub attachments: Vec<String>,
    pub is_critical: bool,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicalRecord {
    pub record_type: RecordType,
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub facility: Option<String>,
    #[serde(default)]
    pub diagnosis: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub is_critical: bool,
    #[serde(default)]
    pub is_shared: bool,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecordChanges {
    pub record_type: Option<RecordType>,
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub facility: Option<String>,
    pub diagnosis: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
    pub notes: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub is_critical: Option<bool>,
    pub is_shared: Option<bool>,
}

/// List filter. All present conditions must hold.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub record_type: Option<RecordType>,
    /// Inclusive lower bound on `date`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `date`
    pub to: Option<DateTime<Utc>>,
    /// Case-insensitive substring of title, description or provider
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &MedicalRecord) -> bool {
        if self.record_type.is_some_and(|t| t != record.record_type) {
            return false;
        }
        if self.from.is_some_and(|from| record.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| record.date > to) {
            return false;
        }
        match &self.search {
            Some(needle) => {
                let needle = needle.to_lowercase();
                [Some(&record.title), record.description.as_ref(), record.provider.as_ref()]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

impl MedicalRecord {
    pub fn from_new(owner_id: Uuid, new_record: NewMedicalRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            record_type: new_record.record_type,
            title: new_record.title,
            description: new_record.description,
            date: new_record.date,
            provider: new_record.provider,
            facility: new_record.facility,
            diagnosis: new_record.diagnosis,
            medications: new_record.medications,
            notes: new_record.notes,
            attachments: new_record.attachments,
            is_critical: new_record.is_critical,
            is_shared: new_record.is_shared,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: MedicalRecordChanges, now: DateTime<Utc>) {
        if let Some(record_type) = changes.record_type {
            self.record_type = record_type;
        }
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(date) = changes.date {
            self.date = date;
        }
        if changes.description.is_some() {
            self.description = changes.description;
        }
        if changes.provider.is_some() {
            self.provider = changes.provider;
        }
        if changes.facility.is_some() {
            self.facility = changes.facility;
        }
        if let Some(diagnosis) = changes.diagnosis {
            self.diagnosis = diagnosis;
        }
        if let Some(medications) = changes.medications {
            self.medications = medications;
        }
        if changes.notes.is_some() {
            self.notes = changes.notes;
        }
        if let Some(attachments) = changes.attachments {
            self.attachments = attachments;
        }
        if let Some(is_critical) = changes.is_critical {
            self.is_critical = is_critical;
        }
        if let Some(is_shared) = changes.is_shared {
            self.is_shared = is_shared;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, FromRow)]
pub struct MedicalRecordRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub record_type: String,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub provider: Option<String>,
    pub facility: Option<String>,
    pub diagnosis: Vec<String>,
    pub medications: Vec<String>,
    pub notes: Option<String>,
    pub attachments: Vec<String>,
    pub is_critical: bool,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MedicalRecordRow> for MedicalRecord {
    type Error = DatabaseError;

    fn try_from(row: MedicalRecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            record_type: row
                .record_type
                .parse()
                .map_err(|e| DatabaseError::InvalidRow(format!("medical record {}: {}", row.id, e)))?,
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            date: row.date,
            provider: row.provider,
            facility: row.facility,
            diagnosis: row.diagnosis,
            medications: row.medications,
            notes: row.notes,
            attachments: row.attachments,
            is_critical: row.is_critical,
            is_shared: row.is_shared,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
