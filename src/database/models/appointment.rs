use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::types::text_enum;

pub const DEFAULT_DURATION_MINUTES: i32 = 30;

text_enum! {
    pub enum AppointmentType {
        InPerson => "in_person",
        Telemedicine => "telemedicine",
        Phone => "phone",
        HomeVisit => "home_visit",
    }
}

text_enum! {
    pub enum AppointmentStatus {
        Scheduled => "scheduled",
        Confirmed => "confirmed",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
        Rescheduled => "rescheduled",
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub provider_name: String,
    pub provider_specialty: Option<String>,
    pub facility_name: Option<String>,
    pub facility_address: Option<String>,
    pub appointment_date: DateTime<Utc>,
    /// Minutes
    pub duration: i32,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub telemedicine_link: Option<String>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub appointment_type: AppointmentType,
    pub provider_name: String,
    pub appointment_date: DateTime<Utc>,
    pub duration: Option<i32>,
    pub provider_specialty: Option<String>,
    pub facility_name: Option<String>,
    pub facility_address: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub telemedicine_link: Option<String>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentChanges {
    pub appointment_type: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
    pub provider_name: Option<String>,
    pub appointment_date: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub provider_specialty: Option<String>,
    pub facility_name: Option<String>,
    pub facility_address: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub telemedicine_link: Option<String>,
}

/// List filter on status and an inclusive `appointment_date` window
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.status.map_or(true, |status| status == appointment.status)
            && self.from.map_or(true, |from| appointment.appointment_date >= from)
            && self.to.map_or(true, |to| appointment.appointment_date <= to)
    }
}

impl Appointment {
    /// New appointments start `scheduled`
    pub fn from_new(owner_id: Uuid, new_appointment: NewAppointment, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            appointment_type: new_appointment.appointment_type,
            status: AppointmentStatus::Scheduled,
            provider_name: new_appointment.provider_name,
            provider_specialty: new_appointment.provider_specialty,
            facility_name: new_appointment.facility_name,
            facility_address: new_appointment.facility_address,
            appointment_date: new_appointment.appointment_date,
            duration: new_appointment.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
            reason: new_appointment.reason,
            notes: new_appointment.notes,
            telemedicine_link: new_appointment.telemedicine_link,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: AppointmentChanges, now: DateTime<Utc>) {
        if let Some(appointment_type) = changes.appointment_type {
            self.appointment_type = appointment_type;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(provider_name) = changes.provider_name {
            self.provider_name = provider_name;
        }
        if let Some(appointment_date) = changes.appointment_date {
            self.appointment_date = appointment_date;
        }
        if let Some(duration) = changes.duration {
            self.duration = duration;
        }
        if changes.provider_specialty.is_some() {
            self.provider_specialty = changes.provider_specialty;
        }
        if changes.facility_name.is_some() {
            self.facility_name = changes.facility_name;
        }
        if changes.facility_address.is_some() {
            self.facility_address = changes.facility_address;
        }
        if changes.reason.is_some() {
            self.reason = changes.reason;
        }
        if changes.notes.is_some() {
            self.notes = changes.notes;
        }
        if changes.telemedicine_link.is_some() {
            self.telemedicine_link = changes.telemedicine_link;
        }
        self.updated_at = now;
    }

    /// Cancelling is allowed from any status and is idempotent
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = AppointmentStatus::Cancelled;
        self.updated_at = now;
    }
}

#[derive(Debug, FromRow)]
pub struct AppointmentRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub appointment_type: String,
    pub status: String,
    pub provider_name: String,
    pub provider_specialty: Option<String>,
    pub facility_name: Option<String>,
    pub facility_address: Option<String>,
    pub appointment_date: DateTime<Utc>,
    pub duration: i32,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub telemedicine_link: Option<String>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DatabaseError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let invalid = |e: crate::types::UnknownVariant| DatabaseError::InvalidRow(format!("appointment {}: {}", row.id, e));
        Ok(Self {
            appointment_type: row.appointment_type.parse().map_err(invalid)?,
            status: row.status.parse().map_err(invalid)?,
            id: row.id,
            owner_id: row.owner_id,
            provider_name: row.provider_name,
            provider_specialty: row.provider_specialty,
            facility_name: row.facility_name,
            facility_address: row.facility_address,
            appointment_date: row.appointment_date,
            duration: row.duration,
            reason: row.reason,
            notes: row.notes,
            telemedicine_link: row.telemedicine_link,
            reminder_sent: row.reminder_sent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
