use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::appointment::{
    Appointment, AppointmentChanges, AppointmentFilter, AppointmentRow, NewAppointment,
};

/// Appointment storage, scoped to one owner
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Matching appointments, soonest first
    async fn list(&self, owner_id: Uuid, filter: &AppointmentFilter) -> Result<Vec<Appointment>, DatabaseError>;

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Appointment>, DatabaseError>;

    async fn create(&self, owner_id: Uuid, new_appointment: NewAppointment) -> Result<Appointment, DatabaseError>;

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, DatabaseError>;

    async fn cancel(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Appointment>, DatabaseError>;

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
}

const APPOINTMENT_COLUMNS: &str = "id, owner_id, appointment_type, status, provider_name, provider_specialty, \
                                   facility_name, facility_address, appointment_date, duration, reason, \
                                   notes, telemedicine_link, reminder_sent, created_at, updated_at";

#[derive(Clone)]
pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn save(&self, appointment: &Appointment) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET appointment_type = $3, status = $4, provider_name = $5, provider_specialty = $6,
                facility_name = $7, facility_address = $8, appointment_date = $9, duration = $10,
                reason = $11, notes = $12, telemedicine_link = $13, updated_at = $14
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(appointment.id)
        .bind(appointment.owner_id)
        .bind(appointment.appointment_type.as_str())
        .bind(appointment.status.as_str())
        .bind(&appointment.provider_name)
        .bind(&appointment.provider_specialty)
        .bind(&appointment.facility_name)
        .bind(&appointment.facility_address)
        .bind(appointment.appointment_date)
        .bind(appointment.duration)
        .bind(&appointment.reason)
        .bind(&appointment.notes)
        .bind(&appointment.telemedicine_link)
        .bind(appointment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn list(&self, owner_id: Uuid, filter: &AppointmentFilter) -> Result<Vec<Appointment>, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM appointments WHERE owner_id = ",
            APPOINTMENT_COLUMNS
        ));
        query.push_bind(owner_id);

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(from) = filter.from {
            query.push(" AND appointment_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND appointment_date <= ").push_bind(to);
        }
        query.push(" ORDER BY appointment_date ASC");

        query
            .build_query_as::<AppointmentRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Appointment::try_from)
            .collect()
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM appointments WHERE id = $1 AND owner_id = $2",
            APPOINTMENT_COLUMNS
        );
        sqlx::query_as::<_, AppointmentRow>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Appointment::try_from)
            .transpose()
    }

    async fn create(&self, owner_id: Uuid, new_appointment: NewAppointment) -> Result<Appointment, DatabaseError> {
        let appointment = Appointment::from_new(owner_id, new_appointment, Utc::now());
        sqlx::query(
            r#"
            INSERT INTO appointments
                (id, owner_id, appointment_type, status, provider_name, provider_specialty,
                 facility_name, facility_address, appointment_date, duration, reason, notes,
                 telemedicine_link, reminder_sent, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(appointment.id)
        .bind(appointment.owner_id)
        .bind(appointment.appointment_type.as_str())
        .bind(appointment.status.as_str())
        .bind(&appointment.provider_name)
        .bind(&appointment.provider_specialty)
        .bind(&appointment.facility_name)
        .bind(&appointment.facility_address)
        .bind(appointment.appointment_date)
        .bind(appointment.duration)
        .bind(&appointment.reason)
        .bind(&appointment.notes)
        .bind(&appointment.telemedicine_link)
        .bind(appointment.reminder_sent)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(appointment)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, DatabaseError> {
        let Some(mut appointment) = self.get(owner_id, id).await? else {
            return Ok(None);
        };
        appointment.apply(changes, Utc::now());
        self.save(&appointment).await?;
        Ok(Some(appointment))
    }

    async fn cancel(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let Some(mut appointment) = self.get(owner_id, id).await? else {
            return Ok(None);
        };
        appointment.cancel(Utc::now());
        self.save(&appointment).await?;
        Ok(Some(appointment))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
