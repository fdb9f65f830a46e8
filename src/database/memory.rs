//! In-process stores for tests and database-less development runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::appointments::AppointmentStore;
use super::manager::DatabaseError;
use super::medical_records::MedicalRecordStore;
use super::models::appointment::{Appointment, AppointmentChanges, AppointmentFilter, NewAppointment};
use super::models::medical_record::{MedicalRecord, MedicalRecordChanges, NewMedicalRecord, RecordFilter};
use super::models::pet::{LostDetails, NewPet, Pet, PetChanges};
use super::models::user::{NewUser, User};
use super::pets::PetStore;
use super::users::{UserStore, DUPLICATE_EMAIL};
use crate::auth::{AccountStatus, Role};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed user, bypassing registration
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn set_status(&self, id: Uuid, status: AccountStatus) -> bool {
        self.update_with(id, |user| user.status = status).await
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> bool {
        self.update_with(id, |user| user.role = role).await
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.users.write().await.remove(&id).is_some()
    }

    async fn update_with(&self, id: Uuid, change: impl FnOnce(&mut User)) -> bool {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                change(user);
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        let user = User::from_new(new_user, Utc::now());
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.last_login_at = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }

    async fn verify_email(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.email_verified = true;
            user.status = AccountStatus::Active;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

/// Rows keyed by id, each visible only to its owner
struct OwnedRows<T> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T> Default for OwnedRows<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

trait Owned: Clone + Send + Sync {
    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Uuid;
}

impl Owned for Pet {
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for MedicalRecord {
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Appointment {
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl<T: Owned> OwnedRows<T> {
    async fn list(&self, owner_id: Uuid, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| row.owner_id() == owner_id && keep(*row))
            .cloned()
            .collect()
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Option<T> {
        self.rows
            .read()
            .await
            .get(&id)
            .filter(|row| row.owner_id() == owner_id)
            .cloned()
    }

    async fn insert(&self, row: T) -> T {
        self.rows.write().await.insert(row.id(), row.clone());
        row
    }

    async fn modify(&self, owner_id: Uuid, id: Uuid, change: impl FnOnce(&mut T)) -> Option<T> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).filter(|row| row.owner_id() == owner_id)?;
        change(row);
        Some(row.clone())
    }

    async fn remove(&self, owner_id: Uuid, id: Uuid) -> bool {
        let mut rows = self.rows.write().await;
        if rows.get(&id).is_some_and(|row| row.owner_id() == owner_id) {
            rows.remove(&id);
            return true;
        }
        false
    }
}

#[derive(Default)]
pub struct MemoryPetStore {
    pets: OwnedRows<Pet>,
}

impl MemoryPetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PetStore for MemoryPetStore {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Pet>, DatabaseError> {
        let mut pets = self.pets.list(owner_id, |_| true).await;
        pets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pets)
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Pet>, DatabaseError> {
        Ok(self.pets.get(owner_id, id).await)
    }

    async fn create(&self, owner_id: Uuid, new_pet: NewPet) -> Result<Pet, DatabaseError> {
        Ok(self.pets.insert(Pet::from_new(owner_id, new_pet, Utc::now())).await)
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, changes: PetChanges) -> Result<Option<Pet>, DatabaseError> {
        Ok(self.pets.modify(owner_id, id, |pet| pet.apply(changes, Utc::now())).await)
    }

    async fn report_lost(&self, owner_id: Uuid, id: Uuid, details: LostDetails) -> Result<Option<Pet>, DatabaseError> {
        Ok(self.pets.modify(owner_id, id, |pet| pet.mark_lost(details, Utc::now())).await)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.pets.remove(owner_id, id).await)
    }
}

#[derive(Default)]
pub struct MemoryMedicalRecordStore {
    records: OwnedRows<MedicalRecord>,
}

impl MemoryMedicalRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MedicalRecordStore for MemoryMedicalRecordStore {
    async fn list(&self, owner_id: Uuid, filter: &RecordFilter) -> Result<Vec<MedicalRecord>, DatabaseError> {
        let mut records = self.records.list(owner_id, |record| filter.matches(record)).await;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<MedicalRecord>, DatabaseError> {
        Ok(self.records.get(owner_id, id).await)
    }

    async fn create(&self, owner_id: Uuid, new_record: NewMedicalRecord) -> Result<MedicalRecord, DatabaseError> {
        Ok(self
            .records
            .insert(MedicalRecord::from_new(owner_id, new_record, Utc::now()))
            .await)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: MedicalRecordChanges,
    ) -> Result<Option<MedicalRecord>, DatabaseError> {
        Ok(self
            .records
            .modify(owner_id, id, |record| record.apply(changes, Utc::now()))
            .await)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.records.remove(owner_id, id).await)
    }
}

#[derive(Default)]
pub struct MemoryAppointmentStore {
    appointments: OwnedRows<Appointment>,
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn list(&self, owner_id: Uuid, filter: &AppointmentFilter) -> Result<Vec<Appointment>, DatabaseError> {
        let mut appointments = self
            .appointments
            .list(owner_id, |appointment| filter.matches(appointment))
            .await;
        appointments.sort_by(|a, b| a.appointment_date.cmp(&b.appointment_date));
        Ok(appointments)
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        Ok(self.appointments.get(owner_id, id).await)
    }

    async fn create(&self, owner_id: Uuid, new_appointment: NewAppointment) -> Result<Appointment, DatabaseError> {
        Ok(self
            .appointments
            .insert(Appointment::from_new(owner_id, new_appointment, Utc::now()))
            .await)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, DatabaseError> {
        Ok(self
            .appointments
            .modify(owner_id, id, |appointment| appointment.apply(changes, Utc::now()))
            .await)
    }

    async fn cancel(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        Ok(self
            .appointments
            .modify(owner_id, id, |appointment| appointment.cancel(Utc::now()))
            .await)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.appointments.remove(owner_id, id).await)
    }
}

/// User store whose backend is always down
#[cfg(test)]
pub(crate) struct UnreachableUserStore;

#[cfg(test)]
#[async_trait]
impl UserStore for UnreachableUserStore {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn create(&self, _new_user: NewUser) -> Result<User, DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn record_login(&self, _id: Uuid, _at: DateTime<Utc>) -> Result<(), DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn verify_email(&self, _id: Uuid) -> Result<Option<User>, DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))
    }
}
