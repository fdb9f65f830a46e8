pub mod appointments;
pub mod manager;
pub mod medical_records;
pub mod memory;
pub mod models;
pub mod pets;
pub mod users;

pub use appointments::{AppointmentStore, PgAppointmentStore};
pub use manager::{connect, ensure_schema, health_check, DatabaseError};
pub use medical_records::{MedicalRecordStore, PgMedicalRecordStore};
pub use memory::{MemoryAppointmentStore, MemoryMedicalRecordStore, MemoryPetStore, MemoryUserStore};
pub use pets::{PetStore, PgPetStore};
pub use users::{PgUserStore, UserStore};
