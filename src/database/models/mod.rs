pub mod appointment;
pub mod medical_record;
pub mod pet;
pub mod user;

pub use appointment::{Appointment, AppointmentChanges, AppointmentFilter, AppointmentStatus, AppointmentType, NewAppointment};
pub use medical_record::{MedicalRecord, MedicalRecordChanges, NewMedicalRecord, RecordFilter, RecordType};
pub use pet::{LostDetails, NewPet, Pet, PetChanges, PetGender, PetType};
pub use user::{NewUser, User};
