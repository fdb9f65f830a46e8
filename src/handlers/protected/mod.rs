// handlers/protected/mod.rs - mounted behind require_auth
//
// Handlers take an `Identity` extractor; reaching one without the gate in
// front answers 401.

pub mod appointments;
pub mod auth;
pub mod medical_records;
pub mod pets;
