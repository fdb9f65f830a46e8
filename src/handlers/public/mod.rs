// handlers/public/mod.rs - no authentication required
//
// Token acquisition only. Handlers here never see an Identity and must
// validate every input themselves.

pub mod auth;
