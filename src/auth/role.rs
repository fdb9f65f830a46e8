use crate::types::text_enum;

text_enum! {
    /// Account type, used for coarse route access control
    pub enum Role {
        Individual => "individual",
        PetOwner => "pet_owner",
        Veteran => "veteran",
        Physician => "physician",
        Insurance => "insurance",
        Legal => "legal",
    }
}

text_enum! {
    /// Activation status of an account
    pub enum AccountStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
        PendingVerification => "pending_verification",
    }
}

impl AccountStatus {
    /// Whether an already-issued token for this account may reach a
    /// protected route. Only `Active` passes.
    pub fn admits_requests(self) -> bool {
        match self {
            AccountStatus::Active => true,
            AccountStatus::Inactive | AccountStatus::Suspended | AccountStatus::PendingVerification => false,
        }
    }

    /// Whether this account may log in and receive a token.
    ///
    /// Unverified accounts may log in but are still turned away by the
    /// request gate until they become `Active`.
    pub fn admits_login(self) -> bool {
        match self {
            AccountStatus::Active | AccountStatus::PendingVerification => true,
            AccountStatus::Inactive | AccountStatus::Suspended => false,
        }
    }
}

/// Human-readable list used in role rejection messages
pub fn describe_roles(roles: &[Role]) -> String {
    roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", ")
}
