// Error codes implementation
// Stable error codes surfaced in `Outcome::code` and in log fields.

pub mod not_found {
    pub const ENTITY_NOT_FOUND: &str = "NOT_FOUND_1001";
    pub const COLLABORATOR_NOT_FOUND: &str = "NOT_FOUND_1002";
}

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_2001";
    pub const INVALID_FORMAT: &str = "VALIDATION_2002";
    pub const DUPLICATE_ENTITY: &str = "VALIDATION_2003";
    pub const PERMISSION_DENIED: &str = "VALIDATION_2004";
}

pub mod persistence {
    pub const STORE_FAILED: &str = "STORE_4001";
    pub const CACHE_FAILED: &str = "STORE_4002";
    pub const NETWORK_FAILED: &str = "STORE_4003";
}

pub mod invariant {
    pub const OWNER_INVARIANT: &str = "INVARIANT_5001";
}

pub mod internal {
    pub const INTERNAL: &str = "INTERNAL_9001";
}
