//! API constants

/// Versioned prefix of every product route
pub const API_PREFIX: &str = "/api/v1";
