//! Role names carried in access tokens.

/// Operators: manual matches, scheduler triggers.
pub const ROLE_ADMIN: &str = "admin";

/// Machine clients such as the similarity service pushing match results.
pub const ROLE_SERVICE: &str = "service";

/// Regular reporters and claimants.
pub const ROLE_USER: &str = "user";
