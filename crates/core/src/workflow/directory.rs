//! External directory seams for approver resolution.
//!
//! Role and user administration are owned by the permission module; the
//! engine only ever reads through these traits. Lookups tolerate
//! staleness: a role holder added after resolution is never retroactively
//! substituted into an already-materialized step.

use acumen_shared::types::UserId;

/// Read access to role membership.
pub trait RoleDirectory: Send + Sync {
    /// Active, non-deleted holders of a role code. Order is not
    /// meaningful; the resolver applies its own deterministic tie-break.
    fn lookup(&self, role_code: &str) -> Vec<UserId>;
}

/// Read access to user existence.
pub trait UserDirectory: Send + Sync {
    /// Returns true if the user exists and is active.
    fn exists(&self, user: UserId) -> bool;
}
