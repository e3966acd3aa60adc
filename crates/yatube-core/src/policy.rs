//! Access rules for authored resources.
//!
//! Safe operations are open to everyone. Unsafe operations first require an
//! authenticated principal and then, for an existing object, its authorship.

use crate::domain::{Authored, Principal};
use crate::error::DomainError;

/// Capability requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// List / retrieve.
    Read,
    /// Update / delete.
    Write,
}

/// Reject anonymous callers.
pub fn require_authenticated(principal: Option<&Principal>) -> Result<&Principal, DomainError> {
    principal.ok_or(DomainError::AuthenticationRequired)
}

/// Object-level check: reading is always allowed, writing only for the author.
pub fn authorize<R: Authored>(
    principal: Option<&Principal>,
    access: Access,
    resource: &R,
) -> Result<(), DomainError> {
    if access == Access::Read {
        return Ok(());
    }

    let principal = require_authenticated(principal)?;
    if principal.user_id == resource.author_id() {
        Ok(())
    } else {
        tracing::debug!(
            user_id = principal.user_id,
            author_id = resource.author_id(),
            "Write denied to non-author"
        );
        Err(DomainError::PermissionDenied)
    }
}
