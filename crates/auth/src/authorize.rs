use stockroom_core::DomainError;

use crate::{Actor, Operation, Role};

/// Check an actor against the role an operation requires.
///
/// Matching is exact: a manager does not pass a stocker check. On denial a
/// warning naming the actor, its role and the required role is emitted; the
/// caller decides whether to abort.
///
/// - No IO
/// - No panics
pub fn authorize(actor: &Actor, required: Role) -> bool {
    if actor.role == required {
        return true;
    }

    tracing::warn!(
        actor = %actor.name,
        role = %actor.role,
        required = %required,
        "access denied: {} (role: {}) requires role {}",
        actor.name,
        actor.role,
        required,
    );
    false
}

/// [`authorize`], surfaced as a domain error.
pub fn require(actor: &Actor, required: Role) -> Result<(), DomainError> {
    if authorize(actor, required) {
        Ok(())
    } else {
        Err(DomainError::PermissionDenied {
            actor: actor.name.clone(),
            role: actor.role.to_string(),
            required: required.to_string(),
        })
    }
}

/// Gate an operation using the static role table.
pub fn require_for(actor: &Actor, operation: Operation) -> Result<(), DomainError> {
    match operation.required_role() {
        Some(required) => require(actor, required),
        None => Ok(()),
    }
}
