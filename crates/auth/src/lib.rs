//! `stockroom-auth`: role-based permission gate.
//!
//! This crate is intentionally decoupled from storage: it only answers whether
//! an actor may perform an operation.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{authorize, require, require_for};
pub use permissions::Operation;
pub use principal::Actor;
pub use roles::{Role, RoleDescriptor};
