// security/src/lib.rs
//! Who may do what to which clinic record.
//!
//! Three pieces, evaluated in this order for every request:
//! [`classify`] maps the caller onto a [`Role`](models::Role), [`is_owner`]
//! decides ownership of the already-fetched record, and
//! [`PolicyTable::authorize`] combines both into a [`Decision`].

pub mod ownership;
pub mod policy;
pub mod roles;

pub use ownership::{is_owner, is_subject, scope_owned_by, Scope};
pub use policy::{Access, Decision, Operation, PolicyEntry, PolicyFile, PolicyTable, Rule};
pub use roles::{classify, Caller};
