//! Canonical element model for remote admin objects.
//!
//! # Responsibility
//! - Define the schema-conformant local shape of one remote object.
//! - Define the change values consumed by the deploy path.
//!
//! # Invariants
//! - Every instance field is declared by its type's `FieldSchema`.
//! - Instance identity (`ElemId`) is derived deterministically from data.

pub mod change;
pub mod elem_id;
pub mod instance;
pub mod schema;
