//! Fetch and deploy pipeline.
//!
//! # Responsibility
//! - Normalize untrusted remote payloads into canonical instances.
//! - Guard remote responses before any field is read.
//! - Deploy changes and verify convergence with bounded retry.
//!
//! # Invariants
//! - No process-wide mutable state; every call carries its own arguments.
//! - Only verification mismatches are retried.

pub mod client;
pub mod deploy;
pub mod guard;
pub mod list_policy;
pub mod naming;
pub mod normalize;
pub mod reference;
