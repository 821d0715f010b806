//! Vendor adapter definitions.
//!
//! # Responsibility
//! - Declare per-type schemas, structural rules and edge policies per vendor.
//! - Provide field-group deployers for the vendor write APIs.
//!
//! # Invariants
//! - Definitions are immutable after construction; rules are data, not
//!   inline conditionals in the pipeline.

pub mod definition;
pub mod jira;
pub mod netsuite;
pub mod registry;
pub mod salesforce;
