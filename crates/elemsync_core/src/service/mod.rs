//! Use-case services over the sync pipeline.
//!
//! # Responsibility
//! - Wire remote client, adapter definition and config into fetch/deploy
//!   entry points.
//! - Keep callers free of pipeline assembly details.

pub mod sync_service;
