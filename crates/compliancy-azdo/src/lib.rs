//! Compliancy-Azdo: Azure DevOps REST integration
//!
//! HTTP implementation of the gate's DevOps lookups and of the
//! classification snapshot store (extension data documents).
//!
//! ## Layer 2 - Integration
//!
//! Retries are not performed here; every request is bounded by the
//! configured timeout.

mod client;
pub mod config;
pub mod endpoints;

pub use client::AzdoClient;
pub use config::AzdoConfig;
