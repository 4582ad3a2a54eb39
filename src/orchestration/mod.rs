//! Orchestration layer for DOI publishing
//!
//! This module provides the high-level workflow that drives the deposition
//! API from draft creation to a published record.

pub mod doi_publisher;

// Re-export main types for convenience
pub use doi_publisher::DoiPublisher;
