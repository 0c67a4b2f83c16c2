//! npm lockfile bulk audit.
//!
//! Extracts a de-duplicated `(name, version)` set from a `package-lock.json`,
//! submits it to an npm-compatible bulk advisory endpoint and normalizes the
//! response into [`Advisory`] records.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`BulkAuditError`)
//! - [`config`]: Module configuration (`BulkAuditConfig`, builder)
//! - [`lockfile`]: Dependency tree walker (`LockfileWalker`, `DependencyFilter`, `DependencyMap`)
//! - [`payload`]: Wire payload encoding
//! - [`cvss`]: CVSS v3 vector value object (`CvssV3`)
//! - [`advisory`]: Normalized advisory record (`Advisory`)
//! - [`response`]: Response parser (`AdvisoryResponseParser`)
//! - [`transport`]: Transport boundary (`AuditTransport`, `HttpTransport`)
//! - [`client`]: Orchestrator (`BulkAuditClient`, `AuditReport`)
//!
//! # Architecture
//!
//! ```text
//! lockfile JSON --> LockfileWalker --> DependencyMap --> payload::encode
//!                                                             |
//!                                                       AuditTransport
//!                                                             |
//!                        Vec<Advisory> <-- AdvisoryResponseParser <-- response JSON
//! ```
//!
//! Required fields fail hard (`SchemaViolation`); optional enrichment fields
//! (CVSS score and vector) degrade to `None` without dropping the advisory.

pub mod advisory;
pub mod client;
pub mod config;
pub mod cvss;
pub mod error;
pub mod lockfile;
pub mod payload;
pub mod response;
pub mod transport;

// --- Public API Re-exports ---

// Client (main orchestrator)
pub use client::{AuditReport, BulkAuditClient, SeverityCounts};

// Configuration
pub use config::{BulkAuditConfig, BulkAuditConfigBuilder};

// Error
pub use error::BulkAuditError;

// Lockfile walking
pub use lockfile::{
    DependencyFilter, DependencyMap, KnownNoiseFilter, LockfileWalker, MAX_TREE_DEPTH, TreeShape,
    collect_dependencies, package_name_from_key, schema_version,
};

// Advisories
pub use advisory::Advisory;
pub use cvss::{CvssError, CvssSeverity, CvssV3};
pub use response::AdvisoryResponseParser;

// Transport
pub use transport::{AuditTransport, HttpTransport};
