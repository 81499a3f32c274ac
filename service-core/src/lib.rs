//! service-core: Shared infrastructure for the community platform services.
pub mod config;
pub mod error;
pub mod observability;
