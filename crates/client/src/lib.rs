//! HTTP fetching layer for metagen.
//!
//! This crate provides:
//! - A disk-cached HTTP client with pluggable revalidation strategies
//! - Partial extraction of remote zip archives via range requests
//! - The provider/goal traits the runner schedules

pub mod archive;
pub mod fetch;
pub mod unit;

pub use fetch::{
    ArchiveRequest, CachedClient, ClientOptions, DigestAlgorithm, ExpectedDigest, FreshnessStrategy,
    Metadata, Response,
};
pub use unit::{Goal, Provider, ProviderValue, dep_data};
