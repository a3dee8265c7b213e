//! Core types and shared functionality for metagen.
//!
//! This crate provides:
//! - Disk-backed content cache with per-key exclusive access
//! - Unified error types
//! - Configuration structures
//! - The v1 output format data model

pub mod cache;
pub mod config;
pub mod error;
pub mod format;

pub use cache::{CacheBody, CacheEntry, CacheRef, CacheUpdate, DiskCache};
pub use config::AppConfig;
pub use error::Error;
