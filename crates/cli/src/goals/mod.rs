//! Goals: one per generated package.

pub mod fabric;
pub mod java;
pub mod minecraft;
pub mod neoforge;
