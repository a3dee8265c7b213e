//! Providers: one per upstream data source.

pub mod adoptium;
pub mod azul;
pub mod fabric;
pub mod mojang;
pub mod neoforge;
