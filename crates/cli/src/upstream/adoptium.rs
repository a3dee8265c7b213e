//! Eclipse Adoptium (Temurin) API schemas.

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const ADOPTIUM_API_URL: &str = "https://api.adoptium.net/v3/";

pub fn available_releases_url() -> String {
    format!("{ADOPTIUM_API_URL}info/available_releases")
}

/// General-access JRE builds of one feature release.
pub fn feature_release_url(major: u32) -> String {
    format!("{ADOPTIUM_API_URL}assets/feature_releases/{major}/ga?image_type=jre")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptiumReleases {
    pub available_releases: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptiumRelease {
    pub binaries: Vec<AdoptiumBinary>,
    pub vendor: String,
    pub timestamp: DateTime<Utc>,
    pub version_data: AdoptiumVersionData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptiumVersionData {
    pub major: u32,
    pub minor: u32,
    pub security: u32,
    pub build: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptiumBinary {
    pub architecture: String,
    pub image_type: String,
    pub os: String,
    pub package: AdoptiumPackage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptiumPackage {
    pub checksum: String,
    pub link: String,
}
