//! Azul Zulu metadata API schemas.

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const AZUL_API_URL: &str = "https://api.azul.com/metadata/v1/";

/// Latest GA JRE per major version, queried for one platform just to
/// learn which major versions exist.
pub fn listing_url() -> String {
    format!(
        "{AZUL_API_URL}zulu/packages?availability=GA&latest=true&os=windows&arch=x64\
         &archive_type=zip&javafx_bundled=false&java_package_type=jre"
    )
}

/// Latest GA JRE builds of one major version across every platform.
pub fn packages_url(major: u32) -> String {
    format!(
        "{AZUL_API_URL}zulu/packages/?java_version={major}&archive_type=zip\
         &java_package_type=jre&latest=true&release_status=ga&javafx_bundled=false\
         &include_fields=sha256_hash,build_date,os,arch,hw_bitness"
    )
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzulPackage {
    pub arch: String,
    pub build_date: DateTime<Utc>,
    pub download_url: String,
    pub hw_bitness: u32,
    /// Three or four components, major first.
    pub java_version: Vec<u32>,
    pub os: String,
    pub product: String,
    pub sha256_hash: String,
}
