//! NeoForge maven API schemas.

use chrono::{DateTime, Utc};
use metagen_core::Error;
use serde::Deserialize;
use url::Url;

use super::parse_url;
use super::piston::{PistonArguments, PistonLibrary};

pub const NEOFORGE_MAVEN_URL: &str = "https://maven.neoforged.net/releases/";
pub const LOADER_VERSIONS_URL: &str =
    "https://maven.neoforged.net/api/maven/versions/releases/net/neoforged/neoforge";

/// Response of the maven repository's version-listing API.
#[derive(Debug, Clone, Deserialize)]
pub struct MavenVersionListing {
    #[serde(default)]
    pub versions: Vec<String>,
}

/// The `version.json` document packed into an installer jar. Shares the
/// piston-meta argument and library shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallerVersion {
    pub inherits_from: String,
    pub release_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub arguments: Option<PistonArguments>,
    #[serde(default)]
    pub libraries: Vec<PistonLibrary>,
}

/// The `install_profile.json` document packed into an installer jar.
/// Only the processor libraries matter for launch metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallProfile {
    #[serde(default)]
    pub libraries: Vec<PistonLibrary>,
}

pub fn installer_url(version: &str) -> Result<Url, Error> {
    parse_url(&format!(
        "{NEOFORGE_MAVEN_URL}net/neoforged/neoforge/{version}/neoforge-{version}-installer.jar"
    ))
}
