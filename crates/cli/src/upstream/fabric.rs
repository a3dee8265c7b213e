//! Fabric meta API schemas and maven helpers.

use metagen_core::Error;
use serde::Deserialize;
use url::Url;

use super::parse_url;

pub const INTERMEDIARY_VERSIONS_URL: &str = "https://meta.fabricmc.net/v2/versions/intermediary";
pub const FABRIC_MAVEN_URL: &str = "https://maven.fabricmc.net/";

/// One intermediary-mappings version as listed by the Fabric meta API.
#[derive(Debug, Clone, Deserialize)]
pub struct IntermediaryVersion {
    /// Maven coordinate, `net.fabricmc:intermediary:<game version>`.
    pub maven: String,
    /// The game version the mappings target.
    pub version: String,
    #[serde(default)]
    pub stable: bool,
}

/// Resolve a `group:artifact:version` maven coordinate to the jar URL
/// inside `repository`.
pub fn maven_jar_url(repository: &str, coordinate: &str) -> Result<Url, Error> {
    let mut parts = coordinate.split(':');
    let (Some(group), Some(artifact), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::Validation(format!("malformed maven coordinate '{coordinate}'")));
    };
    let group_path = group.replace('.', "/");
    parse_url(&format!("{repository}{group_path}/{artifact}/{version}/{artifact}-{version}.jar"))
}
