//! Loader version data from the NeoForge maven repository.

use async_trait::async_trait;
use futures::future::try_join_all;
use metagen_client::{ArchiveRequest, CachedClient, FreshnessStrategy, Provider, ProviderValue};
use metagen_core::Error;
use std::sync::Arc;

use crate::upstream::neoforge::{
    InstallProfile, InstallerVersion, LOADER_VERSIONS_URL, MavenVersionListing, installer_url,
};
use crate::upstream::parse_url;

/// One loader version with the two metadata documents extracted from
/// its installer jar.
#[derive(Debug, Clone)]
pub struct LoaderVersion {
    pub version: String,
    pub data: InstallerVersion,
    pub install_profile: InstallProfile,
}

/// Fetches the loader version listing, then pulls `version.json` and
/// `install_profile.json` out of each installer jar via range requests
/// instead of downloading whole installers. Produces
/// `Vec<LoaderVersion>`.
pub struct LoaderVersions;

#[async_trait]
impl Provider for LoaderVersions {
    fn id(&self) -> &'static str {
        "neoforge-loader-versions"
    }

    async fn provide(&self, http: &CachedClient) -> Result<ProviderValue, Error> {
        let listing_url = parse_url(LOADER_VERSIONS_URL)?;
        let listing: MavenVersionListing = http
            .get_cached(&listing_url, "neoforge-versions.json", FreshnessStrategy::ConditionalRequest)
            .await?
            .json()?;
        tracing::debug!("{} loader versions listed", listing.versions.len());

        let loaders = try_join_all(listing.versions.into_iter().map(|version| async move {
            let url = installer_url(&version)?;
            let files = [
                ArchiveRequest {
                    path: "version.json".into(),
                    key: format!("{version}-version.json"),
                },
                ArchiveRequest {
                    path: "install_profile.json".into(),
                    key: format!("{version}-install-profile.json"),
                },
            ];
            let mut contents = http.unzip_cached(&url, &files).await?;

            let install_profile = contents
                .pop()
                .flatten()
                .ok_or_else(|| missing(&version, "install_profile.json"))?;
            let data = contents.pop().flatten().ok_or_else(|| missing(&version, "version.json"))?;

            Ok::<_, Error>(LoaderVersion {
                data: serde_json::from_str(&data)?,
                install_profile: serde_json::from_str(&install_profile)?,
                version,
            })
        }))
        .await?;

        Ok(Arc::new(loaders))
    }
}

fn missing(version: &str, path: &str) -> Error {
    Error::Validation(format!("installer for '{version}' does not contain '{path}'"))
}
