//! Game version data from Mojang's piston-meta service.

use async_trait::async_trait;
use futures::future::try_join_all;
use metagen_client::{
    CachedClient, DigestAlgorithm, ExpectedDigest, FreshnessStrategy, Provider, ProviderValue,
};
use metagen_core::Error;
use std::sync::Arc;

use crate::upstream::parse_url;
use crate::upstream::piston::{
    JAVA_RUNTIME_URL, PistonJavaRuntimes, PistonVersion, VERSION_MANIFEST_URL, VersionManifest,
};

/// Fetches the version manifest and every full version document it
/// lists. Produces `Vec<PistonVersion>` in manifest order (newest
/// first).
///
/// The manifest is revalidated conditionally; the per-version documents
/// carry their SHA-1 in the manifest, so they revalidate by local
/// digest comparison without any network traffic while unchanged.
pub struct GameVersions;

#[async_trait]
impl Provider for GameVersions {
    fn id(&self) -> &'static str {
        "game-versions"
    }

    async fn provide(&self, http: &CachedClient) -> Result<ProviderValue, Error> {
        let manifest_url = parse_url(VERSION_MANIFEST_URL)?;
        let manifest: VersionManifest = http
            .get_cached(&manifest_url, "version_manifest_v2.json", FreshnessStrategy::ConditionalRequest)
            .await?
            .json()?;
        tracing::debug!("manifest lists {} game versions", manifest.versions.len());

        let versions: Vec<PistonVersion> = try_join_all(manifest.versions.iter().map(|listed| async {
            let url = parse_url(&listed.url)?;
            let strategy = FreshnessStrategy::CompareLocalDigest {
                algorithm: DigestAlgorithm::Sha1,
                expected: ExpectedDigest::Hex(listed.sha1.clone()),
            };
            http.get_cached(&url, &format!("{}.json", listed.id), strategy).await?.json()
        }))
        .await?;

        Ok(Arc::new(versions))
    }
}

/// Fetches the Java runtime catalog covering every platform Mojang
/// publishes runtimes for. Produces [`PistonJavaRuntimes`].
pub struct JavaRuntimes;

#[async_trait]
impl Provider for JavaRuntimes {
    fn id(&self) -> &'static str {
        "mojang-java"
    }

    async fn provide(&self, http: &CachedClient) -> Result<ProviderValue, Error> {
        let url = parse_url(JAVA_RUNTIME_URL)?;
        let runtimes: PistonJavaRuntimes = http
            .get_cached(&url, "mojang-java-runtime-all.json", FreshnessStrategy::ConditionalRequest)
            .await?
            .json()?;
        tracing::debug!("{} runtime platforms listed", runtimes.len());

        Ok(Arc::new(runtimes))
    }
}
