//! Zulu JRE data from the Azul metadata API.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use metagen_client::{CachedClient, FreshnessStrategy, Provider, ProviderValue};
use metagen_core::Error;

use crate::upstream::azul::{AzulPackage, listing_url, packages_url};
use crate::upstream::parse_url;

/// Fetches one platform's package listing to learn which major Java
/// versions Azul ships, then the latest builds of each major across
/// every platform. Produces `Vec<AzulPackage>`.
pub struct AzulVersions;

#[async_trait]
impl Provider for AzulVersions {
    fn id(&self) -> &'static str {
        "azul-java"
    }

    async fn provide(&self, http: &CachedClient) -> Result<ProviderValue, Error> {
        let listing_url = parse_url(&listing_url())?;
        let listing: Vec<AzulPackage> = http
            .get_cached(&listing_url, "azul-java-windows-versions.json", FreshnessStrategy::ConditionalRequest)
            .await?
            .json()?;

        let majors: BTreeSet<u32> =
            listing.iter().filter_map(|package| package.java_version.first().copied()).collect();
        tracing::debug!("azul ships {} major versions", majors.len());

        let packages = try_join_all(majors.into_iter().map(|major| async move {
            let url = parse_url(&packages_url(major))?;
            let key = format!("azul-java-runtime-{major}.json");
            http.get_cached(&url, &key, FreshnessStrategy::ConditionalRequest)
                .await?
                .json::<Vec<AzulPackage>>()
        }))
        .await?;

        let flat: Vec<AzulPackage> = packages.into_iter().flatten().collect();
        Ok(Arc::new(flat))
    }
}
