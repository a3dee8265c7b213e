//! Temurin JRE data from the Adoptium API.

use async_trait::async_trait;
use futures::future::try_join_all;
use metagen_client::{CachedClient, FreshnessStrategy, Provider, ProviderValue};
use metagen_core::Error;
use std::sync::Arc;

use crate::upstream::adoptium::{
    AdoptiumRelease, AdoptiumReleases, available_releases_url, feature_release_url,
};
use crate::upstream::parse_url;

/// Fetches the list of feature releases, then the general-access JRE
/// builds of each. Produces `Vec<AdoptiumRelease>`.
///
/// Some listed releases never ship a GA JRE; those queries fail with a
/// 404 and the release is skipped rather than failing the provider.
pub struct AdoptiumVersions;

#[async_trait]
impl Provider for AdoptiumVersions {
    fn id(&self) -> &'static str {
        "adoptium-java"
    }

    async fn provide(&self, http: &CachedClient) -> Result<ProviderValue, Error> {
        let releases_url = parse_url(&available_releases_url())?;
        let releases: AdoptiumReleases = http
            .get_cached(&releases_url, "available-releases.json", FreshnessStrategy::ConditionalRequest)
            .await?
            .json()?;
        tracing::debug!("{} feature releases listed", releases.available_releases.len());

        let builds = try_join_all(releases.available_releases.iter().map(|&major| async move {
            let url = parse_url(&feature_release_url(major))?;
            let key = format!("adoptium-java-runtime-{major}.json");
            match http.get_cached(&url, &key, FreshnessStrategy::ConditionalRequest).await {
                Ok(response) => response.json::<Vec<AdoptiumRelease>>(),
                Err(err) => {
                    tracing::error!("no general-access Temurin JRE {major}: {err}");
                    Ok(Vec::new())
                }
            }
        }))
        .await?;

        let flat: Vec<AdoptiumRelease> = builds.into_iter().flatten().collect();
        Ok(Arc::new(flat))
    }
}
