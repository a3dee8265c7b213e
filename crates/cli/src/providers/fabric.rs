//! Intermediary mappings data from the Fabric meta service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use metagen_client::{CachedClient, FreshnessStrategy, Provider, ProviderValue};
use metagen_core::Error;
use std::sync::Arc;

use crate::upstream::fabric::{FABRIC_MAVEN_URL, INTERMEDIARY_VERSIONS_URL, IntermediaryVersion, maven_jar_url};
use crate::upstream::parse_url;

/// An intermediary version stamped with its jar's publication time.
#[derive(Debug, Clone)]
pub struct StampedIntermediary {
    pub version: String,
    pub maven: String,
    pub last_modified: DateTime<Utc>,
}

/// Fetches the intermediary version listing and stamps each entry with
/// the `Last-Modified` time of its published jar, probed with `HEAD`.
/// Produces `Vec<StampedIntermediary>`.
///
/// Published jars never change, so a probe is never repeated once its
/// validators are cached.
pub struct IntermediaryVersions;

#[async_trait]
impl Provider for IntermediaryVersions {
    fn id(&self) -> &'static str {
        "fabric-intermediary-versions"
    }

    async fn provide(&self, http: &CachedClient) -> Result<ProviderValue, Error> {
        let listing_url = parse_url(INTERMEDIARY_VERSIONS_URL)?;
        let listing: Vec<IntermediaryVersion> = http
            .get_cached(&listing_url, "intermediary-versions.json", FreshnessStrategy::ConditionalRequest)
            .await?
            .json()?;
        tracing::debug!("{} intermediary versions listed", listing.len());

        let stamped = try_join_all(listing.into_iter().map(|listed| async move {
            let jar_url = maven_jar_url(FABRIC_MAVEN_URL, &listed.maven)?;
            let metadata = http.head_cached(&jar_url, &format!("{}.jar", listed.version)).await?;
            let last_modified = metadata.last_modified.ok_or_else(|| {
                Error::Validation(format!("no Last-Modified header for '{jar_url}'"))
            })?;
            Ok::<_, Error>(StampedIntermediary {
                version: listed.version,
                maven: listed.maven,
                last_modified,
            })
        }))
        .await?;

        Ok(Arc::new(stamped))
    }
}
