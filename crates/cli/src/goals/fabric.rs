//! The `net.fabricmc.intermediary` package: one volatile record per
//! intermediary mappings version, pinned to its game version.

use std::sync::Arc;

use metagen_client::{Goal, Provider, ProviderValue, dep_data};
use metagen_core::Error;
use metagen_core::format::{Dependency, Library, VersionOutput};

use crate::providers::fabric::{IntermediaryVersions, StampedIntermediary};
use crate::upstream::fabric::FABRIC_MAVEN_URL;

pub struct FabricIntermediary {
    versions: Arc<IntermediaryVersions>,
}

impl FabricIntermediary {
    pub fn new(versions: Arc<IntermediaryVersions>) -> Self {
        Self { versions }
    }
}

impl Goal for FabricIntermediary {
    fn id(&self) -> &'static str {
        "net.fabricmc.intermediary"
    }

    fn name(&self) -> &'static str {
        "Fabric Intermediary"
    }

    fn deps(&self) -> Vec<Arc<dyn Provider>> {
        vec![self.versions.clone()]
    }

    fn generate(&self, data: &[ProviderValue]) -> Result<Vec<VersionOutput>, Error> {
        let versions = dep_data::<Vec<StampedIntermediary>>(self.id(), data, 0)?;
        Ok(versions.iter().map(transform_version).collect())
    }

    fn recommend(&self, _first: bool, _version: &VersionOutput) -> bool {
        // every mappings version is the right one for its game version
        true
    }
}

fn transform_version(version: &StampedIntermediary) -> VersionOutput {
    VersionOutput {
        version: version.version.clone(),
        release_time: version.last_modified,
        kind: Some("release".into()),
        volatile: true,
        requires: vec![Dependency {
            uid: "net.minecraft".into(),
            equals: Some(version.version.clone()),
            suggests: None,
        }],
        libraries: vec![Library {
            name: version.maven.clone(),
            url: Some(FABRIC_MAVEN_URL.into()),
            downloads: None,
        }],
        ..VersionOutput::default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_record_is_volatile_and_pinned() {
        let stamped = StampedIntermediary {
            version: "1.21".into(),
            maven: "net.fabricmc:intermediary:1.21".into(),
            last_modified: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        let output = transform_version(&stamped);

        assert!(output.volatile);
        assert_eq!(output.release_time, stamped.last_modified);
        assert_eq!(output.requires[0].uid, "net.minecraft");
        assert_eq!(output.requires[0].equals.as_deref(), Some("1.21"));
        assert_eq!(output.libraries[0].name, "net.fabricmc:intermediary:1.21");
        assert_eq!(output.libraries[0].url.as_deref(), Some(FABRIC_MAVEN_URL));
    }
}
