//! The `net.minecraft` package: one record per game version.

use std::sync::Arc;

use metagen_client::{Goal, Provider, ProviderValue, dep_data};
use metagen_core::Error;
use metagen_core::format::{AssetIndexRef, Library, LibraryDownloads, VersionOutput};

use crate::providers::mojang::GameVersions;
use crate::upstream::piston::{PistonVersion, flatten_arguments, into_artifact, into_library};

const LAUNCHWRAPPER_CLASS_PREFIX: &str = "net.minecraft.launchwrapper.";
const LEGACY_LAUNCH_TRAIT: &str = "legacyLaunch";

pub struct Minecraft {
    game_versions: Arc<GameVersions>,
}

impl Minecraft {
    pub fn new(game_versions: Arc<GameVersions>) -> Self {
        Self { game_versions }
    }
}

impl Goal for Minecraft {
    fn id(&self) -> &'static str {
        "net.minecraft"
    }

    fn name(&self) -> &'static str {
        "Minecraft"
    }

    fn deps(&self) -> Vec<Arc<dyn Provider>> {
        vec![self.game_versions.clone()]
    }

    fn generate(&self, data: &[ProviderValue]) -> Result<Vec<VersionOutput>, Error> {
        let versions = dep_data::<Vec<PistonVersion>>(self.id(), data, 0)?;
        versions.iter().map(transform_version).collect()
    }

    fn recommend(&self, first: bool, version: &VersionOutput) -> bool {
        first && version.kind.as_deref() == Some("release")
    }
}

fn transform_version(version: &PistonVersion) -> Result<VersionOutput, Error> {
    let mut traits = Vec::new();
    let mut main_class = version.main_class.clone();

    // Ancient versions launch through launchwrapper; launchers carry
    // their own, so the record gets a trait instead of a main class.
    if main_class.as_deref().is_some_and(|c| c.starts_with(LAUNCHWRAPPER_CLASS_PREFIX)) {
        main_class = None;
        traits.push(LEGACY_LAUNCH_TRAIT.to_string());
    }

    let minecraft_arguments = version
        .minecraft_arguments
        .clone()
        .or_else(|| version.arguments.as_ref().and_then(|args| flatten_arguments(&args.game)))
        .ok_or_else(|| {
            Error::Validation(format!(
                "version '{}' has neither minecraftArguments nor arguments.game",
                version.id
            ))
        })?;

    Ok(VersionOutput {
        version: version.id.clone(),
        release_time: version.release_time,
        kind: Some(version.kind.clone()),
        traits,
        compatible_java_majors: version.java_version.iter().map(|j| j.major_version).collect(),
        compatible_java_name: version.java_version.as_ref().map(|j| j.component.clone()),
        main_class,
        minecraft_arguments: Some(minecraft_arguments),
        main_jar: Some(Library {
            name: format!("com.mojang:minecraft:{}:client", version.id),
            url: None,
            downloads: Some(LibraryDownloads {
                artifact: Some(into_artifact(&version.downloads.client)),
            }),
        }),
        asset_index: version.asset_index.as_ref().map(|index| AssetIndexRef {
            id: index.id.clone(),
            url: index.url.clone(),
            sha1: index.sha1.clone(),
            size: index.size,
            total_size: index.total_size,
        }),
        libraries: version.libraries.iter().map(into_library).collect(),
        ..VersionOutput::default()
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::upstream::piston::{PistonArtifact, PistonDownloads};

    use super::*;

    fn version(id: &str, kind: &str) -> PistonVersion {
        PistonVersion {
            id: id.into(),
            kind: kind.into(),
            release_time: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
            main_class: Some("net.minecraft.client.main.Main".into()),
            minecraft_arguments: Some("--username ${auth_player_name}".into()),
            arguments: None,
            java_version: None,
            downloads: PistonDownloads {
                client: PistonArtifact {
                    url: "https://example.com/client.jar".into(),
                    sha1: "da39a3ee5e6b4b0d3255bfef95601890afd80709".into(),
                    size: 100,
                },
            },
            asset_index: None,
            libraries: vec![],
        }
    }

    #[test]
    fn test_transform_builds_main_jar() {
        let output = transform_version(&version("1.8.9", "release")).unwrap();
        assert_eq!(output.version, "1.8.9");
        assert_eq!(output.kind.as_deref(), Some("release"));
        let jar = output.main_jar.unwrap();
        assert_eq!(jar.name, "com.mojang:minecraft:1.8.9:client");
        assert_eq!(jar.downloads.unwrap().artifact.unwrap().size, 100);
    }

    #[test]
    fn test_launchwrapper_main_class_becomes_trait() {
        let mut raw = version("1.5.2", "release");
        raw.main_class = Some("net.minecraft.launchwrapper.Launch".into());
        let output = transform_version(&raw).unwrap();
        assert_eq!(output.main_class, None);
        assert_eq!(output.traits, ["legacyLaunch"]);
    }

    #[test]
    fn test_missing_arguments_is_validation_error() {
        let mut raw = version("broken", "release");
        raw.minecraft_arguments = None;
        let err = transform_version(&raw).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_recommend_first_release_only() {
        let goal = Minecraft::new(Arc::new(GameVersions));
        let snapshot = transform_version(&version("24w14a", "snapshot")).unwrap();
        let release = transform_version(&version("1.21", "release")).unwrap();

        assert!(!goal.recommend(true, &snapshot));
        assert!(goal.recommend(true, &release));
        assert!(!goal.recommend(false, &release));
    }
}
