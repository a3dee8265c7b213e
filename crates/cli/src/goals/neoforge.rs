//! The `net.neoforged` package: one record per loader version, launched
//! through ForgeWrapper and pinned to the game version it inherits from.

use std::collections::HashMap;
use std::sync::Arc;

use metagen_client::{Goal, Provider, ProviderValue, dep_data};
use metagen_core::Error;
use metagen_core::format::{Artifact, Dependency, Library, LibraryDownloads, VersionOutput};

use crate::providers::mojang::GameVersions;
use crate::providers::neoforge::{LoaderVersion, LoaderVersions};
use crate::upstream::neoforge::NEOFORGE_MAVEN_URL;
use crate::upstream::piston::{PistonVersion, flatten_arguments, into_library};

const FORGEWRAPPER_MAIN_CLASS: &str = "io.github.zekerzhayard.forgewrapper.installer.Main";

/// NeoForge's first releases versioned themselves `1.20.1-<loader>`
/// before the scheme settled on bare loader versions.
const LEGACY_VERSION_PREFIX: &str = "1.20.1-";

fn forgewrapper() -> Library {
    Library {
        name: "io.github.zekerzhayard:ForgeWrapper:prism-2025-12-07".into(),
        url: None,
        downloads: Some(LibraryDownloads {
            artifact: Some(Artifact {
                url: "https://files.prismlauncher.org/maven/io/github/zekerzhayard/ForgeWrapper/prism-2025-12-07/ForgeWrapper-prism-2025-12-07.jar".into(),
                sha1: "4c4653d80409e7e968d3e3209196ffae778b7b4e".into(),
                size: 29731,
            }),
        }),
    }
}

pub struct NeoForge {
    loader_versions: Arc<LoaderVersions>,
    game_versions: Arc<GameVersions>,
}

impl NeoForge {
    pub fn new(loader_versions: Arc<LoaderVersions>, game_versions: Arc<GameVersions>) -> Self {
        Self { loader_versions, game_versions }
    }
}

impl Goal for NeoForge {
    fn id(&self) -> &'static str {
        "net.neoforged"
    }

    fn name(&self) -> &'static str {
        "NeoForge"
    }

    fn deps(&self) -> Vec<Arc<dyn Provider>> {
        vec![self.loader_versions.clone(), self.game_versions.clone()]
    }

    fn generate(&self, data: &[ProviderValue]) -> Result<Vec<VersionOutput>, Error> {
        let loaders = dep_data::<Vec<LoaderVersion>>(self.id(), data, 0)?;
        let game_versions = dep_data::<Vec<PistonVersion>>(self.id(), data, 1)?;

        let by_id: HashMap<&str, &PistonVersion> =
            game_versions.iter().map(|version| (version.id.as_str(), version)).collect();

        Ok(loaders.iter().map(|loader| transform_version(loader, &by_id)).collect())
    }

    fn recommend(&self, first: bool, version: &VersionOutput) -> bool {
        first && version.kind.as_deref() == Some("release")
    }
}

fn transform_version(loader: &LoaderVersion, game_versions: &HashMap<&str, &PistonVersion>) -> VersionOutput {
    let data = &loader.data;

    // A loader's own arguments extend the inherited game version's, so
    // prepend the base arguments when the loader declares any.
    let minecraft_arguments = data.arguments.as_ref().and_then(|own| {
        let base = game_versions
            .get(data.inherits_from.as_str())
            .and_then(|game| game.arguments.as_ref())
            .map(|args| args.game.as_slice())
            .unwrap_or_default();
        let combined: Vec<serde_json::Value> = base.iter().chain(&own.game).cloned().collect();
        flatten_arguments(&combined)
    });

    let version = loader
        .version
        .strip_prefix(LEGACY_VERSION_PREFIX)
        .unwrap_or(&loader.version)
        .to_string();

    VersionOutput {
        version,
        release_time: data.release_time,
        kind: Some(data.kind.clone()),
        requires: vec![Dependency {
            uid: "net.minecraft".into(),
            equals: Some(data.inherits_from.clone()),
            suggests: None,
        }],
        main_class: Some(FORGEWRAPPER_MAIN_CLASS.into()),
        minecraft_arguments,
        libraries: std::iter::once(forgewrapper())
            .chain(data.libraries.iter().map(into_library))
            .collect(),
        maven_files: std::iter::once(Library {
            name: format!("net.neoforged:neoforge:{}:installer", loader.version),
            url: Some(NEOFORGE_MAVEN_URL.into()),
            downloads: None,
        })
        .chain(loader.install_profile.libraries.iter().map(into_library))
        .collect(),
        ..VersionOutput::default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::upstream::neoforge::{InstallProfile, InstallerVersion};
    use crate::upstream::piston::PistonArguments;

    use super::*;

    fn loader(version: &str, inherits_from: &str) -> LoaderVersion {
        LoaderVersion {
            version: version.into(),
            data: InstallerVersion {
                inherits_from: inherits_from.into(),
                release_time: Utc.timestamp_opt(1_724_264_732, 0).unwrap(),
                kind: "release".into(),
                main_class: Some("cpw.mods.bootstraplauncher.BootstrapLauncher".into()),
                arguments: Some(PistonArguments {
                    game: vec![serde_json::json!("--fml.neoForgeVersion"), serde_json::json!("21.1.77")],
                }),
                libraries: vec![],
            },
            install_profile: InstallProfile { libraries: vec![] },
        }
    }

    #[test]
    fn test_record_requires_inherited_game_version() {
        let output = transform_version(&loader("21.1.77", "1.21.1"), &HashMap::new());

        assert_eq!(output.version, "21.1.77");
        assert_eq!(output.requires[0].equals.as_deref(), Some("1.21.1"));
        assert_eq!(output.main_class.as_deref(), Some(FORGEWRAPPER_MAIN_CLASS));
        assert_eq!(output.libraries[0].name, forgewrapper().name);
        assert_eq!(output.maven_files[0].name, "net.neoforged:neoforge:21.1.77:installer");
    }

    #[test]
    fn test_legacy_prefix_stripped_from_version_only() {
        let output = transform_version(&loader("1.20.1-47.1.54", "1.20.1"), &HashMap::new());

        assert_eq!(output.version, "47.1.54");
        // the installer coordinate keeps the raw version
        assert_eq!(output.maven_files[0].name, "net.neoforged:neoforge:1.20.1-47.1.54:installer");
    }

    fn game_version(id: &str) -> PistonVersion {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": "release",
            "releaseTime": "2024-08-08T12:24:45+00:00",
            "arguments": {"game": ["--base"]},
            "downloads": {"client": {
                "url": "https://example.com/client.jar",
                "sha1": "da39a3ee5e6b4b0d3255bfef95601890afd80709",
                "size": 1
            }}
        }))
        .unwrap()
    }

    #[test]
    fn test_arguments_prepend_inherited_base() {
        let game = game_version("1.21.1");
        let by_id = HashMap::from([("1.21.1", &game)]);

        let output = transform_version(&loader("21.1.77", "1.21.1"), &by_id);
        assert_eq!(
            output.minecraft_arguments.as_deref(),
            Some("--base --fml.neoForgeVersion 21.1.77")
        );
    }
}
