//! Mojang piston-meta API schemas.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use metagen_core::format::{Artifact, Library, LibraryDownloads, RuntimeVersion};
use serde::Deserialize;

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

pub const JAVA_RUNTIME_URL: &str =
    "https://piston-meta.mojang.com/v1/products/java-runtime/2ec0cc96c44e5a76b9c8b7c39df7210883d12871/all.json";

/// The top-level version manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<ManifestVersion>,
}

/// One line of the version manifest: where the full version document
/// lives and the digest it must hash to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestVersion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub sha1: String,
    pub release_time: DateTime<Utc>,
}

/// A full per-version document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PistonVersion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub release_time: DateTime<Utc>,
    #[serde(default)]
    pub main_class: Option<String>,
    /// Pre-1.13 launch arguments as a single string.
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    /// Post-1.13 structured launch arguments.
    #[serde(default)]
    pub arguments: Option<PistonArguments>,
    #[serde(default)]
    pub java_version: Option<PistonJavaVersion>,
    pub downloads: PistonDownloads,
    #[serde(default)]
    pub asset_index: Option<PistonAssetIndex>,
    #[serde(default)]
    pub libraries: Vec<PistonLibrary>,
}

/// Structured launch arguments. Entries are either plain strings or
/// rule-guarded objects; only the plain strings apply unconditionally.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PistonArguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PistonJavaVersion {
    pub component: String,
    pub major_version: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PistonDownloads {
    pub client: PistonArtifact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PistonArtifact {
    pub url: String,
    pub sha1: String,
    pub size: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PistonAssetIndex {
    pub id: String,
    pub url: String,
    pub sha1: String,
    pub size: u64,
    pub total_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PistonLibrary {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub downloads: Option<PistonLibraryDownloads>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PistonLibraryDownloads {
    #[serde(default)]
    pub artifact: Option<PistonArtifact>,
}

/// The Java runtime catalog: platform name → runtime component name →
/// published builds. Many combinations are empty lists.
pub type PistonJavaRuntimes = BTreeMap<String, BTreeMap<String, Vec<PistonJavaEntry>>>;

#[derive(Debug, Clone, Deserialize)]
pub struct PistonJavaEntry {
    pub manifest: PistonArtifact,
    pub version: PistonJavaBuild,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PistonJavaBuild {
    pub name: String,
    pub released: DateTime<Utc>,
}

/// Parse a runtime build name into its numeric components. Handles the
/// dotted form (`17.0.1.12`, trailing text ignored) and the 8-era form
/// (`8u202b08`).
pub fn parse_java_version(name: &str) -> Option<RuntimeVersion> {
    let (major, rest) = leading_number(name)?;

    if let Some(rest) = rest.strip_prefix('u') {
        let (security, rest) = leading_number(rest)?;
        let build = rest.strip_prefix('b').and_then(|r| leading_number(r).map(|(v, _)| v));
        return Some(RuntimeVersion {
            name: None,
            major,
            minor: None,
            security: Some(security),
            build,
        });
    }

    let mut components = [None::<u32>; 3];
    let mut rest = rest;
    for slot in &mut components {
        let Some(tail) = rest.strip_prefix('.') else { break };
        let Some((value, tail)) = leading_number(tail) else { break };
        *slot = Some(value);
        rest = tail;
    }
    Some(RuntimeVersion {
        name: None,
        major,
        minor: components[0],
        security: components[1],
        build: components[2],
    })
}

fn leading_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// Flatten structured game arguments into the classic single-string
/// form, keeping only the unconditional entries. `None` when nothing
/// unconditional remains.
pub fn flatten_arguments(values: &[serde_json::Value]) -> Option<String> {
    let plain: Vec<&str> = values.iter().filter_map(serde_json::Value::as_str).collect();
    if plain.is_empty() { None } else { Some(plain.join(" ")) }
}

pub fn into_library(library: &PistonLibrary) -> Library {
    Library {
        name: library.name.clone(),
        url: library.url.clone(),
        downloads: library.downloads.as_ref().map(|downloads| LibraryDownloads {
            artifact: downloads.artifact.as_ref().map(into_artifact),
        }),
    }
}

pub fn into_artifact(artifact: &PistonArtifact) -> Artifact {
    Artifact { url: artifact.url.clone(), sha1: artifact.sha1.clone(), size: artifact.size }
}
