//! Version metadata output format (v1).
//!
//! These types describe the JSON files the runner materializes: one file
//! per version, one `index.json` per package, and one top-level
//! `index.json`. Field names follow the published format, so everything
//! here serializes camelCase; empty optional collections are omitted
//! entirely rather than written as `[]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FORMAT_VERSION: u32 = 1;

/// A dependency edge between packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggests: Option<String>,
}

/// A downloadable artifact with its integrity data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub url: String,
    pub sha1: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
}

/// A library reference, either by maven coordinate + repository URL or
/// with explicit download information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<LibraryDownloads>,
}

/// Reference to an asset index published alongside a game version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
    pub sha1: String,
    pub size: u64,
    pub total_size: u64,
}

/// Numeric components of a Java runtime version. Mojang's runtime
/// catalog also carries the raw version name; the other vendors only
/// publish the numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub major: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<u32>,
}

/// How a runtime download is packaged: a Mojang file manifest to walk,
/// or a plain archive to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeDownloadType {
    Manifest,
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumType {
    Sha1,
    Sha256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeChecksum {
    #[serde(rename = "type")]
    pub kind: ChecksumType,
    pub hash: String,
}

/// One downloadable Java runtime build inside a `javaN` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    pub name: String,
    #[serde(rename = "runtimeOS")]
    pub runtime_os: String,
    pub version: RuntimeVersion,
    pub release_time: DateTime<Utc>,
    pub vendor: String,
    pub package_type: String,
    pub download_type: RuntimeDownloadType,
    pub checksum: RuntimeChecksum,
    pub url: String,
}

/// One generated version record, before the package envelope is added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionOutput {
    pub version: String,
    pub release_time: DateTime<Utc>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub volatile: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Dependency>,

    #[serde(rename = "+traits", default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compatible_java_majors: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatible_java_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft_arguments: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_jar: Option<Library>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<AssetIndexRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<Library>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maven_files: Vec<Library>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runtimes: Vec<Runtime>,
}

/// A complete `<version>.json` file: one version record inside its
/// package envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionFile {
    pub uid: String,
    pub name: String,
    pub format_version: u32,
    #[serde(flatten)]
    pub output: VersionOutput,
}

impl VersionFile {
    pub fn new(uid: &str, name: &str, output: VersionOutput) -> Self {
        Self { uid: uid.into(), name: name.into(), format_version: FORMAT_VERSION, output }
    }
}

/// Summary of one version inside a package `index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageIndexVersion {
    pub version: String,
    pub release_time: DateTime<Utc>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Dependency>,
    pub recommended: bool,
    pub sha256: String,
}

/// A package `index.json`: every version of one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageIndex {
    pub uid: String,
    pub name: String,
    pub format_version: u32,
    pub versions: Vec<PackageIndexVersion>,
}

/// One package line in the top-level `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPackage {
    pub uid: String,
    pub name: String,
    pub sha256: String,
}

/// The top-level `index.json`: every generated package, sorted by uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    pub format_version: u32,
    pub packages: Vec<IndexPackage>,
}
