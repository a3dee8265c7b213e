//! The Java runtime packages: `javaN` records listing every
//! downloadable build of one major version, from Mojang's own catalog
//! and the Adoptium and Azul vendors.

use std::collections::BTreeMap;
use std::sync::Arc;

use metagen_client::{Goal, Provider, ProviderValue, dep_data};
use metagen_core::Error;
use metagen_core::format::{
    ChecksumType, Runtime, RuntimeChecksum, RuntimeDownloadType, RuntimeVersion, VersionOutput,
};

use crate::providers::adoptium::AdoptiumVersions;
use crate::providers::azul::AzulVersions;
use crate::providers::mojang::JavaRuntimes;
use crate::upstream::adoptium::{AdoptiumBinary, AdoptiumRelease};
use crate::upstream::azul::AzulPackage;
use crate::upstream::piston::{PistonJavaRuntimes, parse_java_version};

/// Group runtimes by major version into one `javaN` record per group,
/// newest build first. The record's release time is its oldest build's,
/// so it only moves when a whole new major appears.
fn major_records(runtimes: Vec<Runtime>) -> Vec<VersionOutput> {
    let mut majors: BTreeMap<u32, Vec<Runtime>> = BTreeMap::new();
    for runtime in runtimes {
        majors.entry(runtime.version.major).or_default().push(runtime);
    }

    majors
        .into_iter()
        .map(|(major, mut entries)| {
            entries.sort_by(|a, b| b.release_time.cmp(&a.release_time));
            let release_time = entries.last().map(|entry| entry.release_time).unwrap_or_default();
            VersionOutput {
                version: format!("java{major}"),
                release_time,
                runtimes: entries,
                ..VersionOutput::default()
            }
        })
        .collect()
}

pub struct MojangJava {
    runtimes: Arc<JavaRuntimes>,
}

impl MojangJava {
    pub fn new(runtimes: Arc<JavaRuntimes>) -> Self {
        Self { runtimes }
    }
}

impl Goal for MojangJava {
    fn id(&self) -> &'static str {
        "net.minecraft.java"
    }

    fn name(&self) -> &'static str {
        "Mojang Provided Java"
    }

    fn deps(&self) -> Vec<Arc<dyn Provider>> {
        vec![self.runtimes.clone()]
    }

    fn generate(&self, data: &[ProviderValue]) -> Result<Vec<VersionOutput>, Error> {
        let catalog = dep_data::<PistonJavaRuntimes>(self.id(), data, 0)?;

        let mut runtimes = Vec::new();
        for (platform, components) in catalog {
            for (component, entries) in components {
                for entry in entries {
                    let version = parse_java_version(&entry.version.name).ok_or_else(|| {
                        Error::Validation(format!(
                            "unparseable Java runtime version '{}'",
                            entry.version.name
                        ))
                    })?;
                    runtimes.push(Runtime {
                        name: component.clone(),
                        runtime_os: mojang_runtime_os(platform),
                        version: RuntimeVersion { name: Some(entry.version.name.clone()), ..version },
                        release_time: entry.version.released,
                        vendor: "mojang".into(),
                        package_type: "jre".into(),
                        download_type: RuntimeDownloadType::Manifest,
                        checksum: RuntimeChecksum {
                            kind: ChecksumType::Sha1,
                            hash: entry.manifest.sha1.clone(),
                        },
                        url: entry.manifest.url.clone(),
                    });
                }
            }
        }
        Ok(major_records(runtimes))
    }

    fn recommend(&self, _first: bool, _version: &VersionOutput) -> bool {
        false
    }
}

/// Catalog platforms without an architecture suffix are x64; `mac-os`
/// carries one only for arm64.
fn mojang_runtime_os(platform: &str) -> String {
    if platform == "mac-os" || !platform.contains('-') {
        format!("{platform}-x64")
    } else {
        platform.to_string()
    }
}

pub struct AdoptiumJava {
    versions: Arc<AdoptiumVersions>,
}

impl AdoptiumJava {
    pub fn new(versions: Arc<AdoptiumVersions>) -> Self {
        Self { versions }
    }
}

impl Goal for AdoptiumJava {
    fn id(&self) -> &'static str {
        "net.adoptium.java"
    }

    fn name(&self) -> &'static str {
        "Adoptium Provided Java"
    }

    fn deps(&self) -> Vec<Arc<dyn Provider>> {
        vec![self.versions.clone()]
    }

    fn generate(&self, data: &[ProviderValue]) -> Result<Vec<VersionOutput>, Error> {
        let releases = dep_data::<Vec<AdoptiumRelease>>(self.id(), data, 0)?;
        let runtimes = releases.iter().flat_map(transform_adoptium).collect();
        Ok(major_records(runtimes))
    }

    fn recommend(&self, _first: bool, _version: &VersionOutput) -> bool {
        false
    }
}

fn transform_adoptium(release: &AdoptiumRelease) -> Vec<Runtime> {
    let version = &release.version_data;
    let name = format!(
        "{}_termurin_jre{}.{}.{}+{}",
        release.vendor, version.major, version.minor, version.security, version.build
    );

    release
        .binaries
        .iter()
        .filter_map(|binary| {
            Some(Runtime {
                name: name.clone(),
                runtime_os: adoptium_runtime_os(binary)?,
                version: RuntimeVersion {
                    name: None,
                    major: version.major,
                    minor: Some(version.minor),
                    security: Some(version.security),
                    build: Some(version.build),
                },
                release_time: release.timestamp,
                vendor: release.vendor.clone(),
                package_type: "jre".into(),
                download_type: RuntimeDownloadType::Archive,
                checksum: RuntimeChecksum {
                    kind: ChecksumType::Sha256,
                    hash: binary.package.checksum.clone(),
                },
                url: binary.package.link.clone(),
            })
        })
        .collect()
}

/// `None` for platforms the launcher has no runtime slot for.
fn adoptium_runtime_os(binary: &AdoptiumBinary) -> Option<String> {
    let os = match binary.os.as_str() {
        "linux" | "windows" => binary.os.as_str(),
        "mac" => "mac-os",
        _ => return None,
    };
    let arch = match binary.architecture.as_str() {
        "x64" | "x86" => binary.architecture.as_str(),
        "aarch64" => "arm64",
        "arm" => "arm32",
        _ => return None,
    };
    Some(format!("{os}-{arch}"))
}

pub struct AzulJava {
    versions: Arc<AzulVersions>,
}

impl AzulJava {
    pub fn new(versions: Arc<AzulVersions>) -> Self {
        Self { versions }
    }
}

impl Goal for AzulJava {
    fn id(&self) -> &'static str {
        "com.azul.java"
    }

    fn name(&self) -> &'static str {
        "Azul Provided Java"
    }

    fn deps(&self) -> Vec<Arc<dyn Provider>> {
        vec![self.versions.clone()]
    }

    fn generate(&self, data: &[ProviderValue]) -> Result<Vec<VersionOutput>, Error> {
        let packages = dep_data::<Vec<AzulPackage>>(self.id(), data, 0)?;
        let runtimes = packages.iter().filter_map(transform_azul).collect();
        Ok(major_records(runtimes))
    }

    fn recommend(&self, _first: bool, _version: &VersionOutput) -> bool {
        false
    }
}

fn transform_azul(package: &AzulPackage) -> Option<Runtime> {
    let component = |at: usize| package.java_version.get(at).copied().unwrap_or(0);
    let (major, minor, security) = (component(0), component(1), component(2));

    Some(Runtime {
        name: format!("azul_{}_jre{major}.{minor}.{security}", package.product),
        runtime_os: azul_runtime_os(package)?,
        version: RuntimeVersion {
            name: None,
            major,
            minor: Some(minor),
            security: Some(security),
            build: None,
        },
        release_time: package.build_date,
        vendor: "azul".into(),
        package_type: "jre".into(),
        download_type: RuntimeDownloadType::Archive,
        checksum: RuntimeChecksum { kind: ChecksumType::Sha256, hash: package.sha256_hash.clone() },
        url: package.download_url.clone(),
    })
}

/// Azul reports bitness separately, so `arm`/`x86` expand to
/// `arm64`/`x64` style names. `None` for unsupported platforms.
fn azul_runtime_os(package: &AzulPackage) -> Option<String> {
    let os = match package.os.as_str() {
        "linux" | "windows" => package.os.as_str(),
        "macos" => "mac-os",
        _ => return None,
    };
    let arch = match package.arch.as_str() {
        "arm" => format!("arm{}", package.hw_bitness),
        "x86" => format!("x{}", package.hw_bitness),
        _ => return None,
    };
    Some(format!("{os}-{arch}"))
}
