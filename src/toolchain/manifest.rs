//! Instance manifests.
//!
//! A manifest is a TOML file listing installations found by an external
//! scanner:
//!
//! ```toml
//! [[instance]]
//! id = "vs2017"
//! name = "Visual Studio Build Tools 2017"
//! version = "15.9.28307.1"
//! path = 'C:\BuildTools'
//! packages = ["Microsoft.Build", "Microsoft.VisualCpp.Tools.HostX86.TargetX86"]
//!
//! [instance.known_paths]
//! "msbuild.exe" = 'C:\BuildTools\MSBuild\15.0\Bin\MSBuild.exe'
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::instance::ToolchainInstance;
use crate::toolchain::InstanceSource;
use crate::util::fs::read_to_string;

#[derive(Debug, Default, Deserialize)]
struct ManifestFile {
    #[serde(default, rename = "instance")]
    instances: Vec<InstanceEntry>,
}

#[derive(Debug, Deserialize)]
struct InstanceEntry {
    id: String,
    name: Option<String>,
    version: String,
    #[serde(default)]
    path: PathBuf,
    #[serde(default)]
    packages: Vec<String>,
    #[serde(default)]
    known_paths: BTreeMap<String, PathBuf>,
}

impl From<InstanceEntry> for ToolchainInstance {
    fn from(entry: InstanceEntry) -> Self {
        let name = entry.name.unwrap_or_else(|| entry.id.clone());
        ToolchainInstance::new(
            entry.id,
            name,
            entry.version,
            entry.path,
            entry.packages,
            entry.known_paths,
        )
    }
}

/// Reads instances from a manifest file each time it is queried.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    path: PathBuf,
}

impl ManifestSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ManifestSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse manifest text.
    pub fn parse(text: &str) -> Result<Vec<ToolchainInstance>> {
        let file: ManifestFile = toml::from_str(text)?;
        Ok(file.instances.into_iter().map(Into::into).collect())
    }
}

impl InstanceSource for ManifestSource {
    fn find_all(&self) -> Result<Vec<ToolchainInstance>> {
        let text = read_to_string(&self.path)
            .with_context(|| format!("failed to read instance manifest: {}", self.path.display()))?;
        let instances = Self::parse(&text)
            .with_context(|| format!("failed to parse instance manifest: {}", self.path.display()))?;
        tracing::debug!(
            "loaded {} instance(s) from {}",
            instances.len(),
            self.path.display()
        );
        Ok(instances)
    }
}
