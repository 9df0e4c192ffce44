//! Discovered toolchain installations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Instance ids with this prefix describe a Windows SDK rather than a
/// Visual Studio installation.
pub const SDK_INSTANCE_PREFIX: &str = "winsdk";

/// One installed toolchain product (Visual Studio, Build Tools, Windows SDK).
///
/// Instances are produced by a discovery source and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInstance {
    id: String,
    name: String,
    version: String,
    version_info: Vec<u32>,
    path: PathBuf,
    packages: BTreeSet<String>,
    known_paths: BTreeMap<String, PathBuf>,
}

impl ToolchainInstance {
    /// Create a new instance. The numeric version tuple is derived from
    /// `version`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<PathBuf>,
        packages: impl IntoIterator<Item = impl Into<String>>,
        known_paths: impl IntoIterator<Item = (impl Into<String>, impl Into<PathBuf>)>,
    ) -> Self {
        let version = version.into();
        ToolchainInstance {
            id: id.into(),
            name: name.into(),
            version_info: parse_version_info(&version),
            version,
            path: path.into(),
            packages: packages.into_iter().map(Into::into).collect(),
            known_paths: known_paths
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Short identity tag, e.g. `vs2015` or `winsdk10`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full dotted version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Numeric prefix of the version, comparable in ascending order.
    pub fn version_info(&self) -> &[u32] {
        &self.version_info
    }

    /// Installation root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Installed package identifiers.
    pub fn packages(&self) -> &BTreeSet<String> {
        &self.packages
    }

    /// Tool key to resolved path.
    pub fn known_paths(&self) -> &BTreeMap<String, PathBuf> {
        &self.known_paths
    }

    /// Whether this instance is a Windows SDK.
    pub fn is_sdk(&self) -> bool {
        self.id.starts_with(SDK_INSTANCE_PREFIX)
    }

    /// True if any of `packages` is installed in this instance.
    pub fn has_any<S: AsRef<str>>(&self, packages: &[S]) -> bool {
        packages.iter().any(|p| self.packages.contains(p.as_ref()))
    }

    /// True if every one of `packages` is installed in this instance.
    pub fn has_all<S: AsRef<str>>(&self, packages: &[S]) -> bool {
        packages.iter().all(|p| self.packages.contains(p.as_ref()))
    }
}

impl fmt::Display for ToolchainInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Parse the leading numeric components of a dotted version.
///
/// Parsing stops at the first component that is not a number, so
/// `"10.0.beta.3"` yields `[10, 0]`.
pub fn parse_version_info(version: &str) -> Vec<u32> {
    version
        .split('.')
        .map_while(|part| part.parse::<u32>().ok())
        .collect()
}

/// Render a version tuple back to dotted form.
pub fn format_version_info(info: &[u32]) -> String {
    info.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(".")
}
