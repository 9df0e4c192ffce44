//! Toolchain discovery plumbing.
//!
//! Scanning the registry and filesystem for installations is not done here.
//! An [`InstanceSource`] produces [`ToolchainInstance`]s; an [`InstanceCache`]
//! remembers the first answer until it is invalidated; [`ToolPaths`] overlays
//! the tool maps of several instances so the newest one wins.

pub mod manifest;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;

use crate::core::instance::ToolchainInstance;
use crate::core::platform::Platform;

pub use manifest::ManifestSource;

/// Something that can enumerate installed toolchains.
pub trait InstanceSource: Send + Sync {
    fn find_all(&self) -> Result<Vec<ToolchainInstance>>;
}

/// A fixed list of instances.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    instances: Vec<ToolchainInstance>,
}

impl StaticSource {
    pub fn new(instances: Vec<ToolchainInstance>) -> Self {
        StaticSource { instances }
    }
}

impl InstanceSource for StaticSource {
    fn find_all(&self) -> Result<Vec<ToolchainInstance>> {
        Ok(self.instances.clone())
    }
}

/// Caches the result of an [`InstanceSource`].
///
/// The source is queried at most once until [`InstanceCache::invalidate`] or
/// [`InstanceCache::refresh`] is called. Share one cache between drivers with
/// an `Arc`.
pub struct InstanceCache {
    source: Box<dyn InstanceSource>,
    instances: Mutex<Option<Arc<Vec<ToolchainInstance>>>>,
}

impl InstanceCache {
    pub fn new(source: impl InstanceSource + 'static) -> Self {
        InstanceCache {
            source: Box::new(source),
            instances: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<Vec<ToolchainInstance>>>> {
        self.instances.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every known instance, querying the source on first use.
    pub fn find_all(&self) -> Result<Arc<Vec<ToolchainInstance>>> {
        let mut slot = self.slot();
        if let Some(instances) = slot.as_ref() {
            return Ok(Arc::clone(instances));
        }

        let found = Arc::new(self.source.find_all()?);
        tracing::debug!("discovered {} toolchain instance(s)", found.len());
        *slot = Some(Arc::clone(&found));
        Ok(found)
    }

    /// Instances holding at least one of `packages`.
    pub fn find_with_any<S: AsRef<str>>(&self, packages: &[S]) -> Result<Vec<ToolchainInstance>> {
        Ok(self
            .find_all()?
            .iter()
            .filter(|i| i.has_any(packages))
            .cloned()
            .collect())
    }

    /// Instances holding every one of `packages`.
    pub fn find_with_all<S: AsRef<str>>(&self, packages: &[S]) -> Result<Vec<ToolchainInstance>> {
        Ok(self
            .find_all()?
            .iter()
            .filter(|i| i.has_all(packages))
            .cloned()
            .collect())
    }

    /// Forget the cached result. The next query hits the source again.
    pub fn invalidate(&self) {
        *self.slot() = None;
    }

    /// Re-query the source now.
    pub fn refresh(&self) -> Result<Arc<Vec<ToolchainInstance>>> {
        self.invalidate();
        self.find_all()
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("cached", &self.slot().as_ref().map(|i| i.len()))
            .finish()
    }
}

/// Merged tool-key to path lookup over several instances.
///
/// Instances are consulted in descending version order and the first one
/// that defines a key wins. Instances with equal versions keep the order
/// they were discovered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPaths {
    paths: BTreeMap<String, PathBuf>,
}

impl ToolPaths {
    pub fn overlay<'a>(instances: impl IntoIterator<Item = &'a ToolchainInstance>) -> Self {
        let mut ordered: Vec<&ToolchainInstance> = instances.into_iter().collect();
        ordered.sort_by(|a, b| b.version_info().cmp(a.version_info()));

        let mut paths = BTreeMap::new();
        for instance in ordered {
            for (key, path) in instance.known_paths() {
                paths.entry(key.clone()).or_insert_with(|| path.clone());
            }
        }
        ToolPaths { paths }
    }

    /// Path registered for exactly `key`.
    pub fn get(&self, key: &str) -> Option<&Path> {
        self.paths.get(key).map(PathBuf::as_path)
    }

    /// Path of `tool` built for `platform`, e.g. `lib.exe_x64`.
    pub fn find_exe(&self, tool: &str, platform: Platform) -> Option<&Path> {
        self.get(&format!("{}{}", tool, platform.tool_key_suffix()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
