//! Command implementations

pub mod build;
pub mod instances;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use msbuildcc::toolchain::{InstanceCache, ManifestSource, StaticSource};
use msbuildcc::util::config::{global_config_path, load_config, project_config_path};
use msbuildcc::Config;

/// Global config overlaid with the one in the current directory.
pub fn current_config() -> Result<Config> {
    let cwd = std::env::current_dir()?;
    let global = global_config_path().unwrap_or_default();
    Ok(load_config(&global, &project_config_path(&cwd)))
}

/// The instance cache for a command: `--instances` first, then the
/// configured manifest. With neither nothing is discovered.
pub fn instance_cache(manifest: Option<&Path>, config: &Config) -> Arc<InstanceCache> {
    let manifest: Option<PathBuf> = manifest
        .map(Path::to_path_buf)
        .or_else(|| config.discovery.manifest.clone());

    let cache = match manifest {
        Some(path) => {
            tracing::debug!("discovering instances from {}", path.display());
            InstanceCache::new(ManifestSource::new(path))
        }
        None => {
            tracing::debug!("no instance manifest configured");
            InstanceCache::new(StaticSource::new(Vec::new()))
        }
    };
    Arc::new(cache)
}
