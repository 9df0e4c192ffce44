//! Implementation of `msbuildcc instances`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::core::platform::Platform;
use crate::toolchain::InstanceCache;

/// One discovered instance, as reported to the user.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    pub sdk: bool,
    pub packages: Vec<String>,
    pub tools: BTreeMap<String, PathBuf>,
    /// Platforms this instance can take part in.
    pub platforms: Vec<String>,
}

/// List instances, newest first.
pub fn list_instances(cache: &InstanceCache) -> Result<Vec<InstanceSummary>> {
    let instances = cache.find_all()?;
    let mut sorted: Vec<_> = instances.iter().collect();
    sorted.sort_by(|a, b| b.version_info().cmp(a.version_info()));

    let summaries = sorted
        .into_iter()
        .map(|i| InstanceSummary {
            id: i.id().to_string(),
            name: i.name().to_string(),
            version: i.version().to_string(),
            path: i.path().to_path_buf(),
            sdk: i.is_sdk(),
            packages: i.packages().iter().cloned().collect(),
            tools: i.known_paths().clone(),
            platforms: [Platform::Win32, Platform::WinAmd64]
                .into_iter()
                .filter(|p| i.has_any(p.required_packages()))
                .map(|p| p.to_string())
                .collect(),
        })
        .collect();
    Ok(summaries)
}

/// Render summaries as a plain-text table.
pub fn format_instances(summaries: &[InstanceSummary]) -> String {
    if summaries.is_empty() {
        return "no toolchain instances found\n".to_string();
    }

    let mut out = String::new();
    for s in summaries {
        out.push_str(&format!("{} {} ({})\n", s.id, s.version, s.name));
        if !s.path.as_os_str().is_empty() {
            out.push_str(&format!("    path: {}\n", s.path.display()));
        }
        if !s.platforms.is_empty() {
            out.push_str(&format!("    platforms: {}\n", s.platforms.join(", ")));
        }
        out.push_str(&format!("    tools: {}\n", s.tools.len()));
    }
    out
}
