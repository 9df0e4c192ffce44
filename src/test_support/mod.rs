//! Test utilities for msbuildcc unit tests.
//!
//! Provides instance sources that record how often they are queried, a
//! source that always fails, and the fixtures in [`fixtures`].

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::core::instance::ToolchainInstance;
use crate::toolchain::InstanceSource;

pub use fixtures::*;

/// Shared call counter handed out by [`CountingSource::calls`].
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// An in-memory source that counts `find_all` calls.
#[derive(Debug, Clone, Default)]
pub struct CountingSource {
    instances: Vec<ToolchainInstance>,
    calls: CallCounter,
}

impl CountingSource {
    pub fn new(instances: Vec<ToolchainInstance>) -> Self {
        CountingSource {
            instances,
            calls: CallCounter::default(),
        }
    }

    /// A handle that keeps counting after the source is moved into a cache.
    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl InstanceSource for CountingSource {
    fn find_all(&self) -> Result<Vec<ToolchainInstance>> {
        self.calls.bump();
        Ok(self.instances.clone())
    }
}

/// A source whose discovery always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSource;

impl InstanceSource for FailingSource {
    fn find_all(&self) -> Result<Vec<ToolchainInstance>> {
        bail!("registry is unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_source() {
        let source = CountingSource::new(vec![vs2017()]);
        let calls = source.calls();
        assert_eq!(source.find_all().unwrap().len(), 1);
        source.find_all().unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_failing_source() {
        assert!(FailingSource.find_all().is_err());
    }
}
