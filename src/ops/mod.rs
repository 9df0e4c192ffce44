//! High-level operations.
//!
//! This module contains the implementation of msbuildcc commands.

pub mod instances;
pub mod msbuild_build;

pub use instances::{format_instances, list_instances, InstanceSummary};
pub use msbuild_build::{build, BuildOptions, BuildResult};
