//! msbuildcc - build C/C++ sources through MSBuild
//!
//! This crate synthesizes an MSBuild project from layered option records,
//! builds it with a discovered Visual Studio toolchain and reports the
//! results.

pub mod builder;
pub mod core;
pub mod ops;
pub mod toolchain;
pub mod util;

/// Test utilities for msbuildcc unit tests.
///
/// Only available when compiling tests. Provides fake instance sources,
/// toolchain fixtures and a stand-in MSBuild script.
#[cfg(test)]
pub mod test_support;

pub use builder::{
    CompileRequest, DriverError, DriverSettings, LinkRequest, Macro, MsBuildCompiler, OptionKind,
    Options, ProjectDescriptor,
};
pub use core::{Platform, TargetKind, ToolchainInstance};
pub use toolchain::InstanceCache;
pub use util::Config;
