//! Core data structures: target platforms, output kinds and toolchain
//! instances.

pub mod instance;
pub mod platform;

pub use instance::ToolchainInstance;
pub use platform::{Platform, TargetKind};
