//! The MSBuild compiler driver.
//!
//! Option records, the project descriptor they merge into, and the driver
//! that serializes a project and runs MSBuild over it.

pub mod compiler;
pub mod errors;
pub mod options;
pub mod project;
pub mod request;
pub mod xml;

pub use compiler::{DriverSettings, MsBuildCompiler};
pub use errors::{DriverError, ErrorKind};
pub use options::{OptionKind, Options};
pub use project::{ProjectDescriptor, ProjectItem};
pub use request::{CompileRequest, LinkOutput, LinkRequest, Macro};
