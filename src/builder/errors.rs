//! Driver error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Broad classification of a [`DriverError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Misuse of the driver: bad platform, wrong lifecycle order.
    Configuration,
    /// No usable toolchain installation or tool.
    ToolchainNotFound,
    /// Template or option table corruption.
    Structural,
    /// The build orchestrator reported failure.
    BuildFailure,
}

/// Error raised by the MSBuild driver.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum DriverError {
    #[error("'{platform}' is not a supported platform")]
    #[diagnostic(
        code(msbuildcc::config::platform),
        help("supported platforms are `win32` and `win-amd64`")
    )]
    UnsupportedPlatform { platform: String },

    #[error("compiler is already initialized")]
    #[diagnostic(code(msbuildcc::config::initialized))]
    AlreadyInitialized,

    #[error("compiler was not initialized")]
    #[diagnostic(
        code(msbuildcc::config::uninitialized),
        help("compile sources before linking them")
    )]
    NotInitialized,

    #[error("no objects were given to link")]
    #[diagnostic(code(msbuildcc::config::no_objects))]
    NoLinkObjects,

    #[error("no suitable Visual Studio installations found")]
    #[diagnostic(
        code(msbuildcc::toolchain::not_found),
        help("visit https://aka.ms/vcpython for information on obtaining one")
    )]
    ToolchainNotFound { packages: Vec<String> },

    #[error("{tool} is not available on this platform")]
    #[diagnostic(code(msbuildcc::toolchain::tool))]
    ToolNotFound { tool: String },

    #[error("project template `{source_name}` not found")]
    #[diagnostic(code(msbuildcc::project::template))]
    TemplateNotFound { source_name: String },

    #[error("project template has no node for `{role}`")]
    #[diagnostic(code(msbuildcc::project::missing_node))]
    MissingNode { role: String },

    #[error("`{field}` is not an option of `{record}`")]
    #[diagnostic(code(msbuildcc::options::unknown_field))]
    UnknownField { record: String, field: String },

    #[error("`{field}` of `{record}` cannot be accumulated")]
    #[diagnostic(code(msbuildcc::options::not_accumulable))]
    NotAccumulable { record: String, field: String },

    #[error("unsupported type for item: {found}")]
    #[diagnostic(code(msbuildcc::project::item))]
    UnsupportedItem { found: String },

    #[error("error building project. See '{}' for detailed log", verbose_log.display())]
    #[diagnostic(code(msbuildcc::build::failed))]
    BuildFailed {
        exit_code: Option<i32>,
        verbose_log: PathBuf,
    },
}

impl DriverError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::UnsupportedPlatform { .. }
            | DriverError::AlreadyInitialized
            | DriverError::NotInitialized
            | DriverError::NoLinkObjects => ErrorKind::Configuration,
            DriverError::ToolchainNotFound { .. } | DriverError::ToolNotFound { .. } => {
                ErrorKind::ToolchainNotFound
            }
            DriverError::TemplateNotFound { .. }
            | DriverError::MissingNode { .. }
            | DriverError::UnknownField { .. }
            | DriverError::NotAccumulable { .. }
            | DriverError::UnsupportedItem { .. } => ErrorKind::Structural,
            DriverError::BuildFailed { .. } => ErrorKind::BuildFailure,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            DriverError::UnsupportedPlatform { .. } => {
                diag.with_suggestion("Pass `--platform win32` or `--platform win-amd64`")
            }
            DriverError::ToolchainNotFound { packages } => {
                let mut diag = diag;
                if !packages.is_empty() {
                    diag = diag.with_context(format!(
                        "an installation with any of these packages is required: {}",
                        packages.join(", ")
                    ));
                }
                diag.with_suggestion(suggestions::INSTALL_BUILD_TOOLS)
                    .with_suggestion(suggestions::OBTAIN_BUILD_TOOLS)
                    .with_suggestion(suggestions::CHECK_MANIFEST)
            }
            DriverError::ToolNotFound { tool } => diag
                .with_context(format!("no discovered installation provides `{}`", tool))
                .with_suggestion(suggestions::CHECK_MANIFEST),
            DriverError::MissingNode { .. }
            | DriverError::UnknownField { .. }
            | DriverError::NotAccumulable { .. } => {
                diag.with_context("the project template does not match the option tables")
            }
            DriverError::BuildFailed {
                exit_code,
                verbose_log,
            } => {
                let mut diag = diag.with_location(verbose_log);
                if let Some(code) = exit_code {
                    diag = diag.with_context(format!("msbuild exited with code {}", code));
                }
                diag.with_suggestion(suggestions::BUILD_FAILED)
            }
            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            DriverError::UnsupportedPlatform {
                platform: "arm64".to_string()
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            DriverError::ToolNotFound {
                tool: "msbuild.exe".to_string()
            }
            .kind(),
            ErrorKind::ToolchainNotFound
        );
        assert_eq!(
            DriverError::UnsupportedItem {
                found: "integer".to_string()
            }
            .kind(),
            ErrorKind::Structural
        );
    }

    #[test]
    fn test_toolchain_not_found_diagnostic() {
        let err = DriverError::ToolchainNotFound {
            packages: vec!["Microsoft.Build".to_string(), "WinSDK".to_string()],
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("no suitable Visual Studio installations found"));
        assert!(output.contains("Microsoft.Build, WinSDK"));
        assert!(output.contains("https://aka.ms/vcpython"));
    }

    #[test]
    fn test_build_failed_points_at_log() {
        let err = DriverError::BuildFailed {
            exit_code: Some(1),
            verbose_log: PathBuf::from("build/verbose.log"),
        };

        assert!(err.to_string().contains("build/verbose.log"));
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("--> build/verbose.log"));
        assert!(output.contains("exited with code 1"));
    }
}
