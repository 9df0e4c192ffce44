//! Per-call compile and link requests.

use std::path::PathBuf;

use crate::core::platform::TargetKind;

/// A preprocessor macro to define or undefine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Macro {
    /// `NAME=VALUE`; an empty value defines `NAME=1`.
    Define { name: String, value: String },
    Undefine(String),
}

impl Macro {
    pub fn define(name: impl Into<String>, value: impl Into<String>) -> Self {
        Macro::Define {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn undefine(name: impl Into<String>) -> Self {
        Macro::Undefine(name.into())
    }

    /// Parse a command-line style `NAME` or `NAME=VALUE`.
    pub fn parse_define(text: &str) -> Self {
        match text.split_once('=') {
            Some((name, value)) => Macro::define(name, value),
            None => Macro::define(text, ""),
        }
    }

    /// The `PreprocessorDefinitions` entry, or `None` for an undefine.
    pub fn definition(&self) -> Option<String> {
        match self {
            Macro::Define { name, value } if value.is_empty() => Some(format!("{}=1", name)),
            Macro::Define { name, value } => Some(format!("{}={}", name, value)),
            Macro::Undefine(_) => None,
        }
    }
}

/// Everything a single `compile` call needs.
#[derive(Debug, Clone, Default)]
pub struct CompileRequest {
    pub sources: Vec<PathBuf>,
    /// Intermediate directory for this request.
    pub output_dir: Option<PathBuf>,
    pub macros: Vec<Macro>,
    pub include_dirs: Vec<PathBuf>,
    pub debug: bool,
    pub extra_preargs: Vec<String>,
    pub extra_postargs: Vec<String>,
}

impl CompileRequest {
    pub fn new(sources: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        CompileRequest {
            sources: sources.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Everything a single `link` call needs besides the objects and output name.
#[derive(Debug, Clone, Default)]
pub struct LinkRequest {
    /// Overrides the directory part of the output name.
    pub output_dir: Option<PathBuf>,
    pub libraries: Vec<String>,
    pub library_dirs: Vec<PathBuf>,
    pub debug: bool,
    pub extra_preargs: Vec<String>,
    pub extra_postargs: Vec<String>,
    /// Overrides the intermediate directory recorded by `compile`.
    pub build_temp: Option<PathBuf>,
}

/// Summary of a finished (or, in dry-run mode, prepared) link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutput {
    pub kind: TargetKind,
    /// The project file that was re-serialized and built.
    pub project: PathBuf,
    /// Where the orchestrator writes the final artifact.
    pub artifact: PathBuf,
    pub verbose_log: PathBuf,
    pub errors_log: PathBuf,
}
