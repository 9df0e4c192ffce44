//! User-friendly diagnostic messages.
//!
//! Every error the driver reports should carry its root cause and a
//! suggested fix. Build output forwarded from MSBuild also flows through
//! here, so a caller sees compiler errors and driver errors the same way.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no Visual Studio installation qualifies.
    pub const INSTALL_BUILD_TOOLS: &str =
        "Install Visual Studio or the Build Tools with the C++ workload and a Windows SDK";

    /// Where to get the Build Tools.
    pub const OBTAIN_BUILD_TOOLS: &str =
        "Visit https://aka.ms/vcpython for information on obtaining one";

    /// Suggestion when discovery may be misconfigured.
    pub const CHECK_MANIFEST: &str =
        "Check the instance manifest passed with `--instances` or set in `[discovery]`";

    /// Suggestion when the build fails.
    pub const BUILD_FAILED: &str = "Open the detailed log for the full MSBuild output";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
    /// Line within `location`, when known
    pub line: Option<u32>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
            line: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, message)
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Add a line number to the location.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Build a diagnostic from one line of an MSBuild errors-and-warnings log.
    ///
    /// A line is an error when it contains `: error`, otherwise a warning.
    /// Lines of the form `file(line[,col]): error CODE: text` also get a
    /// location.
    pub fn from_build_log_line(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut diag = if line.contains(": error") {
            Diagnostic::error(line)
        } else {
            Diagnostic::warning(line)
        };

        if let Some(caps) = build_log_location().captures(line) {
            diag = diag.with_location(caps["file"].trim());
            if let Some(n) = caps.name("line").and_then(|m| m.as_str().parse().ok()) {
                diag = diag.with_line(n);
            }
        }

        diag
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
                Severity::Help => "\x1b[1;32mhelp\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
                Severity::Help => "help",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            match self.line {
                Some(line) => output.push_str(&format!("  --> {}:{}\n", path.display(), line)),
                None => output.push_str(&format!("  --> {}\n", path.display())),
            }
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

fn build_log_location() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?P<file>[^()]+?)\((?P<line>\d+)(?:,\d+)?\)\s*:\s*(?:fatal )?(?:error|warning)")
            .expect("build log location pattern is valid")
    })
}

/// Receiver for diagnostics produced while building.
pub trait DiagnosticSink: Send {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}", diagnostic.message),
            Severity::Warning => tracing::warn!("{}", diagnostic.message),
            Severity::Note | Severity::Help => tracing::info!("{}", diagnostic.message),
        }
    }
}

/// Collects diagnostics into a shared list.
///
/// Clones share the same list, so one handle can be given to the driver and
/// another kept by the caller.
#[derive(Debug, Default, Clone)]
pub struct CollectSink {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectSink {
    pub fn new() -> Self {
        CollectSink::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for CollectSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        if let Ok(mut list) = self.diagnostics.lock() {
            list.push(diagnostic);
        }
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
