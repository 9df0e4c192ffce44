//! Implementation of `msbuildcc build`.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::builder::compiler::{classify_source, MsBuildCompiler};
use crate::builder::request::{CompileRequest, LinkOutput, LinkRequest, Macro};
use crate::core::platform::TargetKind;

/// Options for the build command.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Source files (already glob-expanded)
    pub sources: Vec<PathBuf>,

    pub include_dirs: Vec<PathBuf>,

    pub macros: Vec<Macro>,

    pub library_dirs: Vec<PathBuf>,

    /// Library names; `.lib` is added when missing
    pub libraries: Vec<String>,

    /// What to link
    pub kind: TargetKind,

    /// Output file, e.g. `dist/spam.pyd`
    pub output: PathBuf,

    /// Build the Debug configuration
    pub debug: bool,

    /// Platform override (`win32`, `win-amd64`)
    pub platform: Option<String>,

    /// Intermediate directory override
    pub int_dir: Option<PathBuf>,

    /// Raw compiler flags
    pub compile_args: Vec<String>,

    /// Raw linker flags
    pub link_args: Vec<String>,
}

/// Result of a build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub project: PathBuf,
    pub link: LinkOutput,
}

/// Validate that the request names at least one existing, compilable source.
fn validate_sources(sources: &[PathBuf]) -> Result<()> {
    if sources.is_empty() {
        bail!("no source files given");
    }

    for source in sources {
        if !source.exists() {
            bail!("source file `{}` does not exist", source.display());
        }
    }

    if !sources.iter().any(|s| classify_source(s).is_some()) {
        bail!(
            "none of the given files can be compiled\n\
             hint: sources must end in .c, .cpp, .cxx, .rc or .idl"
        );
    }

    Ok(())
}

/// Compile every source into one project and link it.
pub fn build(compiler: &mut MsBuildCompiler, opts: &BuildOptions) -> Result<BuildResult> {
    validate_sources(&opts.sources)?;

    if !compiler.is_initialized() {
        compiler.initialize(opts.platform.as_deref())?;
    }

    let compile = CompileRequest {
        sources: opts.sources.clone(),
        output_dir: opts.int_dir.clone(),
        macros: opts.macros.clone(),
        include_dirs: opts.include_dirs.clone(),
        debug: opts.debug,
        extra_preargs: opts.compile_args.clone(),
        extra_postargs: Vec::new(),
    };
    let objects = compiler.compile(&compile)?;

    let link = LinkRequest {
        libraries: opts.libraries.clone(),
        library_dirs: opts.library_dirs.clone(),
        debug: opts.debug,
        extra_postargs: opts.link_args.clone(),
        ..Default::default()
    };
    let link = match opts.kind {
        TargetKind::StaticLib => {
            if !opts.libraries.is_empty() || !opts.library_dirs.is_empty() {
                tracing::warn!("libraries and library directories are ignored for static libraries");
            }
            let name = opts
                .output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let dir = opts.output.parent().filter(|p| !p.as_os_str().is_empty());
            compiler.create_static_lib(&objects, &name, dir, opts.debug)?
        }
        TargetKind::SharedLibrary => compiler.link_shared_lib(&objects, &opts.output, &link)?,
        TargetKind::SharedObject => compiler.link_shared_object(&objects, &opts.output, &link)?,
        TargetKind::Executable => compiler.link_executable(&objects, &opts.output, &link)?,
    };

    Ok(BuildResult {
        project: objects.into_iter().next().unwrap_or_default(),
        link,
    })
}
