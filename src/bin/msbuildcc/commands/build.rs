//! `msbuildcc build` command

use anyhow::{anyhow, Result};

use crate::cli::BuildArgs;
use msbuildcc::builder::Macro;
use msbuildcc::ops::msbuild_build::{build, BuildOptions};
use msbuildcc::util::fs::glob_files;
use msbuildcc::util::shell::Status;
use msbuildcc::util::Shell;
use msbuildcc::{DriverSettings, MsBuildCompiler, TargetKind};

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = super::current_config()?;
    let cache = super::instance_cache(args.instances.as_deref(), &config);

    let kind = args.kind.parse::<TargetKind>().map_err(|e| anyhow!(e))?;

    // CLI overrides config
    let mut settings = DriverSettings::from_config(&config)?;
    if args.dry_run {
        settings.dry_run = true;
    }
    let dry_run = settings.dry_run;

    let mut macros: Vec<Macro> = args.define.iter().map(|d| Macro::parse_define(d)).collect();
    macros.extend(args.undefine.iter().map(Macro::undefine));

    let opts = BuildOptions {
        sources: glob_files(&cwd, &args.sources)?,
        include_dirs: args.include,
        macros,
        library_dirs: args.library_dir,
        libraries: args.library,
        kind,
        output: args.output,
        debug: args.debug,
        platform: args.platform,
        int_dir: args.int_dir,
        compile_args: Vec::new(),
        link_args: Vec::new(),
    };

    let mut compiler = MsBuildCompiler::new(cache, settings);
    let spinner = shell.spinner(
        Status::Building,
        format!("{} ({} sources)", opts.output.display(), opts.sources.len()),
    );
    let result = build(&mut compiler, &opts);
    let elapsed = spinner.finish();
    let result = result?;

    if dry_run {
        shell.status(Status::Generated, result.project.display());
    } else {
        shell.status(
            Status::Finished,
            format!("`{}` in {}", result.link.artifact.display(), elapsed),
        );
    }

    Ok(())
}
