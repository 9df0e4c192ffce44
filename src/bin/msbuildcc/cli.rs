//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use msbuildcc::util::shell::ColorChoice;

/// msbuildcc - build C/C++ sources through MSBuild
#[derive(Parser)]
#[command(name = "msbuildcc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile sources and link them into one output
    Build(BuildArgs),

    /// List discovered toolchain instances
    Instances(InstancesArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Source files or glob patterns
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// What to link: static-lib, shared-lib, shared-object, exe
    #[arg(long, default_value = "shared-object")]
    pub kind: String,

    /// Add an include directory
    #[arg(short = 'I', value_name = "DIR")]
    pub include: Vec<PathBuf>,

    /// Define a macro (NAME or NAME=VALUE)
    #[arg(short = 'D', value_name = "MACRO")]
    pub define: Vec<String>,

    /// Undefine a macro
    #[arg(short = 'U', value_name = "NAME")]
    pub undefine: Vec<String>,

    /// Add a library search directory
    #[arg(short = 'L', value_name = "DIR")]
    pub library_dir: Vec<PathBuf>,

    /// Link against a library
    #[arg(short = 'l', value_name = "NAME")]
    pub library: Vec<String>,

    /// Build the Debug configuration
    #[arg(long)]
    pub debug: bool,

    /// Target platform: win32, win-amd64
    #[arg(long)]
    pub platform: Option<String>,

    /// Instance manifest to discover toolchains from
    #[arg(long, value_name = "FILE")]
    pub instances: Option<PathBuf>,

    /// Intermediate directory for objects and the project file
    #[arg(long, value_name = "DIR")]
    pub int_dir: Option<PathBuf>,

    /// Write the project file but do not run MSBuild
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct InstancesArgs {
    /// Instance manifest to discover toolchains from
    #[arg(long, value_name = "FILE")]
    pub instances: Option<PathBuf>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}
