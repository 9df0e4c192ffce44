//! The MSBuild compiler driver.
//!
//! [`MsBuildCompiler`] owns one long-lived option record per kind. Each
//! `compile` or `link` call clones the records it needs, applies the request
//! to the clones, merges them into a project document and, for links, runs
//! `msbuild.exe` on it. `compile` writes one project per request holding
//! every source; `link` re-opens that project, adds the link settings and
//! builds it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::builder::errors::DriverError;
use crate::builder::options::{OptionKind, Options};
use crate::builder::project::{ProjectDescriptor, ProjectItem};
use crate::builder::request::{CompileRequest, LinkOutput, LinkRequest, Macro};
use crate::core::instance::format_version_info;
use crate::core::platform::{Platform, TargetKind};
use crate::toolchain::{InstanceCache, ToolPaths};
use crate::util::config::Config;
use crate::util::diagnostic::{Diagnostic, DiagnosticSink, TracingSink};
use crate::util::fs::{absolute, dir_with_separator, ensure_dir, read_to_string};
use crate::util::process::ProcessBuilder;

/// File name of the project written by `compile`.
pub const PROJECT_FILE_NAME: &str = "build.g.vcxproj";

const MSBUILD: &str = "msbuild.exe";
const COMPILER: &str = "cl.exe";

/// SDK version used when no Windows SDK instance was discovered.
const FALLBACK_SDK_VERSION: &str = "8.1";

/// Compiler path fragments and the toolset they imply. Paths that match
/// none of these keep the record default (`v140`).
const TOOLSET_FRAGMENTS: &[(&str, &str)] = &[
    ("MSVC\\14.1", "v141"),
    ("MSVC\\14.2", "v142"),
    ("MSVC\\14.3", "v143"),
];

/// Driver settings that do not change between requests.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Platform used when `compile` initializes the driver itself.
    pub platform: Option<Platform>,
    pub platform_toolset: Option<String>,
    pub windows_sdk_version: Option<String>,
    /// `IntDir` for compiles that name no output directory.
    pub intermediate_dir: PathBuf,
    /// Shared objects with this extension are linked as DLLs.
    pub module_extension: String,
    /// Write projects but never run the orchestrator.
    pub dry_run: bool,
    /// Items added to every project, as (item type, item).
    pub items: Vec<(String, ProjectItem)>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        DriverSettings {
            platform: None,
            platform_toolset: None,
            windows_sdk_version: None,
            intermediate_dir: PathBuf::from("build"),
            module_extension: ".pyd".to_string(),
            dry_run: false,
            items: Vec::new(),
        }
    }
}

impl DriverSettings {
    /// Settings from the `[driver]` section of a config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let driver = &config.driver;
        let defaults = DriverSettings::default();

        let mut items = Vec::new();
        for (item_type, values) in &driver.items {
            for value in values {
                let item = ProjectItem::from_toml(value)
                    .with_context(|| format!("invalid `{}` item in configuration", item_type))?;
                items.push((item_type.clone(), item));
            }
        }

        Ok(DriverSettings {
            platform: config.platform()?,
            platform_toolset: driver.platform_toolset.clone(),
            windows_sdk_version: driver.windows_sdk_version.clone(),
            intermediate_dir: driver
                .intermediate_dir
                .clone()
                .unwrap_or(defaults.intermediate_dir),
            module_extension: driver
                .module_extension
                .clone()
                .unwrap_or(defaults.module_extension),
            dry_run: driver.dry_run,
            items,
        })
    }
}

/// State fixed by `initialize`.
#[derive(Debug)]
struct Toolchain {
    platform: Platform,
    tools: ToolPaths,
    msbuild: PathBuf,
}

/// Drives `msbuild.exe` through generated project files.
pub struct MsBuildCompiler {
    cache: Arc<InstanceCache>,
    settings: DriverSettings,

    global: Options,
    output: Options,
    cl: Options,
    link: Options,
    lib: Options,
    rc: Options,
    midl: Options,

    additional_items: Vec<(String, ProjectItem)>,
    toolchain: Option<Toolchain>,
    sink: Box<dyn DiagnosticSink>,
}

impl MsBuildCompiler {
    pub fn new(cache: Arc<InstanceCache>, settings: DriverSettings) -> Self {
        let mut global = Options::new(OptionKind::Global);
        if let Some(toolset) = &settings.platform_toolset {
            global.overwrite("PlatformToolset", toolset.as_str());
        }
        if let Some(version) = &settings.windows_sdk_version {
            global.overwrite("DefaultWindowsSDKVersion", version.as_str());
        }

        MsBuildCompiler {
            cache,
            additional_items: settings.items.clone(),
            settings,
            global,
            output: Options::new(OptionKind::Output),
            cl: Options::new(OptionKind::ClCompile),
            link: Options::new(OptionKind::Link),
            lib: Options::new(OptionKind::Lib),
            rc: Options::new(OptionKind::ResourceCompile),
            midl: Options::new(OptionKind::Midl),
            toolchain: None,
            sink: Box::new(TracingSink),
        }
    }

    /// Send build diagnostics to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.toolchain.is_some()
    }

    /// The platform chosen by `initialize`.
    pub fn platform(&self) -> Option<Platform> {
        self.toolchain.as_ref().map(|t| t.platform)
    }

    /// The merged tool map chosen by `initialize`.
    pub fn tool_paths(&self) -> Option<&ToolPaths> {
        self.toolchain.as_ref().map(|t| &t.tools)
    }

    /// The long-lived record of `kind`.
    pub fn options(&self, kind: OptionKind) -> &Options {
        match kind {
            OptionKind::Global => &self.global,
            OptionKind::Output => &self.output,
            OptionKind::ClCompile => &self.cl,
            OptionKind::Link => &self.link,
            OptionKind::Lib => &self.lib,
            OptionKind::ResourceCompile => &self.rc,
            OptionKind::Midl => &self.midl,
        }
    }

    /// Mutable access to the long-lived record of `kind`. Changes apply to
    /// every later request.
    pub fn options_mut(&mut self, kind: OptionKind) -> &mut Options {
        match kind {
            OptionKind::Global => &mut self.global,
            OptionKind::Output => &mut self.output,
            OptionKind::ClCompile => &mut self.cl,
            OptionKind::Link => &mut self.link,
            OptionKind::Lib => &mut self.lib,
            OptionKind::ResourceCompile => &mut self.rc,
            OptionKind::Midl => &mut self.midl,
        }
    }

    /// Select the toolchain for `platform` (or the configured/host default).
    pub fn initialize(&mut self, platform: Option<&str>) -> Result<()> {
        if self.toolchain.is_some() {
            return Err(DriverError::AlreadyInitialized.into());
        }

        let platform = match platform {
            Some(name) => name.parse::<Platform>()?,
            None => self.settings.platform.unwrap_or_else(Platform::host),
        };
        for options in [
            &mut self.global,
            &mut self.output,
            &mut self.cl,
            &mut self.link,
            &mut self.lib,
            &mut self.rc,
            &mut self.midl,
        ] {
            options.for_platform(platform);
        }

        let packages = platform.required_packages();
        let instances = self.cache.find_with_any(packages)?;
        if instances.is_empty() {
            return Err(DriverError::ToolchainNotFound {
                packages: packages.iter().map(|p| p.to_string()).collect(),
            }
            .into());
        }

        let tools = ToolPaths::overlay(&instances);
        let msbuild = tools
            .get(MSBUILD)
            .ok_or_else(|| DriverError::ToolNotFound {
                tool: MSBUILD.to_string(),
            })?
            .to_path_buf();

        if self.settings.platform_toolset.is_none() {
            if let Some(toolset) = tools.get(COMPILER).and_then(detect_toolset) {
                self.global.overwrite("PlatformToolset", toolset);
            }
        }

        if self.global.get("DefaultWindowsSDKVersion").unwrap_or_default().is_empty() {
            let version = instances
                .iter()
                .filter(|i| i.is_sdk())
                .map(|i| i.version_info())
                .max()
                .filter(|v| !v.is_empty())
                .map(format_version_info)
                .unwrap_or_else(|| FALLBACK_SDK_VERSION.to_string());
            self.global.overwrite("DefaultWindowsSDKVersion", version);
        }

        tracing::debug!(
            "initialized for {} using {} ({} instance(s), toolset {})",
            platform,
            msbuild.display(),
            instances.len(),
            self.global.get("PlatformToolset").unwrap_or_default()
        );

        self.toolchain = Some(Toolchain {
            platform,
            tools,
            msbuild,
        });
        Ok(())
    }

    /// Path of `tool` for the initialized platform.
    pub fn find_exe(&self, tool: &str) -> Result<PathBuf> {
        let toolchain = self.toolchain.as_ref().ok_or(DriverError::NotInitialized)?;
        toolchain
            .tools
            .find_exe(tool, toolchain.platform)
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                DriverError::ToolNotFound {
                    tool: tool.to_string(),
                }
                .into()
            })
    }

    /// Add include directories to every compile-kind record.
    pub fn set_include_dirs<P: AsRef<Path>>(&mut self, dirs: &[P]) -> Result<()> {
        let dirs: Vec<String> = dirs.iter().map(|d| path_text(d.as_ref())).collect();
        for options in [&mut self.cl, &mut self.rc, &mut self.midl] {
            options.accumulate("AdditionalIncludeDirectories", &dirs, ";")?;
        }
        Ok(())
    }

    /// Add libraries to every later link. Names are used as given.
    pub fn set_libraries<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for options in [&mut self.link, &mut self.lib] {
            options.accumulate("AdditionalDependencies", names, ";")?;
        }
        Ok(())
    }

    pub fn set_library_dirs<P: AsRef<Path>>(&mut self, dirs: &[P]) -> Result<()> {
        let dirs: Vec<String> = dirs.iter().map(|d| path_text(d.as_ref())).collect();
        for options in [&mut self.link, &mut self.lib] {
            options.accumulate("AdditionalLibraryDirectories", &dirs, ";")?;
        }
        Ok(())
    }

    /// Link these objects into every later build, as absolute `Link` items.
    pub fn set_link_objects<P: AsRef<Path>>(&mut self, objects: &[P]) -> Result<()> {
        for object in objects {
            let object = absolute(object.as_ref())?;
            self.add_item("Link", ProjectItem::path(path_text(&object)));
        }
        Ok(())
    }

    /// Define `name` for every later compile; no value means `name=1`.
    pub fn define_macro(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let definition = Macro::define(name, value.unwrap_or_default()).definition();
        for options in [&mut self.cl, &mut self.rc, &mut self.midl] {
            options.accumulate("PreprocessorDefinitions", &definition, ";")?;
        }
        Ok(())
    }

    pub fn undefine_macro(&mut self, name: &str) -> Result<()> {
        for options in [&mut self.cl, &mut self.rc, &mut self.midl] {
            options.accumulate("UndefinePreprocessorDefinitions", [name], ";")?;
        }
        Ok(())
    }

    /// Add an item of `item_type` to every later project.
    pub fn add_item(&mut self, item_type: impl Into<String>, item: ProjectItem) {
        self.additional_items.push((item_type.into(), item));
    }

    /// Write a project holding every source of `request`.
    ///
    /// Returns a one-element list with the project path; that path is the
    /// object to pass to [`MsBuildCompiler::link`].
    pub fn compile(&mut self, request: &CompileRequest) -> Result<Vec<PathBuf>> {
        if self.toolchain.is_none() {
            self.initialize(None)?;
        }

        let mut global = self.global.clone();
        let mut records = [self.cl.clone(), self.rc.clone(), self.midl.clone()];

        if request.debug {
            global.for_debug();
            for options in &mut records {
                options.for_debug();
            }
        }

        let definitions: Vec<String> = request.macros.iter().filter_map(Macro::definition).collect();
        let undefines: Vec<&str> = request
            .macros
            .iter()
            .filter_map(|m| match m {
                Macro::Undefine(name) => Some(name.as_str()),
                Macro::Define { .. } => None,
            })
            .collect();
        let include_dirs: Vec<String> = request
            .include_dirs
            .iter()
            .map(|d| path_text(d))
            .collect();
        let extra_args = request.extra_preargs.iter().chain(&request.extra_postargs);

        for options in &mut records {
            options.accumulate("PreprocessorDefinitions", &definitions, ";")?;
            options.accumulate("UndefinePreprocessorDefinitions", &undefines, ";")?;
            options.accumulate("AdditionalIncludeDirectories", &include_dirs, ";")?;
            options.accumulate("AdditionalOptions", extra_args.clone(), " ")?;
        }

        let int_dir = match &request.output_dir {
            Some(dir) => absolute(dir)?,
            None => match global.get("IntDir").filter(|d| !d.is_empty()) {
                Some(dir) => PathBuf::from(dir),
                None => absolute(&self.settings.intermediate_dir)?,
            },
        };
        global.overwrite("IntDir", dir_with_separator(&int_dir));

        let mut project = ProjectDescriptor::from_template()?;
        project.merge_all(records.iter().chain([&global]))?;

        let mut items: BTreeMap<String, Vec<ProjectItem>> = BTreeMap::new();
        for source in &request.sources {
            match classify_source(source) {
                Some(item_type) => {
                    let source = absolute(source)?;
                    items
                        .entry(item_type.to_string())
                        .or_default()
                        .push(ProjectItem::path(path_text(&source)));
                }
                None => tracing::debug!("skipping `{}`: not a compilable source", source.display()),
            }
        }
        for (item_type, item) in &self.additional_items {
            items.entry(item_type.clone()).or_default().push(item.clone());
        }
        for (item_type, list) in &items {
            project.add_items(item_type, list)?;
        }

        ensure_dir(&int_dir)?;
        let project_path = int_dir.join(PROJECT_FILE_NAME);
        project.serialize(&project_path)?;
        tracing::debug!("wrote {}", project_path.display());

        Ok(vec![project_path])
    }

    /// Add link settings to the project in `objects[0]` and build it.
    pub fn link(
        &mut self,
        kind: TargetKind,
        objects: &[PathBuf],
        output: &Path,
        request: &LinkRequest,
    ) -> Result<LinkOutput> {
        let msbuild = self
            .toolchain
            .as_ref()
            .ok_or(DriverError::NotInitialized)?
            .msbuild
            .clone();
        let project_path = objects.first().ok_or(DriverError::NoLinkObjects)?;

        let out_dir = match &request.output_dir {
            Some(dir) => absolute(dir)?,
            None => parent_dir(output)?,
        };
        let target_name = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target_ext = output
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut out = self.output.clone();
        out.overwrite("OutDir", dir_with_separator(&out_dir));
        out.overwrite("TargetName", target_name.as_str());
        out.overwrite("TargetExt", target_ext.as_str());
        out.overwrite("ConfigurationType", kind.configuration_type());

        let mut linkers = [self.link.clone(), self.lib.clone()];
        let mut global = self.global.clone();

        if request.debug {
            global.for_debug();
            out.for_debug();
            for options in &mut linkers {
                options.for_debug();
            }
        }

        let libraries: Vec<String> = request.libraries.iter().map(|l| ensure_lib(l)).collect();
        let library_dirs: Vec<String> = request
            .library_dirs
            .iter()
            .map(|d| path_text(d))
            .collect();
        for options in &mut linkers {
            options.accumulate("AdditionalDependencies", &libraries, ";")?;
            options.accumulate("AdditionalLibraryDirectories", &library_dirs, ";")?;
        }
        linkers[0].accumulate(
            "AdditionalOptions",
            request.extra_preargs.iter().chain(&request.extra_postargs),
            " ",
        )?;

        if kind == TargetKind::SharedObject
            && target_ext.eq_ignore_ascii_case(&self.settings.module_extension)
        {
            for options in &mut linkers {
                options.overwrite_if_present("LinkDLL", "true");
            }
        }

        let int_dir = match &request.build_temp {
            Some(dir) => absolute(dir)?,
            None => match global.get("IntDir").filter(|d| !d.is_empty()) {
                Some(dir) => PathBuf::from(dir),
                None => parent_dir(project_path)?,
            },
        };
        let int_dir_text = dir_with_separator(&int_dir);
        global.overwrite("IntDir", int_dir_text.as_str());

        let mut project = ProjectDescriptor::load(project_path)?;
        // a re-linked project keeps nothing from the previous link
        for options in &linkers {
            project.clear_item_definitions(options.kind().role())?;
        }
        project.merge_all(linkers.iter().chain([&out, &global]))?;
        project.serialize(project_path)?;

        let verbose_log = PathBuf::from(format!("{}verbose.log", int_dir_text));
        let errors_log = PathBuf::from(format!("{}errors.log", int_dir_text));
        let cmd = ProcessBuilder::new(&msbuild).args([
            "/nologo".to_string(),
            "/noconlog".to_string(),
            format!(
                "/flp1:LogFile={};Verbosity=detailed;Encoding=UTF-8",
                verbose_log.display()
            ),
            format!(
                "/flp2:LogFile={};ErrorsOnly;WarningsOnly;Encoding=UTF-8",
                errors_log.display()
            ),
            path_text(project_path),
        ]);
        tracing::info!("{}", cmd.display_command());

        let result = LinkOutput {
            kind,
            project: project_path.clone(),
            artifact: out_dir.join(format!("{}{}", target_name, target_ext)),
            verbose_log,
            errors_log,
        };
        if self.settings.dry_run {
            return Ok(result);
        }

        ensure_dir(&int_dir)?;
        ensure_dir(&out_dir)?;
        let status = cmd.status()?;
        if !status.success() {
            self.report_failure(status.code(), &result.errors_log);
            return Err(DriverError::BuildFailed {
                exit_code: status.code(),
                verbose_log: result.verbose_log,
            }
            .into());
        }
        Ok(result)
    }

    /// Forward the orchestrator's errors-and-warnings log to the sink.
    fn report_failure(&mut self, exit_code: Option<i32>, errors_log: &Path) {
        let code = exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string());
        self.sink
            .emit(Diagnostic::error(format!("Build returned exit code {}", code)));

        let text = match read_to_string(errors_log) {
            Ok(text) => text,
            Err(e) => {
                self.sink.emit(
                    Diagnostic::warning(format!("could not read build errors: {:#}", e))
                        .with_location(errors_log),
                );
                return;
            }
        };
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.sink.emit(Diagnostic::from_build_log_line(line));
        }
    }

    /// Build a static library called `name.lib`.
    pub fn create_static_lib(
        &mut self,
        objects: &[PathBuf],
        name: &str,
        output_dir: Option<&Path>,
        debug: bool,
    ) -> Result<LinkOutput> {
        let request = LinkRequest {
            output_dir: output_dir.map(Path::to_path_buf),
            debug,
            ..Default::default()
        };
        self.link(
            TargetKind::StaticLib,
            objects,
            Path::new(&format!("{}.lib", name)),
            &request,
        )
    }

    pub fn link_shared_lib(
        &mut self,
        objects: &[PathBuf],
        output: &Path,
        request: &LinkRequest,
    ) -> Result<LinkOutput> {
        self.link(TargetKind::SharedLibrary, objects, output, request)
    }

    pub fn link_shared_object(
        &mut self,
        objects: &[PathBuf],
        output: &Path,
        request: &LinkRequest,
    ) -> Result<LinkOutput> {
        self.link(TargetKind::SharedObject, objects, output, request)
    }

    /// Link an executable. `build_temp` is not used for executables.
    pub fn link_executable(
        &mut self,
        objects: &[PathBuf],
        output: &Path,
        request: &LinkRequest,
    ) -> Result<LinkOutput> {
        let request = LinkRequest {
            build_temp: None,
            ..request.clone()
        };
        self.link(TargetKind::Executable, objects, output, &request)
    }
}

impl std::fmt::Debug for MsBuildCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MsBuildCompiler")
            .field("settings", &self.settings)
            .field("toolchain", &self.toolchain)
            .finish_non_exhaustive()
    }
}

/// The item type a source compiles as, by extension.
pub fn classify_source(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "c" | "cpp" | "cxx" => Some("ClCompile"),
        "rc" => Some("ResourceCompile"),
        "idl" => Some("Midl"),
        _ => None,
    }
}

/// The toolset implied by a compiler path, if it is a known one.
pub fn detect_toolset(compiler: &Path) -> Option<&'static str> {
    let text = compiler.to_string_lossy().replace('/', "\\");
    TOOLSET_FRAGMENTS
        .iter()
        .find(|(fragment, _)| text.contains(fragment))
        .map(|(_, toolset)| *toolset)
}

/// Give a bare library name the `.lib` extension.
fn ensure_lib(name: &str) -> String {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("lib") | Some("obj") => name.to_string(),
        _ => format!("{}.lib", name),
    }
}

/// Absolute directory holding `path`; the current directory for a bare name.
fn parent_dir(path: &Path) -> Result<PathBuf> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => absolute(parent),
        None => std::env::current_dir().context("failed to read the current directory"),
    }
}

fn path_text(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::errors::ErrorKind;
    use crate::test_support::*;
    use crate::toolchain::StaticSource;
    use crate::util::diagnostic::{CollectSink, Severity};
    use tempfile::TempDir;

    fn driver(instances: Vec<crate::core::instance::ToolchainInstance>) -> MsBuildCompiler {
        let cache = Arc::new(InstanceCache::new(StaticSource::new(instances)));
        MsBuildCompiler::new(cache, DriverSettings::default())
    }

    fn driver_error(err: &anyhow::Error) -> &DriverError {
        err.downcast_ref::<DriverError>().expect("a driver error")
    }

    #[test]
    fn test_initialize_win32_derives_toolset() {
        let vs = instance(
            "vs2017",
            "1.0",
            &["Microsoft.VisualCpp.Tools.HostX86.TargetX86"],
            &[
                ("msbuild.exe", "C:\\BT\\MSBuild.exe"),
                ("cl.exe", "C:\\BT\\VC\\Tools\\MSVC\\14.16.27023\\bin\\HostX86\\x86\\cl.exe"),
            ],
        );
        let mut cc = driver(vec![vs]);
        cc.initialize(Some("win32")).unwrap();

        assert_eq!(cc.platform(), Some(Platform::Win32));
        let global = cc.options(OptionKind::Global);
        assert_eq!(global.get("PlatformToolset"), Some("v141"));
        assert_eq!(global.get("Platform"), Some("Win32"));
        assert_eq!(global.get("DefaultWindowsSDKVersion"), Some("8.1"));
    }

    #[test]
    fn test_unsupported_platform_fails_before_discovery() {
        let source = CountingSource::new(vec![vs2017()]);
        let calls = source.calls();
        let mut cc = MsBuildCompiler::new(
            Arc::new(InstanceCache::new(source)),
            DriverSettings::default(),
        );

        let err = cc.initialize(Some("arm64")).unwrap_err();
        assert_eq!(driver_error(&err).kind(), ErrorKind::Configuration);
        assert_eq!(calls.get(), 0);
        assert!(!cc.is_initialized());
    }

    #[test]
    fn test_initialize_twice_fails() {
        let mut cc = driver(vec![vs2017()]);
        cc.initialize(Some("win-amd64")).unwrap();
        let err = cc.initialize(Some("win-amd64")).unwrap_err();
        assert!(matches!(driver_error(&err), DriverError::AlreadyInitialized));
    }

    #[test]
    fn test_no_matching_instances() {
        let mut cc = driver(vec![instance("other", "1.0", &["Unrelated"], &[])]);
        let err = cc.initialize(Some("win32")).unwrap_err();
        let err = driver_error(&err);
        assert_eq!(err.kind(), ErrorKind::ToolchainNotFound);
        assert!(err.to_diagnostic().format(false).contains("aka.ms/vcpython"));
    }

    #[test]
    fn test_missing_msbuild() {
        let mut cc = driver(vec![instance("vs", "15.0", &["Microsoft.Build"], &[])]);
        let err = cc.initialize(Some("win32")).unwrap_err();
        assert!(matches!(driver_error(&err), DriverError::ToolNotFound { tool } if tool == "msbuild.exe"));
    }

    #[test]
    fn test_discovery_failure_propagates() {
        let mut cc = MsBuildCompiler::new(
            Arc::new(InstanceCache::new(FailingSource)),
            DriverSettings::default(),
        );
        let err = cc.initialize(Some("win32")).unwrap_err();
        assert!(err.to_string().contains("registry is unavailable"));
    }

    #[test]
    fn test_sdk_version_is_newest_sdk() {
        let mut cc = driver(vec![
            vs2015(),
            winsdk10("10.0.17134.0"),
            winsdk10("10.0.17763.0"),
        ]);
        cc.initialize(Some("win32")).unwrap();
        let global = cc.options(OptionKind::Global);
        assert_eq!(global.get("DefaultWindowsSDKVersion"), Some("10.0.17763.0"));
        assert_eq!(global.get("PlatformToolset"), Some("v140"));
    }

    #[test]
    fn test_configured_values_win() {
        let settings = DriverSettings {
            platform_toolset: Some("v142".to_string()),
            windows_sdk_version: Some("10.0.19041.0".to_string()),
            ..Default::default()
        };
        let cache = Arc::new(InstanceCache::new(StaticSource::new(vec![
            vs2017(),
            winsdk10("10.0.17763.0"),
        ])));
        let mut cc = MsBuildCompiler::new(cache, settings);
        cc.initialize(Some("win32")).unwrap();

        let global = cc.options(OptionKind::Global);
        assert_eq!(global.get("PlatformToolset"), Some("v142"));
        assert_eq!(global.get("DefaultWindowsSDKVersion"), Some("10.0.19041.0"));
    }

    #[test]
    fn test_find_exe() {
        let mut cc = driver(vec![vs2017()]);
        assert!(cc.find_exe("lib.exe").is_err());

        cc.initialize(Some("win-amd64")).unwrap();
        let lib = cc.find_exe("lib.exe").unwrap();
        assert!(lib.to_string_lossy().ends_with("x64\\lib.exe"));

        let err = cc.find_exe("dumpbin.exe").unwrap_err();
        assert_eq!(
            err.to_string(),
            "dumpbin.exe is not available on this platform"
        );
    }

    #[test]
    fn test_compile_classifies_sources() {
        let tmp = TempDir::new().unwrap();
        let mut cc = driver(vec![vs2017()]);
        cc.initialize(Some("win32")).unwrap();

        let request = CompileRequest {
            output_dir: Some(tmp.path().join("obj")),
            ..CompileRequest::new(["a.c", "b.rc", "c.unknown"])
        };
        let objects = cc.compile(&request).unwrap();
        assert_eq!(objects, vec![tmp.path().join("obj").join(PROJECT_FILE_NAME)]);

        let project = ProjectDescriptor::load(&objects[0]).unwrap();
        let cl = project.items("ClCompile");
        let rc = project.items("ResourceCompile");
        assert_eq!(cl.len(), 1);
        assert_eq!(rc.len(), 1);
        assert!(cl[0].attr("Include").unwrap().ends_with("a.c"));
        assert!(rc[0].attr("Include").unwrap().ends_with("b.rc"));
        assert!(project.items("Midl").is_empty());
        assert!(!project.to_xml_string().unwrap().contains("c.unknown"));
    }

    #[test]
    fn test_compile_applies_request() {
        let tmp = TempDir::new().unwrap();
        let mut cc = driver(vec![vs2017()]);
        cc.initialize(Some("win32")).unwrap();
        cc.define_macro("GLOBAL_DEF", None).unwrap();

        let request = CompileRequest {
            output_dir: Some(tmp.path().to_path_buf()),
            macros: vec![
                Macro::define("NDEBUG", ""),
                Macro::define("VERSION", "2"),
                Macro::undefine("DEBUG"),
            ],
            include_dirs: vec![PathBuf::from("include")],
            debug: true,
            extra_preargs: vec!["/W4".to_string()],
            extra_postargs: vec!["/GS".to_string()],
            ..CompileRequest::new(["x.cpp"])
        };
        let objects = cc.compile(&request).unwrap();
        let project = ProjectDescriptor::load(&objects[0]).unwrap();

        assert_eq!(
            project.item_definitions("ClCompile", "PreprocessorDefinitions"),
            vec!["%(PreprocessorDefinitions);GLOBAL_DEF=1;NDEBUG=1;VERSION=2".to_string()]
        );
        assert_eq!(
            project.item_definitions("Midl", "UndefinePreprocessorDefinitions"),
            vec!["%(UndefinePreprocessorDefinitions);DEBUG".to_string()]
        );
        assert_eq!(
            project.item_definitions("ResourceCompile", "AdditionalIncludeDirectories"),
            vec!["%(AdditionalIncludeDirectories);include".to_string()]
        );
        assert_eq!(
            project.item_definitions("ClCompile", "AdditionalOptions"),
            vec!["%(AdditionalOptions) /W4 /GS".to_string()]
        );
        assert_eq!(
            project.item_definitions("ClCompile", "Optimization"),
            vec!["Disabled".to_string()]
        );
        assert_eq!(project.project_configuration(), Some("Debug|Win32"));
        assert_eq!(
            project.property("Globals", "IntDir"),
            Some(dir_with_separator(tmp.path()))
        );

        // per-request state never leaks into the driver's records
        assert_eq!(
            cc.options(OptionKind::ClCompile).get("Optimization"),
            Some("MaxSpeed")
        );
    }

    #[test]
    fn test_compile_auto_initializes() {
        let tmp = TempDir::new().unwrap();
        let settings = DriverSettings {
            platform: Some(Platform::WinAmd64),
            ..Default::default()
        };
        let cache = Arc::new(InstanceCache::new(StaticSource::new(vec![vs2017()])));
        let mut cc = MsBuildCompiler::new(cache, settings);

        let request = CompileRequest {
            output_dir: Some(tmp.path().to_path_buf()),
            ..CompileRequest::new(["m.c"])
        };
        cc.compile(&request).unwrap();
        assert_eq!(cc.platform(), Some(Platform::WinAmd64));
    }

    #[test]
    fn test_compile_adds_link_objects_and_items() {
        let tmp = TempDir::new().unwrap();
        let mut cc = driver(vec![vs2017()]);
        cc.initialize(Some("win32")).unwrap();
        cc.set_link_objects(&["extra.obj"]).unwrap();
        cc.add_item(
            "Content",
            ProjectItem::with_metadata("data.bin", [("CopyToOutputDirectory", "PreserveNewest")]),
        );

        let request = CompileRequest {
            output_dir: Some(tmp.path().to_path_buf()),
            ..CompileRequest::new(["a.c"])
        };
        let objects = cc.compile(&request).unwrap();
        let project = ProjectDescriptor::load(&objects[0]).unwrap();

        let link = project.items("Link");
        assert_eq!(link.len(), 1);
        assert!(Path::new(link[0].attr("Include").unwrap()).is_absolute());
        assert_eq!(project.items("Content").len(), 1);
    }

    #[test]
    fn test_link_before_initialize() {
        let mut cc = driver(vec![vs2017()]);
        let err = cc
            .link(
                TargetKind::SharedLibrary,
                &[PathBuf::from("x.vcxproj")],
                Path::new("x.dll"),
                &LinkRequest::default(),
            )
            .unwrap_err();
        assert!(matches!(driver_error(&err), DriverError::NotInitialized));
    }

    #[test]
    fn test_link_without_objects() {
        let mut cc = driver(vec![vs2017()]);
        cc.initialize(Some("win32")).unwrap();
        let err = cc
            .link(
                TargetKind::SharedLibrary,
                &[],
                Path::new("x.dll"),
                &LinkRequest::default(),
            )
            .unwrap_err();
        assert!(matches!(driver_error(&err), DriverError::NoLinkObjects));
    }

    fn dry_run_driver() -> MsBuildCompiler {
        let settings = DriverSettings {
            dry_run: true,
            ..Default::default()
        };
        let cache = Arc::new(InstanceCache::new(StaticSource::new(vec![vs2017()])));
        let mut cc = MsBuildCompiler::new(cache, settings);
        cc.initialize(Some("win32")).unwrap();
        cc
    }

    #[test]
    fn test_link_shared_object_merges_in_place() {
        let tmp = TempDir::new().unwrap();
        let mut cc = dry_run_driver();
        let objects = cc
            .compile(&CompileRequest {
                output_dir: Some(tmp.path().join("temp")),
                ..CompileRequest::new(["spam.c"])
            })
            .unwrap();

        let request = LinkRequest {
            libraries: vec!["kernel32".to_string(), "python3.lib".to_string(), "x.obj".to_string()],
            library_dirs: vec![PathBuf::from("libs")],
            extra_postargs: vec!["/MANIFEST".to_string()],
            ..Default::default()
        };
        let output = tmp.path().join("dist").join("spam.pyd");
        let result = cc.link_shared_object(&objects, &output, &request).unwrap();

        assert_eq!(result.project, objects[0]);
        assert_eq!(result.artifact, output);
        assert_eq!(
            result.verbose_log,
            PathBuf::from(format!("{}verbose.log", dir_with_separator(&tmp.path().join("temp"))))
        );

        let project = ProjectDescriptor::load(&objects[0]).unwrap();
        // compile-phase content is kept
        assert_eq!(project.items("ClCompile").len(), 1);
        assert_eq!(project.property("Outputs", "TargetName").as_deref(), Some("spam"));
        assert_eq!(project.property("Outputs", "TargetExt").as_deref(), Some(".pyd"));
        assert_eq!(
            project.property("Outputs", "ConfigurationType").as_deref(),
            Some("DynamicLibrary")
        );
        assert_eq!(
            project.property("Outputs", "OutDir"),
            Some(dir_with_separator(&tmp.path().join("dist")))
        );
        assert_eq!(project.item_definitions("Link", "LinkDLL"), vec!["true".to_string()]);
        assert!(project.item_definitions("Lib", "LinkDLL").is_empty());
        assert_eq!(
            project.item_definitions("Link", "AdditionalDependencies"),
            vec!["%(AdditionalDependencies);kernel32.lib;python3.lib;x.obj".to_string()]
        );
        assert_eq!(
            project.item_definitions("Lib", "AdditionalLibraryDirectories"),
            vec!["%(AdditionalLibraryDirectories);libs".to_string()]
        );
        assert_eq!(
            project.item_definitions("Link", "AdditionalOptions"),
            vec!["%(AdditionalOptions) /MANIFEST".to_string()]
        );
        // IntDir survives the global merge
        assert_eq!(
            project.property("Globals", "IntDir"),
            Some(dir_with_separator(&tmp.path().join("temp")))
        );
    }

    #[test]
    fn test_link_kinds() {
        let tmp = TempDir::new().unwrap();
        let mut cc = dry_run_driver();
        let objects = cc
            .compile(&CompileRequest {
                output_dir: Some(tmp.path().to_path_buf()),
                ..CompileRequest::new(["a.c"])
            })
            .unwrap();

        let result = cc
            .create_static_lib(&objects, "util", Some(tmp.path()), false)
            .unwrap();
        assert_eq!(result.artifact, tmp.path().join("util.lib"));
        let project = ProjectDescriptor::load(&objects[0]).unwrap();
        assert_eq!(
            project.property("Outputs", "ConfigurationType").as_deref(),
            Some("StaticLibrary")
        );

        cc.link_executable(&objects, &tmp.path().join("app.exe"), &LinkRequest::default())
            .unwrap();
        let project = ProjectDescriptor::load(&objects[0]).unwrap();
        assert_eq!(
            project.property("Outputs", "ConfigurationType").as_deref(),
            Some("Application")
        );

        // a shared library never gets LinkDLL from its extension
        cc.link_shared_lib(&objects, &tmp.path().join("other.pyd"), &LinkRequest::default())
            .unwrap();
        let project = ProjectDescriptor::load(&objects[0]).unwrap();
        assert!(project.item_definitions("Link", "LinkDLL").is_empty());
    }

    #[test]
    fn test_relink_drops_previous_link_settings() {
        let tmp = TempDir::new().unwrap();
        let mut cc = dry_run_driver();
        let objects = cc
            .compile(&CompileRequest {
                output_dir: Some(tmp.path().to_path_buf()),
                ..CompileRequest::new(["spam.c"])
            })
            .unwrap();

        let request = LinkRequest {
            libraries: vec!["python3".to_string()],
            ..Default::default()
        };
        cc.link_shared_object(&objects, &tmp.path().join("spam.pyd"), &request)
            .unwrap();
        let project = ProjectDescriptor::load(&objects[0]).unwrap();
        assert_eq!(project.item_definitions("Link", "LinkDLL"), vec!["true".to_string()]);

        cc.link_executable(&objects, &tmp.path().join("app.exe"), &LinkRequest::default())
            .unwrap();
        let project = ProjectDescriptor::load(&objects[0]).unwrap();
        assert_eq!(
            project.property("Outputs", "ConfigurationType").as_deref(),
            Some("Application")
        );
        assert!(project.item_definitions("Link", "LinkDLL").is_empty());
        for role in ["Link", "Lib"] {
            let deps = project.item_definitions(role, "AdditionalDependencies");
            assert!(deps.len() <= 1, "{role} merged twice: {deps:?}");
            assert!(deps.iter().all(|d| !d.contains("python3.lib")));
        }
    }

    #[test]
    fn test_link_build_temp_overrides_int_dir() {
        let tmp = TempDir::new().unwrap();
        let mut cc = dry_run_driver();
        let objects = cc
            .compile(&CompileRequest {
                output_dir: Some(tmp.path().join("a")),
                ..CompileRequest::new(["a.c"])
            })
            .unwrap();

        let request = LinkRequest {
            build_temp: Some(tmp.path().join("b")),
            ..Default::default()
        };
        let result = cc
            .link_shared_lib(&objects, &tmp.path().join("a.dll"), &request)
            .unwrap();
        assert!(result.errors_log.starts_with(tmp.path().join("b")));
        let project = ProjectDescriptor::load(&objects[0]).unwrap();
        assert_eq!(
            project.property("Globals", "IntDir"),
            Some(dir_with_separator(&tmp.path().join("b")))
        );
    }

    #[test]
    fn test_classify_source() {
        assert_eq!(classify_source(Path::new("a.C")), Some("ClCompile"));
        assert_eq!(classify_source(Path::new("a.cxx")), Some("ClCompile"));
        assert_eq!(classify_source(Path::new("r.RC")), Some("ResourceCompile"));
        assert_eq!(classify_source(Path::new("i.idl")), Some("Midl"));
        assert_eq!(classify_source(Path::new("h.h")), None);
        assert_eq!(classify_source(Path::new("Makefile")), None);
    }

    #[test]
    fn test_detect_toolset() {
        assert_eq!(
            detect_toolset(Path::new("C:/VS/VC/Tools/MSVC/14.29.30133/bin/cl.exe")),
            Some("v142")
        );
        assert_eq!(
            detect_toolset(Path::new("C:\\VS\\VC\\Tools\\MSVC\\14.38.33130\\bin\\cl.exe")),
            Some("v143")
        );
        assert_eq!(detect_toolset(Path::new("C:\\VS14\\VC\\bin\\cl.exe")), None);
    }

    #[test]
    fn test_ensure_lib() {
        assert_eq!(ensure_lib("user32"), "user32.lib");
        assert_eq!(ensure_lib("foo.LIB"), "foo.LIB");
        assert_eq!(ensure_lib("start.obj"), "start.obj");
        assert_eq!(ensure_lib("libfoo.a"), "libfoo.a.lib");
    }

    #[test]
    fn test_settings_from_config() {
        let config: Config = toml::from_str(
            r#"
[driver]
platform = "win32"
module_extension = ".dll"

[driver.items]
Content = ["readme.txt"]
"#,
        )
        .unwrap();
        let settings = DriverSettings::from_config(&config).unwrap();
        assert_eq!(settings.platform, Some(Platform::Win32));
        assert_eq!(settings.module_extension, ".dll");
        assert_eq!(settings.intermediate_dir, PathBuf::from("build"));
        assert_eq!(
            settings.items,
            vec![("Content".to_string(), ProjectItem::path("readme.txt"))]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_build_forwards_errors() {
        let tmp = TempDir::new().unwrap();
        let tools = tmp.path().join("tools");
        std::fs::create_dir_all(&tools).unwrap();
        let msbuild = fake_msbuild(
            &tools,
            1,
            "a.c(3): error C2065: 'x': undeclared identifier\na.c(9): warning C4101: 'y': unreferenced local variable\n",
        );

        let sink = CollectSink::new();
        let cache = Arc::new(InstanceCache::new(StaticSource::new(vec![
            instance_with_msbuild(&msbuild),
        ])));
        let mut cc = MsBuildCompiler::new(cache, DriverSettings::default()).with_sink(sink.clone());
        cc.initialize(Some("win32")).unwrap();

        let objects = cc
            .compile(&CompileRequest {
                output_dir: Some(tmp.path().join("build")),
                ..CompileRequest::new(["a.c"])
            })
            .unwrap();
        let err = cc
            .link_shared_lib(&objects, &tmp.path().join("a.dll"), &LinkRequest::default())
            .unwrap_err();

        match driver_error(&err) {
            DriverError::BuildFailed {
                exit_code,
                verbose_log,
            } => {
                assert_eq!(*exit_code, Some(1));
                assert!(verbose_log.ends_with("verbose.log"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics[0].message, "Build returned exit code 1");
        assert_eq!(diagnostics[1].severity, Severity::Error);
        assert_eq!(
            diagnostics[1].message,
            "a.c(3): error C2065: 'x': undeclared identifier"
        );
        assert_eq!(diagnostics[1].line, Some(3));
        assert_eq!(diagnostics[2].severity, Severity::Warning);

        let args = recorded_args(&tools);
        assert_eq!(args[0], "/nologo");
        assert_eq!(args[1], "/noconlog");
        assert!(args[2].starts_with("/flp1:LogFile="));
        assert!(args[2].ends_with("verbose.log;Verbosity=detailed;Encoding=UTF-8"));
        assert_eq!(args[4], objects[0].display().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_build_creates_dirs() {
        let tmp = TempDir::new().unwrap();
        let msbuild = fake_msbuild(tmp.path(), 0, "");

        let sink = CollectSink::new();
        let cache = Arc::new(InstanceCache::new(StaticSource::new(vec![
            instance_with_msbuild(&msbuild),
        ])));
        let mut cc = MsBuildCompiler::new(cache, DriverSettings::default()).with_sink(sink.clone());
        cc.initialize(Some("win32")).unwrap();

        let objects = cc
            .compile(&CompileRequest {
                output_dir: Some(tmp.path().join("build")),
                ..CompileRequest::new(["a.c"])
            })
            .unwrap();
        let out = tmp.path().join("dist").join("a.exe");
        cc.link_executable(&objects, &out, &LinkRequest::default())
            .unwrap();

        assert!(tmp.path().join("dist").is_dir());
        assert!(sink.diagnostics().is_empty());
    }
}
