//! Field descriptor tables for every option record kind.
//!
//! Field names are MSBuild property and item metadata names and are written
//! into the project file verbatim.

use super::{FieldDefault, FieldSpec, Mutation};

/// An overwrite-mode field whose default is empty (inherit MSBuild's value).
const fn opt(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        default: FieldDefault::Text(""),
        mode: Mutation::Overwrite,
    }
}

const fn text(name: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        default: FieldDefault::Text(default),
        mode: Mutation::Overwrite,
    }
}

const fn flag(name: &'static str, default: bool) -> FieldSpec {
    FieldSpec {
        name,
        default: FieldDefault::Flag(default),
        mode: Mutation::Overwrite,
    }
}

/// An accumulate-mode field starting from the inherited `%(name)` value.
const fn list(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        default: FieldDefault::Placeholder,
        mode: Mutation::Accumulate,
    }
}

pub(super) const GLOBAL: &[FieldSpec] = &[
    text("Configuration", "Release"),
    opt("DefaultWindowsSDKVersion"),
    flag("GenerateManifest", true),
    opt("IntDir"),
    text("Platform", "Win32"),
    text("PlatformToolset", "v140"),
    flag("UseDebugLibraries", false),
];

pub(super) const OUTPUT: &[FieldSpec] = &[
    text("ConfigurationType", "DynamicLibrary"),
    opt("OutDir"),
    text("TargetExt", ".pyd"),
    opt("TargetName"),
];

pub(super) const CL_COMPILE: &[FieldSpec] = &[
    list("AdditionalIncludeDirectories"),
    list("AdditionalOptions"),
    list("AdditionalUsingDirectories"),
    opt("AssemblerListingLocation"),
    opt("AssemblerOutput"),
    opt("BasicRuntimeChecks"),
    opt("BrowseInformation"),
    opt("BrowseInformationFile"),
    opt("BufferSecurityCheck"),
    opt("CallingConvention"),
    opt("CompileAs"),
    opt("CompileAsManaged"),
    opt("CompileAsWinRT"),
    opt("ControlFlowGuard"),
    opt("CreateHotpatchableImage"),
    text("DebugInformationFormat", "ProgramDatabase"),
    opt("DisableLanguageExtensions"),
    opt("DisableSpecificWarnings"),
    opt("EnableEnhancedInstructionSet"),
    opt("EnableFiberSafeOptimizations"),
    opt("EnableParallelCodeGeneration"),
    opt("EnablePREfast"),
    opt("EnforceTypeConversionRules"),
    opt("ErrorReporting"),
    opt("ExceptionHandling"),
    opt("ExpandAttributedSource"),
    opt("FavorSizeOrSpeed"),
    opt("FloatingPointExceptions"),
    opt("FloatingPointModel"),
    opt("ForceConformanceInForLoopScope"),
    list("ForcedIncludeFiles"),
    list("ForcedUsingFiles"),
    flag("FunctionLevelLinking", true),
    opt("GenerateXMLDocumentationFiles"),
    opt("IgnoreStandardIncludePath"),
    opt("InlineFunctionExpansion"),
    flag("IntrinsicFunctions", true),
    opt("MinimalRebuild"),
    opt("MultiProcessorCompilation"),
    opt("ObjectFileName"),
    opt("OmitDefaultLibName"),
    opt("OmitFramePointers"),
    opt("OpenMPSupport"),
    text("Optimization", "MaxSpeed"),
    opt("PrecompiledHeader"),
    opt("PrecompiledHeaderFile"),
    opt("PrecompiledHeaderOutputFile"),
    opt("PREfastAdditionalOptions"),
    opt("PREfastAdditionalPlugins"),
    opt("PREfastLog"),
    opt("PreprocessKeepComments"),
    list("PreprocessorDefinitions"),
    opt("PreprocessSuppressLineNumbers"),
    opt("PreprocessToFile"),
    opt("ProcessorNumber"),
    opt("ProgramDataBaseFileName"),
    opt("RemoveUnreferencedCodeData"),
    text("RuntimeLibrary", "MultiThreadedDLL"),
    opt("RuntimeTypeInfo"),
    opt("SDLCheck"),
    opt("ShowIncludes"),
    opt("SmallerTypeCheck"),
    opt("StringPooling"),
    opt("StructMemberAlignment"),
    opt("SuppressStartupBanner"),
    opt("TreatSpecificWarningsAsErrors"),
    opt("TreatWarningAsError"),
    opt("TreatWChar_tAsBuiltInType"),
    opt("UndefineAllPreprocessorDefinitions"),
    list("UndefinePreprocessorDefinitions"),
    opt("UseFullPaths"),
    opt("UseUnicodeForAssemblerListing"),
    text("WarningLevel", "Level3"),
    opt("WarningVersion"),
    opt("WholeProgramOptimization"),
    opt("WinRTNoStdLib"),
    opt("XMLDocumentationFileName"),
];

// GenerateManifest and LinkIncremental are global properties and are not
// repeated here.
pub(super) const LINK: &[FieldSpec] = &[
    list("AdditionalDependencies"),
    list("AdditionalLibraryDirectories"),
    list("AdditionalManifestDependencies"),
    list("AdditionalOptions"),
    opt("AddModuleNamesToAssembly"),
    opt("AllowIsolation"),
    opt("AppContainer"),
    opt("AssemblyDebug"),
    opt("AssemblyLinkResource"),
    opt("BaseAddress"),
    opt("CLRImageType"),
    opt("CLRSupportLastError"),
    opt("CLRThreadAttribute"),
    opt("CLRUnmanagedCodeCheck"),
    opt("CreateHotPatchableImage"),
    opt("DataExecutionPrevention"),
    opt("DelayLoadDLLs"),
    opt("Driver"),
    flag("EnableCOMDATFolding", true),
    opt("EnableUAC"),
    opt("EntryPointSymbol"),
    opt("FixedBaseAddress"),
    opt("ForceFileOutput"),
    opt("ForceSymbolReferences"),
    opt("FunctionOrder"),
    flag("GenerateDebugInformation", true),
    opt("GenerateMapFile"),
    opt("HeapCommitSize"),
    opt("HeapReserveSize"),
    opt("IgnoreAllDefaultLibraries"),
    opt("IgnoreEmbeddedIDL"),
    opt("IgnoreSpecificDefaultLibraries"),
    opt("ImageHasSafeExceptionHandlers"),
    opt("ImportLibrary"),
    opt("KeyContainer"),
    opt("LargeAddressAware"),
    opt("LinkDLL"),
    opt("LinkErrorReporting"),
    opt("LinkStatus"),
    opt("LinkTimeCodeGeneration"),
    opt("ManifestEmbed"),
    opt("ManifestFile"),
    opt("ManifestInput"),
    opt("MapExports"),
    opt("MapFileName"),
    opt("MergedIDLBaseFileName"),
    opt("MergeSections"),
    opt("MidlCommandFile"),
    opt("MinimumRequiredVersion"),
    opt("ModuleDefinitionFile"),
    opt("MSDOSStubFileName"),
    opt("NoEntryPoint"),
    flag("OptimizeReferences", true),
    opt("OutputFile"),
    opt("PreventDllBinding"),
    opt("Profile"),
    opt("ProfileGuidedDatabase"),
    opt("ProgramDatabaseFile"),
    opt("RandomizedBaseAddress"),
    opt("SectionAlignment"),
    opt("SetChecksum"),
    opt("ShowProgress"),
    opt("SignHash"),
    opt("SpecifySectionAttributes"),
    opt("StackCommitSize"),
    opt("StackReserveSize"),
    opt("StripPrivateSymbols"),
    opt("SubSystem"),
    opt("SupportNobindOfDelayLoadedDLL"),
    opt("SupportUnloadOfDelayLoadedDLL"),
    opt("SuppressStartupBanner"),
    opt("SwapRunFromCD"),
    opt("SwapRunFromNET"),
    opt("TargetMachine"),
    opt("TerminalServerAware"),
    opt("TreatLinkerWarningAsErrors"),
    opt("TurnOffAssemblyGeneration"),
    opt("TypeLibraryFile"),
    opt("TypeLibraryResourceID"),
    opt("UACExecutionLevel"),
    opt("UACUIAccess"),
    opt("Version"),
    opt("WindowsMetadataFile"),
    opt("WindowsMetadataKeyContainer"),
    opt("WindowsMetadataLinkDelaySign"),
    opt("WindowsMetadataLinkKeyFile"),
    opt("WindowsMetadataSignHash"),
];

// Lib has no AdditionalOptions of its own; the librarian reads the global one.
pub(super) const LIB: &[FieldSpec] = &[
    list("AdditionalDependencies"),
    list("AdditionalLibraryDirectories"),
    opt("DisplayLibrary"),
    opt("ErrorReporting"),
    opt("ExportNamedFunctions"),
    opt("ForceSymbolReferences"),
    opt("IgnoreAllDefaultLibraries"),
    list("IgnoreSpecificDefaultLibraries"),
    opt("LinkTimeCodeGeneration"),
    opt("ModuleDefinitionFile"),
    opt("Name"),
    opt("OutputFile"),
    opt("RemoveObjects"),
    opt("SubSystem"),
    opt("SuppressStartupBanner"),
    opt("TargetMachine"),
    opt("TreatLibWarningAsErrors"),
    opt("Verbose"),
];

pub(super) const RESOURCE_COMPILE: &[FieldSpec] = &[
    list("AdditionalIncludeDirectories"),
    list("AdditionalOptions"),
    opt("Culture"),
    opt("IgnoreStandardIncludePath"),
    opt("NullTerminateStrings"),
    list("PreprocessorDefinitions"),
    opt("ResourceOutputFileName"),
    opt("ShowProgress"),
    opt("SuppressStartupBanner"),
    list("UndefinePreprocessorDefinitions"),
];

pub(super) const MIDL: &[FieldSpec] = &[
    list("AdditionalIncludeDirectories"),
    list("AdditionalMetadataDirectories"),
    list("AdditionalOptions"),
    opt("ApplicationConfigurationMode"),
    opt("ClientStubFile"),
    opt("CPreprocessOptions"),
    opt("DefaultCharType"),
    opt("DllDataFileName"),
    opt("EnableErrorChecks"),
    opt("EnableWindowsRuntime"),
    opt("Enumclass"),
    opt("ErrorCheckAllocations"),
    opt("ErrorCheckBounds"),
    opt("ErrorCheckEnumRange"),
    opt("ErrorCheckRefPointers"),
    opt("ErrorCheckStubData"),
    opt("GenerateClientFiles"),
    opt("GenerateServerFiles"),
    opt("GenerateStublessProxies"),
    opt("GenerateTypeLibrary"),
    opt("HeaderFileName"),
    opt("IgnoreStandardIncludePath"),
    opt("InterfaceIdentifierFileName"),
    opt("LocaleID"),
    opt("MetadataFileName"),
    opt("MkTypLibCompatible"),
    opt("OutputDirectory"),
    opt("PrependWithABINamepsace"),
    list("PreprocessorDefinitions"),
    opt("ProxyFileName"),
    opt("RedirectOutputAndErrors"),
    opt("ServerStubFile"),
    opt("StructMemberAlignment"),
    opt("SuppressCompilerWarnings"),
    opt("SuppressStartupBanner"),
    opt("TargetEnvironment"),
    opt("TypeLibFormat"),
    opt("TypeLibraryName"),
    list("UndefinePreprocessorDefinitions"),
    opt("ValidateAllParameters"),
    opt("WarnAsError"),
    opt("WarningLevel"),
];
