//! Target platforms and link target kinds.

use std::fmt;
use std::str::FromStr;

use crate::builder::errors::DriverError;

/// A Windows target platform understood by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// 32-bit x86 (`win32`)
    Win32,
    /// 64-bit x86 (`win-amd64`)
    WinAmd64,
}

impl Platform {
    /// The default platform for the running process.
    pub fn host() -> Self {
        if cfg!(target_pointer_width = "64") {
            Platform::WinAmd64
        } else {
            Platform::Win32
        }
    }

    /// Identifier as accepted by [`Platform::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Win32 => "win32",
            Platform::WinAmd64 => "win-amd64",
        }
    }

    /// The value MSBuild expects in the `Platform` property.
    pub fn msbuild_name(&self) -> &'static str {
        match self {
            Platform::Win32 => "Win32",
            Platform::WinAmd64 => "x64",
        }
    }

    /// Packages of which at least one must be installed in an instance for
    /// it to take part in a build for this platform.
    pub fn required_packages(&self) -> &'static [&'static str] {
        match self {
            Platform::Win32 => &[
                "Microsoft.Build",
                "Microsoft.VisualCpp.Tools.HostX86.TargetX86",
                "WinSDK",
            ],
            Platform::WinAmd64 => &[
                "Microsoft.Build",
                "Microsoft.VisualCpp.Tools.HostX86.TargetX64",
                "WinSDK",
            ],
        }
    }

    /// Suffix appended to tool keys when looking up cross-targeting tools.
    pub fn tool_key_suffix(&self) -> &'static str {
        match self {
            Platform::Win32 => "",
            Platform::WinAmd64 => "_x64",
        }
    }
}

impl FromStr for Platform {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win32" => Ok(Platform::Win32),
            "win-amd64" => Ok(Platform::WinAmd64),
            other => Err(DriverError::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a link step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    StaticLib,
    SharedLibrary,
    SharedObject,
    Executable,
}

impl TargetKind {
    /// The MSBuild `ConfigurationType` for this target kind.
    pub fn configuration_type(&self) -> &'static str {
        match self {
            TargetKind::StaticLib => "StaticLibrary",
            TargetKind::SharedLibrary | TargetKind::SharedObject => "DynamicLibrary",
            TargetKind::Executable => "Application",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::StaticLib => "static-lib",
            TargetKind::SharedLibrary => "shared-lib",
            TargetKind::SharedObject => "shared-object",
            TargetKind::Executable => "exe",
        }
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static-lib" | "staticlib" => Ok(TargetKind::StaticLib),
            "shared-lib" | "sharedlib" => Ok(TargetKind::SharedLibrary),
            "shared-object" | "module" => Ok(TargetKind::SharedObject),
            "exe" | "executable" => Ok(TargetKind::Executable),
            _ => Err(format!(
                "invalid target kind '{}'; expected 'static-lib', 'shared-lib', 'shared-object', or 'exe'",
                s
            )),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform() {
        assert_eq!("win32".parse::<Platform>().unwrap(), Platform::Win32);
        assert_eq!("win-amd64".parse::<Platform>().unwrap(), Platform::WinAmd64);

        let err = "arm64".parse::<Platform>().unwrap_err();
        assert!(matches!(err, DriverError::UnsupportedPlatform { ref platform } if platform == "arm64"));
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::Win32.msbuild_name(), "Win32");
        assert_eq!(Platform::WinAmd64.msbuild_name(), "x64");
        assert_eq!(Platform::WinAmd64.tool_key_suffix(), "_x64");
        assert!(Platform::Win32
            .required_packages()
            .contains(&"Microsoft.VisualCpp.Tools.HostX86.TargetX86"));
    }

    #[test]
    fn test_configuration_type() {
        assert_eq!(TargetKind::StaticLib.configuration_type(), "StaticLibrary");
        assert_eq!(TargetKind::SharedObject.configuration_type(), "DynamicLibrary");
        assert_eq!(TargetKind::SharedLibrary.configuration_type(), "DynamicLibrary");
        assert_eq!(TargetKind::Executable.configuration_type(), "Application");
    }

    #[test]
    fn test_parse_target_kind() {
        assert_eq!("exe".parse::<TargetKind>().unwrap(), TargetKind::Executable);
        assert_eq!("Static-Lib".parse::<TargetKind>().unwrap(), TargetKind::StaticLib);
        assert!("dylib".parse::<TargetKind>().is_err());
    }
}
