//! Toolchain instance fixtures and a fake orchestrator.

use std::path::{Path, PathBuf};

use crate::core::instance::ToolchainInstance;

/// Build an instance with a display name derived from its id.
pub fn instance(
    id: &str,
    version: &str,
    packages: &[&str],
    known_paths: &[(&str, &str)],
) -> ToolchainInstance {
    ToolchainInstance::new(
        id,
        format!("Test {}", id),
        version,
        format!("C:\\Program Files\\{}", id),
        packages.iter().copied(),
        known_paths.iter().copied(),
    )
}

/// A Visual Studio 2015 install (toolset v140).
pub fn vs2015() -> ToolchainInstance {
    instance(
        "vs2015",
        "14.0",
        &[
            "Microsoft.Build",
            "Microsoft.VisualCpp.Tools.HostX86.TargetX86",
            "Microsoft.VisualCpp.Tools.HostX86.TargetX64",
        ],
        &[
            ("msbuild.exe", "C:\\MSBuild\\14.0\\Bin\\MSBuild.exe"),
            ("cl.exe", "C:\\VS14\\VC\\bin\\cl.exe"),
            ("cl.exe_x64", "C:\\VS14\\VC\\bin\\x86_amd64\\cl.exe"),
        ],
    )
}

/// Build Tools 2017 (toolset v141).
pub fn vs2017() -> ToolchainInstance {
    instance(
        "vs2017",
        "15.9.28307.1",
        &[
            "Microsoft.Build",
            "Microsoft.VisualCpp.Tools.HostX86.TargetX86",
            "Microsoft.VisualCpp.Tools.HostX86.TargetX64",
        ],
        &[
            ("msbuild.exe", "C:\\BuildTools\\MSBuild\\15.0\\Bin\\MSBuild.exe"),
            (
                "cl.exe",
                "C:\\BuildTools\\VC\\Tools\\MSVC\\14.16.27023\\bin\\HostX86\\x86\\cl.exe",
            ),
            (
                "cl.exe_x64",
                "C:\\BuildTools\\VC\\Tools\\MSVC\\14.16.27023\\bin\\HostX86\\x64\\cl.exe",
            ),
            (
                "lib.exe",
                "C:\\BuildTools\\VC\\Tools\\MSVC\\14.16.27023\\bin\\HostX86\\x86\\lib.exe",
            ),
            (
                "lib.exe_x64",
                "C:\\BuildTools\\VC\\Tools\\MSVC\\14.16.27023\\bin\\HostX86\\x64\\lib.exe",
            ),
        ],
    )
}

/// A Windows 10 SDK.
pub fn winsdk10(version: &str) -> ToolchainInstance {
    instance(
        "winsdk10",
        version,
        &["WinSDK"],
        &[("rc.exe", "C:\\Program Files (x86)\\Windows Kits\\10\\bin\\x86\\rc.exe")],
    )
}

/// Write a shell script standing in for `msbuild.exe`.
///
/// The script writes its arguments, one per line, to `args.txt` next to
/// itself, writes `errors_log` (with a UTF-8 BOM) to the path given in the
/// `/flp2:` argument and exits with `exit_code`.
#[cfg(unix)]
pub fn fake_msbuild(dir: &Path, exit_code: i32, errors_log: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
printf '%s\n' "$@" > "$(dirname "$0")/args.txt"
log="${{4#/flp2:LogFile=}}"
log="${{log%%;*}}"
printf '\357\273\277' > "$log"
cat >> "$log" <<'EOF'
{errors}EOF
exit {code}
"#,
        errors = errors_log,
        code = exit_code
    );

    let path = dir.join("msbuild.sh");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Arguments recorded by [`fake_msbuild`].
#[cfg(unix)]
pub fn recorded_args(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("args.txt"))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// An instance whose `msbuild.exe` is `msbuild`.
pub fn instance_with_msbuild(msbuild: &Path) -> ToolchainInstance {
    let msbuild = msbuild.display().to_string();
    instance(
        "vs2019",
        "16.11.5",
        &["Microsoft.Build"],
        &[
            ("msbuild.exe", msbuild.as_str()),
            ("cl.exe", "C:\\VS\\VC\\Tools\\MSVC\\14.29.30133\\bin\\HostX86\\x86\\cl.exe"),
        ],
    )
}
