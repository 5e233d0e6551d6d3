//! Host platform detection
//!
//! Detects the operating system, machine width and, on Linux, the
//! distribution. Release-file parsing is kept in pure functions so it can be
//! tested without the files being present.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::process::Command;

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl Os {
    /// OS family of the running process
    pub fn host() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }
}

/// Snapshot of the host platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: Os,
    /// 64-bit host machine, independent of how nova itself was built
    pub is_64: bool,
    /// Human readable name, e.g. "Fedora Linux 39 (Workstation Edition)"
    pub name: String,
    /// Short name, e.g. "Fedora"
    pub min_name: String,
}

impl PlatformInfo {
    /// Detect the running host
    pub fn detect() -> Self {
        let os = Os::host();
        let arch = host_arch(os);
        let is_64 = is_64_bit_arch(&arch);

        let (name, min_name) = match os {
            Os::Windows => ("Windows".to_string(), "Windows".to_string()),
            Os::MacOs => ("MacOS".to_string(), "MacOS".to_string()),
            Os::Linux => detect_linux(),
            Os::Other => (
                std::env::consts::OS.to_string(),
                std::env::consts::OS.to_string(),
            ),
        };

        tracing::debug!(?os, %arch, is_64, %name, "detected platform");

        Self {
            os,
            is_64,
            name,
            min_name,
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Directory name of the import/static library component for this width
    pub fn lib_dir_name(&self) -> &'static str {
        if self.is_64 {
            "lib-x64"
        } else {
            "lib-x86"
        }
    }

    /// Directory name of the shared library component for this width
    pub fn bin_dir_name(&self) -> &'static str {
        if self.is_64 {
            "bin-x64"
        } else {
            "bin-x86"
        }
    }

    /// File suffix of executables
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }
}

impl fmt::Display for PlatformInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = if self.is_64 { 64 } else { 32 };
        write!(f, "{} {}-bit", self.name, bits)
    }
}

/// Machine architecture of the host
///
/// A 32-bit process on a 64-bit Windows sees the real machine in
/// `PROCESSOR_ARCHITEW6432`.
fn host_arch(os: Os) -> String {
    let reported = if os == Os::Windows {
        std::env::var("PROCESSOR_ARCHITEW6432")
            .or_else(|_| std::env::var("PROCESSOR_ARCHITECTURE"))
            .ok()
    } else {
        Command::new("uname")
            .arg("-m")
            .output()
            .ok()
            .filter(|out| out.status.success())
            .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
    };

    reported
        .filter(|arch| !arch.is_empty())
        .unwrap_or_else(|| std::env::consts::ARCH.to_string())
}

/// Whether a machine name from `uname -m` or `PROCESSOR_ARCHITECTURE` is 64-bit
pub fn is_64_bit_arch(arch: &str) -> bool {
    let arch = arch.trim().to_ascii_lowercase();
    matches!(
        arch.as_str(),
        "x86_64"
            | "amd64"
            | "x64"
            | "ia64"
            | "aarch64"
            | "arm64"
            | "aarch64_be"
            | "ppc64"
            | "ppc64le"
            | "powerpc64"
            | "powerpc64le"
            | "s390x"
            | "riscv64"
            | "loongarch64"
            | "mips64"
            | "sparc64"
    )
}

fn detect_linux() -> (String, String) {
    let lsb = Command::new("lsb_release")
        .arg("-a")
        .output()
        .ok()
        .map(|out| String::from_utf8_lossy(&out.stdout).into_owned())
        .unwrap_or_default();
    let kernel_version = fs::read_to_string("/proc/version").unwrap_or_default();
    let os_release = fs::read_to_string("/etc/os-release").unwrap_or_default();

    identify_linux(
        &parse_lsb_release(&lsb),
        &kernel_version,
        &parse_os_release(&os_release),
    )
}

/// Pick a distribution name from the gathered release information
///
/// Returns `(name, min_name)`.
pub fn identify_linux(
    lsb: &HashMap<String, String>,
    kernel_version: &str,
    os_release: &HashMap<String, String>,
) -> (String, String) {
    let platform = format!(
        "{} {}",
        lsb.get("Distributor ID").map(String::as_str).unwrap_or(""),
        kernel_version
    )
    .to_lowercase();

    if platform.contains("manjaro") {
        let name = match lsb.get("Release") {
            Some(release) => format!("Manjaro {release}"),
            None => "Manjaro".to_string(),
        };
        return (name, "Manjaro".to_string());
    }

    if kernel_version.to_lowercase().contains("ubuntu") {
        let name = lsb
            .get("Description")
            .cloned()
            .unwrap_or_else(|| "Ubuntu".to_string());
        return (name, "Ubuntu".to_string());
    }

    if os_release.get("ID").map(String::as_str) == Some("fedora") {
        let name = os_release
            .get("PRETTY_NAME")
            .cloned()
            .unwrap_or_else(|| "Fedora".to_string());
        return (name, "Fedora".to_string());
    }

    ("Unknown Linux".to_string(), "Linux".to_string())
}

/// Parse `lsb_release -a` output (`Key:\tvalue` lines)
pub fn parse_lsb_release(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Parse `/etc/os-release` (`KEY=value`, optionally quoted)
pub fn parse_os_release(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}
