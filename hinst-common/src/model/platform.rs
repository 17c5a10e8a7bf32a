// hinst-common/src/model/platform.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HinstError, Result};

/// Operating systems release archives are published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

impl Os {
    pub fn as_str(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "windows",
        }
    }

    pub fn is_windows(self) -> bool {
        matches!(self, Os::Windows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Amd64,
    Arm64,
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
        }
    }
}

/// How the release archive for a platform is packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    TarXz,
    Zip,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::TarXz => "tar.xz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformTarget {
    pub os: Os,
    pub arch: Arch,
}

impl PlatformTarget {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Maps raw OS/architecture names (as reported by the Rust toolchain or by
    /// `uname`) onto a supported release target.
    pub fn from_parts(raw_os: &str, raw_arch: &str) -> Result<Self> {
        let os = match raw_os.to_ascii_lowercase().as_str() {
            "linux" => Some(Os::Linux),
            "macos" | "darwin" => Some(Os::Darwin),
            "windows" => Some(Os::Windows),
            _ => None,
        };
        let arch = match raw_arch.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Arch::Amd64),
            "aarch64" | "arm64" => Some(Arch::Arm64),
            _ => None,
        };
        match (os, arch) {
            (Some(os), Some(arch)) => Ok(Self { os, arch }),
            _ => Err(HinstError::UnsupportedPlatform {
                os: raw_os.to_string(),
                arch: raw_arch.to_string(),
            }),
        }
    }

    pub fn archive_format(&self) -> ArchiveFormat {
        if self.os.is_windows() {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::TarXz
        }
    }

    /// File name of the executable on this platform (`hola` or `hola.exe`).
    pub fn binary_file_name(&self, bin_name: &str) -> String {
        if self.os.is_windows() {
            format!("{bin_name}.exe")
        } else {
            bin_name.to_string()
        }
    }

    /// `<bin>-<os>-<arch>.<ext>`
    pub fn archive_name(&self, bin_name: &str) -> String {
        format!(
            "{}-{}-{}.{}",
            bin_name,
            self.os.as_str(),
            self.arch.as_str(),
            self.archive_format().extension()
        )
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.as_str(), self.arch.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_pairs_map_to_release_identifiers() {
        let cases = [
            ("linux", "x86_64", Os::Linux, Arch::Amd64),
            ("linux", "aarch64", Os::Linux, Arch::Arm64),
            ("macos", "x86_64", Os::Darwin, Arch::Amd64),
            ("macos", "aarch64", Os::Darwin, Arch::Arm64),
            ("Darwin", "arm64", Os::Darwin, Arch::Arm64),
            ("windows", "x86_64", Os::Windows, Arch::Amd64),
            ("windows", "aarch64", Os::Windows, Arch::Arm64),
        ];
        for (raw_os, raw_arch, os, arch) in cases {
            let target = PlatformTarget::from_parts(raw_os, raw_arch).unwrap();
            assert_eq!(target, PlatformTarget::new(os, arch), "{raw_os}/{raw_arch}");
        }
    }

    #[test]
    fn unsupported_inputs_report_raw_values() {
        for (raw_os, raw_arch) in [
            ("freebsd", "x86_64"),
            ("linux", "riscv64"),
            ("linux", "x86"),
            ("solaris", "sparc64"),
            ("", ""),
        ] {
            match PlatformTarget::from_parts(raw_os, raw_arch) {
                Err(HinstError::UnsupportedPlatform { os, arch }) => {
                    assert_eq!(os, raw_os);
                    assert_eq!(arch, raw_arch);
                }
                other => {
                    panic!("expected UnsupportedPlatform for {raw_os}/{raw_arch}, got {other:?}")
                }
            }
        }
    }

    #[test]
    fn archive_naming_follows_platform() {
        let linux = PlatformTarget::new(Os::Linux, Arch::Amd64);
        assert_eq!(linux.archive_name("tool"), "tool-linux-amd64.tar.xz");
        assert_eq!(linux.binary_file_name("tool"), "tool");

        let windows = PlatformTarget::new(Os::Windows, Arch::Arm64);
        assert_eq!(windows.archive_name("tool"), "tool-windows-arm64.zip");
        assert_eq!(windows.binary_file_name("tool"), "tool.exe");
        assert_eq!(windows.archive_format(), ArchiveFormat::Zip);
    }
}
