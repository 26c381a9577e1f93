//! Platform detection for the twl launcher.
//!
//! This module maps the running OS, CPU architecture and (on Linux) C library
//! flavor to the artifact file name used by the Tailwind CSS release channel.
//!
//! ## Supported Platforms
//!
//! | OS      | Architectures | Artifact                         |
//! |---------|---------------|----------------------------------|
//! | Linux   | x64, arm64    | `tailwindcss-linux-x64[-musl]`   |
//! | macOS   | x64, arm64    | `tailwindcss-macos-arm64`        |
//! | Windows | x64, arm64    | `tailwindcss-windows-x64.exe`    |
//!
//! The runtime environment is queried once in [`Platform::detect`]; the result
//! is plain data passed to every other component.

use std::fmt;
use std::path::Path;

use crate::errors::TwlError;

/// Prefix shared by release artifacts and cache entries.
pub const ARTIFACT_PREFIX: &str = "tailwindcss-";

/// Well-known paths of the musl dynamic linker.
const MUSL_LINKERS: [&str; 3] = [
    "/lib/ld-musl-x86_64.so.1",
    "/lib/ld-musl-aarch64.so.1",
    "/lib/ld-musl-armhf.so.1",
];

/// Memory map of the current process, listing every mapped shared object.
const PROC_SELF_MAPS: &str = "/proc/self/maps";

/// Read access to the filesystem needed for libc detection.
///
/// Production code uses [`OsFileProbe`]; tests substitute a fake.
pub trait FileProbe {
    /// Reads a whole file as UTF-8 (lossy).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Returns whether the path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileProbe`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileProbe;

impl FileProbe for OsFileProbe {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn exists(&self, path: &Path) -> bool {
        std::fs::metadata(path).is_ok()
    }
}

/// Supported operating systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Macos,
    Windows,
}

impl Os {
    /// Parses either a Rust target OS name or a release channel name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "linux" => Some(Self::Linux),
            "macos" | "darwin" => Some(Self::Macos),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }

    /// Name used in artifact file names.
    #[must_use = "returns the OS string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
        }
    }
}

/// Supported CPU architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    Arm64,
}

impl Arch {
    /// Parses either a Rust target architecture name or a release channel name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "x86_64" | "amd64" => Some(Self::X64),
            "aarch64" | "arm64" => Some(Self::Arm64),
            _ => None,
        }
    }

    /// Name used in artifact file names.
    #[must_use = "returns the architecture string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
        }
    }
}

/// C library flavor. Only meaningful on Linux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Libc {
    Gnu,
    Musl,
}

/// The platform the launcher runs on.
///
/// Derived once per process and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
    pub libc: Libc,
}

impl Platform {
    /// Detects the current platform from the runtime environment.
    ///
    /// # Errors
    ///
    /// Returns [`TwlError::UnsupportedPlatform`] if the OS/architecture pair
    /// has no release artifact.
    pub fn detect(probe: &dyn FileProbe) -> Result<Self, TwlError> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH, probe)
    }

    /// Builds a platform from OS and architecture names.
    ///
    /// Both Rust target names (`macos`, `x86_64`, `aarch64`) and release
    /// channel names (`darwin`, `amd64`, `arm64`) are accepted. The probe is
    /// only consulted for supported Linux pairs.
    ///
    /// # Errors
    ///
    /// Returns [`TwlError::UnsupportedPlatform`] for any other combination.
    pub fn from_parts(os: &str, arch: &str, probe: &dyn FileProbe) -> Result<Self, TwlError> {
        let (Some(parsed_os), Some(parsed_arch)) = (Os::parse(os), Arch::parse(arch)) else {
            return Err(TwlError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            });
        };

        let libc = if parsed_os == Os::Linux && is_musl(probe) {
            Libc::Musl
        } else {
            Libc::Gnu
        };

        Ok(Self {
            os: parsed_os,
            arch: parsed_arch,
            libc,
        })
    }

    /// Returns whether an OS/architecture pair is supported, without touching
    /// the filesystem.
    #[must_use]
    pub fn is_supported(os: &str, arch: &str) -> bool {
        Os::parse(os).is_some() && Arch::parse(arch).is_some()
    }

    /// Returns the release artifact file name for this platform,
    /// e.g. `tailwindcss-linux-x64-musl` or `tailwindcss-windows-arm64.exe`.
    #[must_use = "returns the artifact name without side effects"]
    pub fn artifact_name(&self) -> String {
        let musl = if self.os == Os::Linux && self.libc == Libc::Musl {
            "-musl"
        } else {
            ""
        };
        format!(
            "{ARTIFACT_PREFIX}{}-{}{musl}{}",
            self.os.as_str(),
            self.arch.as_str(),
            self.executable_extension()
        )
    }

    /// Returns the executable file extension for this platform.
    ///
    /// Returns `.exe` on Windows, empty string on Unix platforms.
    #[must_use = "returns the extension string without side effects"]
    pub fn executable_extension(&self) -> &'static str {
        match self.os {
            Os::Windows => ".exe",
            Os::Linux | Os::Macos => "",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())?;
        if self.libc == Libc::Musl {
            write!(f, "-musl")?;
        }
        Ok(())
    }
}

/// Best-effort musl detection.
///
/// First looks for a mapped musl object in the process memory map, which works
/// when this binary is dynamically linked against musl. Falls back to looking
/// for the musl dynamic linker, which works for static binaries on musl hosts.
/// Assumes glibc when neither finds anything.
fn is_musl(probe: &dyn FileProbe) -> bool {
    if let Ok(maps) = probe.read_to_string(Path::new(PROC_SELF_MAPS))
        && maps.contains("musl")
    {
        return true;
    }

    MUSL_LINKERS
        .iter()
        .any(|linker| probe.exists(Path::new(linker)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// In-memory probe that records how often it was consulted.
    #[derive(Default)]
    struct FakeProbe {
        files: HashMap<PathBuf, String>,
        calls: Cell<usize>,
    }

    impl FakeProbe {
        fn with_file(path: &str, content: &str) -> Self {
            let mut probe = Self::default();
            probe.files.insert(PathBuf::from(path), content.to_string());
            probe
        }
    }

    impl FileProbe for FakeProbe {
        fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
            self.calls.set(self.calls.get() + 1);
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
        }

        fn exists(&self, path: &Path) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.files.contains_key(path)
        }
    }

    #[test]
    fn artifact_names_for_glibc_hosts() {
        let probe = FakeProbe::default();
        let cases = [
            ("linux", "amd64", "tailwindcss-linux-x64"),
            ("linux", "arm64", "tailwindcss-linux-arm64"),
            ("darwin", "amd64", "tailwindcss-macos-x64"),
            ("darwin", "arm64", "tailwindcss-macos-arm64"),
            ("windows", "amd64", "tailwindcss-windows-x64.exe"),
            ("windows", "arm64", "tailwindcss-windows-arm64.exe"),
        ];
        for (os, arch, expected) in cases {
            let platform = Platform::from_parts(os, arch, &probe).unwrap();
            assert_eq!(platform.artifact_name(), expected, "{os}/{arch}");
            assert_eq!(platform.artifact_name(), platform.artifact_name());
        }
    }

    #[test]
    fn rust_target_names_are_accepted() {
        let probe = FakeProbe::default();
        let platform = Platform::from_parts("macos", "aarch64", &probe).unwrap();
        assert_eq!(platform.artifact_name(), "tailwindcss-macos-arm64");

        let platform = Platform::from_parts("linux", "x86_64", &probe).unwrap();
        assert_eq!(platform.artifact_name(), "tailwindcss-linux-x64");
    }

    #[test]
    fn musl_detected_from_process_maps() {
        let probe = FakeProbe::with_file(
            PROC_SELF_MAPS,
            "7f0000000000-7f0000001000 r-xp 00000000 08:01 1234 /lib/ld-musl-x86_64.so.1\n",
        );
        let platform = Platform::from_parts("linux", "amd64", &probe).unwrap();
        assert_eq!(platform.libc, Libc::Musl);
        assert_eq!(platform.artifact_name(), "tailwindcss-linux-x64-musl");
    }

    #[test]
    fn musl_detected_from_dynamic_linker_when_maps_has_no_match() {
        let mut probe = FakeProbe::with_file(PROC_SELF_MAPS, "/usr/lib/libc.so.6\n");
        probe
            .files
            .insert(PathBuf::from("/lib/ld-musl-aarch64.so.1"), String::new());
        let platform = Platform::from_parts("linux", "arm64", &probe).unwrap();
        assert_eq!(platform.artifact_name(), "tailwindcss-linux-arm64-musl");
    }

    #[test]
    fn musl_detected_from_armhf_linker_when_maps_unreadable() {
        let probe = FakeProbe::with_file("/lib/ld-musl-armhf.so.1", "");
        let platform = Platform::from_parts("linux", "arm64", &probe).unwrap();
        assert_eq!(platform.libc, Libc::Musl);
    }

    #[test]
    fn glibc_assumed_without_evidence() {
        let probe = FakeProbe::with_file(PROC_SELF_MAPS, "/usr/lib/x86_64-linux-gnu/libc.so.6\n");
        let platform = Platform::from_parts("linux", "amd64", &probe).unwrap();
        assert_eq!(platform.libc, Libc::Gnu);
    }

    #[test]
    fn musl_ignored_outside_linux() {
        let probe = FakeProbe::with_file(PROC_SELF_MAPS, "musl");
        let platform = Platform::from_parts("darwin", "arm64", &probe).unwrap();
        assert_eq!(platform.libc, Libc::Gnu);
        assert_eq!(platform.artifact_name(), "tailwindcss-macos-arm64");
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn unsupported_pairs_rejected_without_probing() {
        let probe = FakeProbe::with_file(PROC_SELF_MAPS, "musl");
        for (os, arch) in [
            ("freebsd", "amd64"),
            ("linux", "386"),
            ("linux", "arm"),
            ("plan9", "amd64"),
            ("windows", "x86"),
        ] {
            let result = Platform::from_parts(os, arch, &probe);
            assert!(
                matches!(result, Err(TwlError::UnsupportedPlatform { .. })),
                "{os}/{arch} should be unsupported"
            );
            assert!(!Platform::is_supported(os, arch));
        }
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn supported_pairs() {
        for os in ["linux", "darwin", "windows"] {
            for arch in ["amd64", "arm64"] {
                assert!(Platform::is_supported(os, arch), "{os}/{arch}");
            }
        }
    }

    #[test]
    fn executable_extension_correct_for_each_os() {
        let probe = FakeProbe::default();
        let ext = |os| {
            Platform::from_parts(os, "amd64", &probe)
                .unwrap()
                .executable_extension()
        };
        assert_eq!(ext("linux"), "");
        assert_eq!(ext("darwin"), "");
        assert_eq!(ext("windows"), ".exe");
    }

    #[test]
    fn display_includes_musl_flag() {
        let platform = Platform {
            os: Os::Linux,
            arch: Arch::X64,
            libc: Libc::Musl,
        };
        assert_eq!(platform.to_string(), "linux-x64-musl");
    }
}
