use crate::core::archive::ArchiveFormat;
use std::fmt;

/// Target operating system and architecture, named the way Go release files are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new<O: Into<String>, A: Into<String>>(os: O, arch: A) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this binary was compiled for.
    pub fn host() -> Self {
        Self::new(go_os(std::env::consts::OS), go_arch(std::env::consts::ARCH))
    }

    /// Host platform with optional overrides from the command line.
    pub fn resolve(os: Option<&str>, arch: Option<&str>) -> Self {
        let host = Self::host();
        Self::new(
            os.map(str::to_string).unwrap_or(host.os),
            arch.map(str::to_string).unwrap_or(host.arch),
        )
    }

    pub fn archive_format(&self) -> ArchiveFormat {
        ArchiveFormat::for_os(&self.os)
    }

    /// `go1.22.0.linux-amd64.tar.gz`
    pub fn archive_name(&self, version: &str) -> String {
        format!(
            "go{version}.{}-{}.{}",
            self.os,
            self.arch,
            self.archive_format().extension()
        )
    }

    pub fn archive_url(&self, base_url: &str, version: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.archive_name(version)
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn go_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn go_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "arm" => "armv6l",
        "powerpc64" => "ppc64le",
        "s390x" => "s390x",
        "riscv64" => "riscv64",
        "loongarch64" => "loong64",
        other => other,
    }
}
