//! Platform identifiers: operating system, CPU architecture and the pair of both.
//!
//! The set is closed. A filename that names anything outside it is
//! unclassifiable rather than an error.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Operating system a release artifact targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Linux, any distribution or libc.
    Linux,
    /// Apple macOS (also spelled darwin, osx, os-x).
    Macos,
    /// Microsoft Windows.
    Windows,
}

impl Os {
    /// All supported operating systems.
    pub const ALL: [Self; 3] = [Self::Linux, Self::Macos, Self::Windows];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" | "osx" => Ok(Self::Macos),
            "windows" | "win" => Ok(Self::Windows),
            _ => Err(format!("Unknown operating system: {s}")),
        }
    }
}

/// CPU architecture a release artifact targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 32-bit Intel/AMD (`i386`, `i686`, `x86`).
    X86,
    /// 64-bit Intel/AMD (`x86_64`, `amd64`, `x64`).
    Amd64,
    /// 64-bit ARM (`arm64`, `aarch64`, `armv8`).
    Arm64,
}

impl Arch {
    /// All supported architectures.
    pub const ALL: [Self; 3] = [Self::X86, Self::Amd64, Self::Arm64];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86" | "i386" | "i686" | "386" => Ok(Self::X86),
            "amd64" | "x86_64" | "x64" => Ok(Self::Amd64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

/// An `(os, arch)` deployment target.
///
/// Serialized as `"<os>-<arch>"` (e.g. `linux-amd64`) so it can key a JSON
/// object. Ordering is by OS then architecture, which fixes the order of the
/// `platforms` map in the catalog.
///
/// ```
/// use assay_schema::{Arch, Os, PlatformKey};
///
/// let key = PlatformKey::new(Os::Linux, Arch::Arm64);
/// assert_eq!(key.to_string(), "linux-arm64");
/// assert_eq!("linux-arm64".parse::<PlatformKey>().unwrap(), key);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformKey {
    /// Target operating system.
    pub os: Os,
    /// Target CPU architecture.
    pub arch: Arch,
}

impl PlatformKey {
    /// Create a key from its parts.
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// All nine valid combinations, in key order.
    pub fn all() -> impl Iterator<Item = Self> {
        Os::ALL
            .into_iter()
            .flat_map(|os| Arch::ALL.into_iter().map(move |arch| Self { os, arch }))
    }
}

impl std::fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl std::str::FromStr for PlatformKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid platform key: {s}"))?;
        Ok(Self {
            os: os.parse()?,
            arch: arch.parse()?,
        })
    }
}

impl Serialize for PlatformKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlatformKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
