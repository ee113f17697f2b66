//! Platform and archive classification for free-form release asset names.
//!
//! Vendors name assets inconsistently (`darwin`/`macos`/`osx`,
//! `arm64`/`aarch64`, `x86_64`/`amd64`/`x64`). Each axis is decided by an
//! ordered rule table evaluated top to bottom; the first matching rule wins.
//! The order of the tables is load-bearing and covered by the tests below.

use serde::{Deserialize, Serialize};

use crate::arch::{Arch, Os, PlatformKey};
use crate::types::ArchiveType;

/// A lowercased asset name with the token helpers the rules need.
struct Name {
    lower: String,
}

impl Name {
    fn new(filename: &str) -> Self {
        Self {
            lower: filename.to_lowercase(),
        }
    }

    fn has(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    fn has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.lower.contains(n))
    }

    /// Alphanumeric runs of the name (`x86_64-linux` -> `x86`, `64`, `linux`).
    fn tokens(&self) -> impl Iterator<Item = &str> {
        self.lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
    }

    /// Whether some token is `word`, optionally followed by digits only
    /// (`win`, `win64`, `ubuntu22`).
    fn has_word(&self, word: &str) -> bool {
        self.tokens().any(|t| {
            t.strip_prefix(word)
                .is_some_and(|rest| rest.bytes().all(|b| b.is_ascii_digit()))
        })
    }

    /// Offsets where `needle` occurs at the start of a token.
    fn token_starts<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.lower.match_indices(needle).filter_map(|(i, _)| {
            let boundary = self.lower[..i]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_ascii_alphanumeric());
            boundary.then_some(i)
        })
    }
}

type OsRule = (fn(&Name) -> bool, Os);

/// macOS is tested first, so a name mentioning both `darwin` and `windows` is macOS.
const OS_RULES: &[OsRule] = &[
    (is_macos, Os::Macos),
    (is_windows, Os::Windows),
    (is_linux, Os::Linux),
];

/// A bare `mac` must stand alone, which rejects `macintosh` as well as
/// `emacs` and `machine`.
fn is_macos(n: &Name) -> bool {
    n.has_any(&["darwin", "macos", "mac-os", "osx", "os-x"])
        || n.token_starts("mac").any(|i| {
            n.lower[i + 3..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_ascii_alphabetic())
        })
}

/// `win` counts only as a whole token or with a numeric tail, so
/// `wingman` and `wintun` are not Windows.
fn is_windows(n: &Name) -> bool {
    n.has("windows") || n.has_word("win")
}

/// Libc and distro markers, matched as whole tokens (`gnupg` is not `gnu`).
const LINUX_QUALIFIERS: &[&str] = &[
    "musl", "gnu", "glibc", "ubuntu", "debian", "alpine", "centos", "fedora", "rhel",
];

/// ABI-suffixed libc tokens (`gnueabihf`, `musleabi`).
const LINUX_ABI_PREFIXES: &[&str] = &["gnueabi", "musleabi"];

fn is_linux(n: &Name) -> bool {
    n.has("linux")
        || LINUX_QUALIFIERS.iter().any(|q| n.has_word(q))
        || n.tokens().any(|t| LINUX_ABI_PREFIXES.iter().any(|p| t.starts_with(p)))
}

/// An architecture rule. `None` means the name targets an architecture
/// outside the supported set and classification stops there.
type ArchRule = (fn(&Name, Option<Os>) -> bool, Option<Arch>);

/// Most specific first: `arm64` contains `64`, `x86_64` contains `x86`.
const ARCH_RULES: &[ArchRule] = &[
    (is_arm64, Some(Arch::Arm64)),
    (is_unsupported_arch, None),
    (is_amd64, Some(Arch::Amd64)),
    (is_x86, Some(Arch::X86)),
    (is_bare_64, Some(Arch::Amd64)),
    (is_windows_32, Some(Arch::X86)),
];

fn is_arm64(n: &Name, _: Option<Os>) -> bool {
    n.has_any(&["arm64", "aarch64", "armv8"])
}

const UNSUPPORTED_ARCH_TOKENS: &[&str] = &[
    "arm", "armel", "armhf", "ppc", "ppc64", "ppc64le", "powerpc", "powerpc64", "powerpc64le",
    "s390x", "riscv64", "riscv64gc", "mips", "mipsel", "mipsle", "mips64", "mips64el",
    "mips64le", "loong64", "loongarch64", "sparc64", "sparcv9",
];

fn is_unsupported_arch(n: &Name, _: Option<Os>) -> bool {
    n.tokens().any(|t| {
        UNSUPPORTED_ARCH_TOKENS.contains(&t)
            || (t.starts_with("armv") && !t.starts_with("armv8"))
    })
}

fn is_amd64(n: &Name, os: Option<Os>) -> bool {
    !is_arm64(n, os) && n.has_any(&["x86_64", "x86-64", "amd64", "x64"])
}

fn is_x86(n: &Name, _: Option<Os>) -> bool {
    if n.has_any(&["i386", "i586", "i686", "ia32"])
        || n.tokens().any(|t| t == "386" || t == "win32")
    {
        return true;
    }
    n.lower.match_indices("x86").any(|(i, _)| {
        let rest = &n.lower[i + 3..];
        !(rest.starts_with("_64") || rest.starts_with("-64") || rest.starts_with("64"))
    })
}

fn is_bare_64(n: &Name, _: Option<Os>) -> bool {
    n.lower.match_indices("64").any(|(i, _)| {
        let before = &n.lower[..i];
        !(before.ends_with("arm") || before.ends_with("aarch"))
    })
}

fn is_windows_32(n: &Name, os: Option<Os>) -> bool {
    if os != Some(Os::Windows) {
        return false;
    }
    if n.has_any(&["32bit", "32-bit"]) {
        return true;
    }
    ["-32", "_32"].iter().any(|sep| {
        n.lower.match_indices(sep).any(|(i, _)| {
            n.lower[i + 3..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_ascii_digit())
        })
    })
}

fn detect_os(n: &Name) -> Option<Os> {
    OS_RULES
        .iter()
        .find(|(matches, _)| matches(n))
        .map(|&(_, os)| os)
}

fn detect_arch(n: &Name, os: Option<Os>) -> Option<Arch> {
    match ARCH_RULES.iter().find(|(matches, _)| matches(n, os)) {
        Some(&(_, verdict)) => verdict,
        // Releases that predate architecture-qualified names shipped amd64.
        None => os.map(|_| Arch::Amd64),
    }
}

fn detect_archive(n: &Name) -> Option<ArchiveType> {
    ArchiveType::SUFFIXES
        .iter()
        .find(|(suffix, _)| n.lower.ends_with(suffix))
        .map(|&(_, t)| t)
}

/// The raw per-axis reading of an asset filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPattern {
    /// Detected operating system, if any rule matched.
    pub os: Option<Os>,
    /// Detected CPU architecture, including the amd64 default.
    pub arch: Option<Arch>,
    /// Detected archive type, if the name ends in an allowed suffix.
    pub ext: Option<ArchiveType>,
}

impl AssetPattern {
    /// Parse the platform indicators out of a filename. Never fails.
    pub fn from_filename(filename: &str) -> Self {
        let name = Name::new(filename);
        let os = detect_os(&name);
        let arch = detect_arch(&name, os);
        let ext = detect_archive(&name);
        Self { os, arch, ext }
    }

    /// The platform, when both axes resolved.
    pub fn platform(&self) -> Option<PlatformKey> {
        Some(PlatformKey::new(self.os?, self.arch?))
    }
}

/// Classify a filename into its platform and archive type.
///
/// Returns `(None, None)` when the platform cannot be determined; the caller
/// skips such files. A known platform with a non-archive extension yields
/// `(Some(platform), None)`.
///
/// ```
/// use assay_schema::asset_pattern::classify;
/// use assay_schema::{Arch, ArchiveType, Os, PlatformKey};
///
/// let (platform, archive) = classify("rg-14.1.0-aarch64-apple-darwin.tar.gz");
/// assert_eq!(platform, Some(PlatformKey::new(Os::Macos, Arch::Arm64)));
/// assert_eq!(archive, Some(ArchiveType::TarGz));
/// ```
pub fn classify(filename: &str) -> (Option<PlatformKey>, Option<ArchiveType>) {
    let pattern = AssetPattern::from_filename(filename);
    match pattern.platform() {
        Some(platform) => (Some(platform), pattern.ext),
        None => (None, None),
    }
}
