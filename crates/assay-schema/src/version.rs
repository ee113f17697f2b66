//! Release tag validation and version ordering.
//!
//! Only tags that begin with `MAJOR.MINOR.PATCH` (optionally prefixed with
//! `v`) are cataloged. Pre-release suffixes must be dotted (`rc.1`, not
//! `rc1`) and development snapshots are never accepted.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Leading `MAJOR.MINOR.PATCH`. ASCII digits only; `\d` would admit other
/// scripts that the ordering key cannot parse.
static TRIPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+").expect("static regex is valid"));

/// Why a release tag was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionRejection {
    /// The tag does not begin with three dot-separated integers.
    #[error("'{0}' is not MAJOR.MINOR.PATCH")]
    MissingTriple(String),

    /// The pre-release suffix has no internal dot (e.g. `rc3`).
    #[error("'{0}' has a non-canonical pre-release suffix")]
    NonCanonicalPrerelease(String),

    /// The tag marks a development snapshot (`-dev` / `+dev`).
    #[error("'{0}' is a development snapshot")]
    DevSnapshot(String),
}

/// Validate a release tag and return its normalized version string.
///
/// A single leading `v`/`V` is stripped. Anything may follow the triple;
/// only the pre-release suffix (the text after the first `-`, up to any
/// `+build`) is checked, and it must contain a `.`.
///
/// # Errors
///
/// Returns a [`VersionRejection`] describing why the tag is not cataloged.
///
/// ```
/// use assay_schema::version::validate;
///
/// assert_eq!(validate("v2.0.0-rc.1").unwrap(), "2.0.0-rc.1");
/// assert_eq!(validate("1.2.3.4").unwrap(), "1.2.3.4");
/// assert!(validate("1.25rc3").is_err());
/// assert!(validate("1.0.0-dev.5").is_err());
/// ```
pub fn validate(raw_tag: &str) -> Result<String, VersionRejection> {
    let tag = raw_tag.trim();
    let version = tag
        .strip_prefix('v')
        .or_else(|| tag.strip_prefix('V'))
        .unwrap_or(tag);

    let lower = version.to_ascii_lowercase();
    if lower.contains("-dev") || lower.contains("+dev") {
        return Err(VersionRejection::DevSnapshot(raw_tag.to_string()));
    }

    if !TRIPLE_RE.is_match(version) {
        return Err(VersionRejection::MissingTriple(raw_tag.to_string()));
    }

    let release = version.split('+').next().unwrap_or(version);
    if release
        .split_once('-')
        .is_some_and(|(_, pre)| !pre.contains('.'))
    {
        return Err(VersionRejection::NonCanonicalPrerelease(raw_tag.to_string()));
    }

    Ok(version.to_string())
}

/// Ordering key of a normalized version: its numeric `(major, minor, patch)`.
///
/// Everything after the first `-` (or a `+` build suffix) is ignored,
/// missing components are 0 and unparseable components are 0. Only used
/// for sorting; two versions with the same key are still distinct catalog
/// entries.
pub fn version_key(version: &str) -> (u64, u64, u64) {
    let core = version.split(['-', '+']).next().unwrap_or(version);
    let mut parts = core.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

/// Total order used for the catalog, ascending.
///
/// Compares by [`version_key`]; ties fall back to semver precedence when both
/// strings parse, then to plain string order.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    version_key(a).cmp(&version_key(b)).then_with(|| {
        match (semver::Version::parse(a), semver::Version::parse(b)) {
            (Ok(va), Ok(vb)) => va.cmp_precedence(&vb).then_with(|| a.cmp(b)),
            _ => a.cmp(b),
        }
    })
}
