//! Version resolution for lockstep releases
//!
//! One version is computed per run, from the previously published version
//! of the reference package, and reused for every package in the set.
//!
//! # Example
//!
//! ```
//! use lockstep_publisher::core::config::{ReleaseChannel, ReleaseType};
//! use lockstep_publisher::core::version::resolve_next_version;
//!
//! let version = resolve_next_version(
//!     "@alice/tstuto-api",
//!     Some("1.2.3"),
//!     ReleaseType::Minor,
//!     ReleaseChannel::Next,
//! )
//! .unwrap();
//!
//! assert_eq!(version.to_string(), "1.3.0-next.0");
//! ```

use crate::core::config::{ReleaseChannel, ReleaseType};
use crate::core::error::ReleaseError;
use semver::{Prerelease, Version};

/// Development placeholder version restored after a release
pub const DEVELOPMENT_VERSION: &str = "0.0.0";

/// Parse the previous published version reported by the registry
///
/// A blank or missing result means the package set has never been
/// published on this channel and is treated as `0.0.0`. A non-blank
/// string that is not valid semver is a fatal error.
pub fn parse_previous_version(
    package: &str,
    raw: Option<&str>,
) -> Result<Version, ReleaseError> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Ok(Version::new(0, 0, 0));
    }

    Version::parse(raw).map_err(|_| ReleaseError::InvalidPreviousVersion {
        package: package.to_string(),
        raw: raw.to_string(),
    })
}

/// Increment a version following node-semver `inc` semantics
pub fn increment(previous: &Version, release_type: ReleaseType) -> Version {
    match release_type {
        ReleaseType::Major => {
            // A prerelease of the next major graduates instead of skipping one
            if previous.minor == 0 && previous.patch == 0 && !previous.pre.is_empty() {
                Version::new(previous.major, 0, 0)
            } else {
                Version::new(previous.major + 1, 0, 0)
            }
        }
        ReleaseType::Minor => {
            if previous.patch == 0 && !previous.pre.is_empty() {
                Version::new(previous.major, previous.minor, 0)
            } else {
                Version::new(previous.major, previous.minor + 1, 0)
            }
        }
        ReleaseType::Patch => {
            if !previous.pre.is_empty() {
                Version::new(previous.major, previous.minor, previous.patch)
            } else {
                Version::new(previous.major, previous.minor, previous.patch + 1)
            }
        }
        ReleaseType::Prerelease => next_prerelease(previous),
    }
}

/// Bump the prerelease counter, or start one from a stable version
fn next_prerelease(previous: &Version) -> Version {
    if previous.pre.is_empty() {
        let mut next = Version::new(previous.major, previous.minor, previous.patch + 1);
        next.pre = Prerelease::new("0").unwrap();
        return next;
    }

    // Increment the last numeric identifier; append ".0" when none is numeric
    let mut identifiers: Vec<String> =
        previous.pre.as_str().split('.').map(String::from).collect();
    let mut bumped = false;
    for identifier in identifiers.iter_mut().rev() {
        if let Ok(n) = identifier.parse::<u64>() {
            *identifier = (n + 1).to_string();
            bumped = true;
            break;
        }
    }
    if !bumped {
        identifiers.push("0".to_string());
    }

    let mut next = Version::new(previous.major, previous.minor, previous.patch);
    // Identifiers came out of a parsed Prerelease, so re-joining them is valid
    next.pre = Prerelease::new(&identifiers.join(".")).unwrap();
    next
}

/// Apply the channel rule on top of the increment
///
/// A non-prerelease publish on a channel other than `latest` must still
/// be installable as a prerelease tag, so it never outranks a `latest`
/// release under semver ordering.
pub fn resolve_version(
    previous: &Version,
    release_type: ReleaseType,
    channel: ReleaseChannel,
) -> Version {
    let mut next = increment(previous, release_type);

    if release_type != ReleaseType::Prerelease && channel != ReleaseChannel::Latest {
        // Channel tags are valid prerelease identifiers by construction
        next.pre = Prerelease::new(&format!("{}.0", channel.as_str())).unwrap();
    }

    next
}

/// Full resolver: previous-version parsing plus increment and channel rule
pub fn resolve_next_version(
    package: &str,
    raw_previous: Option<&str>,
    release_type: ReleaseType,
    channel: ReleaseChannel,
) -> Result<Version, ReleaseError> {
    let previous = parse_previous_version(package, raw_previous)?;
    Ok(resolve_version(&previous, release_type, channel))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_blank_previous_version_is_zero() {
        assert_eq!(
            parse_previous_version("@alice/tstuto-api", None).unwrap(),
            v("0.0.0")
        );
        assert_eq!(
            parse_previous_version("@alice/tstuto-api", Some("")).unwrap(),
            v("0.0.0")
        );
        assert_eq!(
            parse_previous_version("@alice/tstuto-api", Some("  \n")).unwrap(),
            v("0.0.0")
        );
    }

    #[test]
    fn test_invalid_previous_version_is_fatal() {
        let result = parse_previous_version("@alice/tstuto-api", Some("not-a-version"));
        match result {
            Err(ReleaseError::InvalidPreviousVersion { package, raw }) => {
                assert_eq!(package, "@alice/tstuto-api");
                assert_eq!(raw, "not-a-version");
            }
            other => panic!("expected InvalidPreviousVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_standard_increments() {
        assert_eq!(increment(&v("1.2.3"), ReleaseType::Patch), v("1.2.4"));
        assert_eq!(increment(&v("1.2.3"), ReleaseType::Minor), v("1.3.0"));
        assert_eq!(increment(&v("1.2.3"), ReleaseType::Major), v("2.0.0"));
    }

    #[test]
    fn test_increments_graduate_prereleases() {
        assert_eq!(increment(&v("1.2.3-next.0"), ReleaseType::Patch), v("1.2.3"));
        assert_eq!(increment(&v("1.3.0-next.0"), ReleaseType::Minor), v("1.3.0"));
        assert_eq!(increment(&v("1.3.1-next.0"), ReleaseType::Minor), v("1.4.0"));
        assert_eq!(increment(&v("2.0.0-next.0"), ReleaseType::Major), v("2.0.0"));
        assert_eq!(increment(&v("2.1.0-next.0"), ReleaseType::Major), v("3.0.0"));
    }

    #[test]
    fn test_prerelease_increment_from_stable() {
        assert_eq!(increment(&v("0.0.0"), ReleaseType::Prerelease), v("0.0.1-0"));
        assert_eq!(increment(&v("1.2.3"), ReleaseType::Prerelease), v("1.2.4-0"));
    }

    #[test]
    fn test_prerelease_increment_bumps_counter() {
        assert_eq!(
            increment(&v("1.3.0-next.0"), ReleaseType::Prerelease),
            v("1.3.0-next.1")
        );
        assert_eq!(
            increment(&v("1.3.0-next.1"), ReleaseType::Prerelease),
            v("1.3.0-next.2")
        );
        assert_eq!(
            increment(&v("1.3.0-0"), ReleaseType::Prerelease),
            v("1.3.0-1")
        );
    }

    #[test]
    fn test_prerelease_increment_without_numeric_identifier() {
        assert_eq!(
            increment(&v("1.2.3-alpha"), ReleaseType::Prerelease),
            v("1.2.3-alpha.0")
        );
    }

    #[test]
    fn test_channel_suffix_applied_off_latest() {
        assert_eq!(
            resolve_version(&v("1.2.3"), ReleaseType::Minor, ReleaseChannel::Next),
            v("1.3.0-next.0")
        );
        assert_eq!(
            resolve_version(&v("1.2.3"), ReleaseType::Patch, ReleaseChannel::Next),
            v("1.2.4-next.0")
        );
    }

    #[test]
    fn test_no_channel_suffix_on_latest() {
        assert_eq!(
            resolve_version(&v("1.2.3"), ReleaseType::Minor, ReleaseChannel::Latest),
            v("1.3.0")
        );
    }

    #[test]
    fn test_no_channel_suffix_for_prerelease_type() {
        assert_eq!(
            resolve_version(&v("1.3.0-next.1"), ReleaseType::Prerelease, ReleaseChannel::Next),
            v("1.3.0-next.2")
        );
    }

    #[test]
    fn test_resolve_next_version_first_publish() {
        let version = resolve_next_version(
            "@alice/tstuto-api",
            None,
            ReleaseType::Prerelease,
            ReleaseChannel::Latest,
        )
        .unwrap();
        assert_eq!(version, v("0.0.1-0"));
    }

    #[test]
    fn test_resolve_next_version_rejects_garbage() {
        let result = resolve_next_version(
            "@alice/tstuto-api",
            Some("1.2"),
            ReleaseType::Minor,
            ReleaseChannel::Latest,
        );
        assert!(matches!(
            result,
            Err(ReleaseError::InvalidPreviousVersion { .. })
        ));
    }

    #[test]
    fn test_resolved_prerelease_never_outranks_latest() {
        let next = resolve_version(&v("1.2.3"), ReleaseType::Minor, ReleaseChannel::Next);
        let latest = resolve_version(&v("1.2.3"), ReleaseType::Minor, ReleaseChannel::Latest);
        assert!(next < latest);
    }
}
