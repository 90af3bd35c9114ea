//! Configuration structures and types for lockstep-publisher
//!
//! This module provides type-safe configuration management with serde support.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default directory holding the package directories
pub const DEFAULT_PACKAGES_DIR: &str = "packages";

/// Default npm access level for published packages
pub const DEFAULT_ACCESS: &str = "public";

/// Default registry endpoint for version queries
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Distribution channel a release is published under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    Next,
    Latest,
}

impl ReleaseChannel {
    /// All channels, in prompt order
    pub const ALL: [ReleaseChannel; 2] = [ReleaseChannel::Next, ReleaseChannel::Latest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Latest => "latest",
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseChannel {
    type Err = String;

    // Case-normalized, so --channel NEXT and a prompt answer behave the same
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "next" => Ok(Self::Next),
            "latest" => Ok(Self::Latest),
            other => Err(format!("unknown channel: {}", other)),
        }
    }
}

/// Kind of version increment performed by a release
///
/// See: https://semver.org/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Prerelease,
    Patch,
    Minor,
    Major,
}

impl ReleaseType {
    /// Selectable types for a non-prerelease run, in prompt order
    pub const STABLE: [ReleaseType; 3] =
        [ReleaseType::Patch, ReleaseType::Minor, ReleaseType::Major];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prerelease => "prerelease",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prerelease" => Ok(Self::Prerelease),
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            other => Err(format!("unknown release type: {}", other)),
        }
    }
}

/// Operator decisions collected before a release run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// Channel the whole package set is published under
    pub channel: ReleaseChannel,

    /// Version increment to apply to the previous published version
    pub release_type: ReleaseType,

    /// Short release message, recorded in the release history
    pub message: String,
}

/// A package participating in the lockstep release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDefinition {
    /// Unscoped package identifier
    pub name: String,

    /// Unscoped names of internal dependencies; each must be declared
    /// as a package of this workspace
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PackageDefinition {
    pub fn new<S: Into<String>>(name: S, dependencies: &[&str]) -> Self {
        Self {
            name: name.into(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Workspace configuration, persisted as `.lockstep-publisher.yml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Schema version (required)
    pub version: String,

    /// Directory holding the package directories (default: "packages")
    #[serde(default = "default_packages_dir", rename = "packagesDir")]
    pub packages_dir: String,

    /// npm access level passed to publish (default: "public")
    #[serde(default = "default_access")]
    pub access: String,

    /// Registry endpoint used for version queries (default: npmjs)
    #[serde(default = "default_registry_url", rename = "registryUrl")]
    pub registry_url: String,

    /// Packages released in lockstep; the first entry is the
    /// version-reference package
    pub packages: Vec<PackageDefinition>,
}

fn default_packages_dir() -> String {
    DEFAULT_PACKAGES_DIR.to_string()
}

fn default_access() -> String {
    DEFAULT_ACCESS.to_string()
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

impl WorkspaceConfig {
    /// The package whose published version seeds the version resolver
    pub fn reference_package(&self) -> &PackageDefinition {
        &self.packages[0]
    }
}

/// Qualify an unscoped package name with the publishing user's namespace
pub fn scoped_name(user: &str, name: &str) -> String {
    format!("@{}/{}", user, name)
}
