//! Package manifest handling
//!
//! Loads and rewrites `package.json` files in place:
//! - unknown fields round-trip untouched (serde flatten)
//! - output is pretty-printed with 4-space indentation
//! - the release-time scoping mutation and its development-time
//!   restoration are exact mirrors of each other

use crate::core::config::{PackageDefinition, scoped_name};
use crate::core::error::ReleaseError;
use crate::core::version::DEVELOPMENT_VERSION;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Manifest file name inside a package directory
pub const MANIFEST_FILE: &str = "package.json";

/// package.json structure
///
/// Only the fields this tool mutates are typed; everything else is
/// carried through `extra`. A missing dependencies object is
/// materialized as an empty one on rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageManifest {
    /// Load a manifest from disk
    pub async fn load(path: &Path) -> Result<Self, ReleaseError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ReleaseError::ManifestRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| ReleaseError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Persist the manifest back to disk, pretty-printed with 4-space
    /// indentation, overwriting the original
    pub async fn save(&self, path: &Path) -> Result<(), ReleaseError> {
        let rendered = self.render().map_err(|e| ReleaseError::ManifestWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        fs::write(path, rendered)
            .await
            .map_err(|e| ReleaseError::ManifestWrite {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn render(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(buf)
    }

    /// Rewrite the manifest to its published shape: scoped name, the
    /// resolved version, and every declared internal dependency pinned
    /// to that exact version under its scoped name. Unscoped dependency
    /// entries are left untouched.
    pub fn scope_for_release(
        &mut self,
        user: &str,
        version: &Version,
        definition: &PackageDefinition,
    ) {
        self.name = scoped_name(user, &definition.name);
        self.version = version.to_string();
        for dependency in &definition.dependencies {
            self.dependencies.insert(
                scoped_name(user, dependency),
                Value::String(version.to_string()),
            );
        }
    }

    /// Mirror of [`scope_for_release`]: unscoped name, development
    /// placeholder version, and exactly the scoped entries for declared
    /// dependencies removed. Scoped entries unrelated to this workspace
    /// are preserved.
    pub fn restore_development(&mut self, user: &str, definition: &PackageDefinition) {
        self.name = definition.name.clone();
        self.version = DEVELOPMENT_VERSION.to_string();
        for dependency in &definition.dependencies {
            self.dependencies.remove(&scoped_name(user, dependency));
        }
    }
}

/// Directory owning a package, mirroring the workspace layout
/// `<packagesDir>/@<user>/<name>`
pub fn package_dir(
    workspace_root: &Path,
    packages_dir: &str,
    user: &str,
    name: &str,
) -> PathBuf {
    workspace_root
        .join(packages_dir)
        .join(format!("@{}", user))
        .join(name)
}

/// Manifest path for a package directory
pub fn manifest_path(package_dir: &Path) -> PathBuf {
    package_dir.join(MANIFEST_FILE)
}

/// Validate a package name according to npm rules
/// https://docs.npmjs.com/cli/v9/configuring-npm/package-json#name
pub fn validate_package_name(name: &str) -> Vec<String> {
    let mut errors = Vec::new();

    // Length check (including scope)
    if name.len() > 214 {
        errors.push("パッケージ名は214文字以内である必要があります".to_string());
    }

    if name.chars().any(|c| c.is_uppercase()) {
        errors.push("パッケージ名に大文字を含めることはできません".to_string());
    }

    // Extract name without scope
    let name_without_scope = if name.starts_with('@') {
        name.split('/').nth(1).unwrap_or(name)
    } else {
        name
    };

    if name_without_scope.starts_with('.') || name_without_scope.starts_with('_') {
        errors.push(
            "パッケージ名はドットまたはアンダースコアで始めることはできません".to_string(),
        );
    }

    // URL-safe characters only (lowercase, numbers, hyphens, underscores, dots)
    let valid_chars_regex = Regex::new(r"^[a-z0-9._-]+$").unwrap();
    if !valid_chars_regex.is_match(name_without_scope) {
        errors.push(
            "パッケージ名は小文字英数字とハイフン、アンダースコア、ドットのみ使用可能です"
                .to_string(),
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEV_MANIFEST: &str = r#"{
    "name": "tstuto-web-client",
    "version": "0.0.0",
    "dependencies": {
        "axios": "^0.18.0"
    },
    "scripts": {
        "build": "webpack"
    },
    "license": "MIT"
}"#;

    fn web_client_definition() -> PackageDefinition {
        PackageDefinition::new("tstuto-web-client", &["tstuto-api"])
    }

    fn version() -> Version {
        Version::parse("1.3.0-next.0").unwrap()
    }

    #[test]
    fn test_parse_keeps_unknown_fields() {
        let manifest: PackageManifest = serde_json::from_str(DEV_MANIFEST).unwrap();

        assert_eq!(manifest.name, "tstuto-web-client");
        assert_eq!(manifest.version, "0.0.0");
        assert!(manifest.extra.contains_key("scripts"));
        assert_eq!(
            manifest.extra.get("license"),
            Some(&Value::String("MIT".to_string()))
        );
    }

    #[test]
    fn test_scope_for_release() {
        let mut manifest: PackageManifest = serde_json::from_str(DEV_MANIFEST).unwrap();
        manifest.scope_for_release("alice", &version(), &web_client_definition());

        assert_eq!(manifest.name, "@alice/tstuto-web-client");
        assert_eq!(manifest.version, "1.3.0-next.0");
        // Lockstep: the internal dependency pins the exact version
        assert_eq!(
            manifest.dependencies.get("@alice/tstuto-api"),
            Some(&Value::String("1.3.0-next.0".to_string()))
        );
        // Unscoped entries are untouched
        assert_eq!(
            manifest.dependencies.get("axios"),
            Some(&Value::String("^0.18.0".to_string()))
        );
    }

    #[test]
    fn test_scope_then_restore_round_trips() {
        let original: PackageManifest = serde_json::from_str(DEV_MANIFEST).unwrap();
        let mut manifest = original.clone();

        manifest.scope_for_release("alice", &version(), &web_client_definition());
        manifest.restore_development("alice", &web_client_definition());

        assert_eq!(manifest, original);
    }

    #[test]
    fn test_restore_preserves_unrelated_scoped_entries() {
        let mut manifest: PackageManifest = serde_json::from_str(DEV_MANIFEST).unwrap();
        manifest.dependencies.insert(
            "@types/node".to_string(),
            Value::String("^10.0.0".to_string()),
        );

        manifest.scope_for_release("alice", &version(), &web_client_definition());
        manifest.restore_development("alice", &web_client_definition());

        assert_eq!(
            manifest.dependencies.get("@types/node"),
            Some(&Value::String("^10.0.0".to_string()))
        );
        assert!(!manifest.dependencies.contains_key("@alice/tstuto-api"));
    }

    #[test]
    fn test_render_uses_four_space_indent() {
        let manifest: PackageManifest = serde_json::from_str(DEV_MANIFEST).unwrap();
        let rendered = String::from_utf8(manifest.render().unwrap()).unwrap();

        assert!(rendered.contains("\n    \"name\""));
        assert!(!rendered.contains("\n  \"name\""));
    }

    #[test]
    fn test_manifest_without_dependencies_object() {
        let manifest: PackageManifest =
            serde_json::from_str(r#"{"name": "tstuto-api", "version": "0.0.0"}"#).unwrap();
        assert!(manifest.dependencies.is_empty());

        let mut manifest = manifest;
        manifest.scope_for_release(
            "alice",
            &version(),
            &PackageDefinition::new("tstuto-api", &[]),
        );
        assert_eq!(manifest.name, "@alice/tstuto-api");
        assert!(manifest.dependencies.is_empty());
    }

    #[tokio::test]
    async fn test_load_and_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(MANIFEST_FILE);
        fs::write(&path, DEV_MANIFEST).await.unwrap();

        let manifest = PackageManifest::load(&path).await.unwrap();
        manifest.save(&path).await.unwrap();

        let reloaded = PackageManifest::load(&path).await.unwrap();
        assert_eq!(manifest, reloaded);
    }

    #[tokio::test]
    async fn test_load_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(MANIFEST_FILE);

        let result = PackageManifest::load(&path).await;
        assert!(matches!(result, Err(ReleaseError::ManifestRead { .. })));
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(MANIFEST_FILE);
        fs::write(&path, "{not json").await.unwrap();

        let result = PackageManifest::load(&path).await;
        assert!(matches!(result, Err(ReleaseError::ManifestParse { .. })));
    }

    #[test]
    fn test_package_dir_layout() {
        let dir = package_dir(Path::new("/ws"), "packages", "alice", "tstuto-api");
        assert_eq!(dir, PathBuf::from("/ws/packages/@alice/tstuto-api"));
        assert_eq!(
            manifest_path(&dir),
            PathBuf::from("/ws/packages/@alice/tstuto-api/package.json")
        );
    }

    #[test]
    fn test_validate_package_name_valid() {
        assert!(validate_package_name("tstuto-api").is_empty());
        assert!(validate_package_name("@alice/tstuto-api").is_empty());
    }

    #[test]
    fn test_validate_package_name_uppercase() {
        assert!(!validate_package_name("TstutoApi").is_empty());
    }

    #[test]
    fn test_validate_package_name_leading_dot() {
        assert!(!validate_package_name(".tstuto").is_empty());
    }

    #[test]
    fn test_validate_package_name_too_long() {
        let long_name = "a".repeat(215);
        assert!(!validate_package_name(&long_name).is_empty());
    }
}
