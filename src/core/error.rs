//! Error handling for the release workflow
//!
//! This module provides comprehensive error types with recovery guidance
//! using the thiserror crate for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    // Precondition errors
    #[error("npmにログインしていません")]
    NotAuthenticated,

    // Configuration errors
    #[error("設定ファイルが見つかりません: {path:?}")]
    ConfigNotFound { path: PathBuf },

    #[error("設定ファイルが不正です: {message}")]
    ConfigInvalid { message: String },

    #[error("パッケージ {name} が重複して定義されています")]
    DuplicatePackage { name: String },

    // Release plan errors
    #[error("パッケージ {package} の依存 {dependency} が設定に存在しません")]
    UnknownDependency { package: String, dependency: String },

    #[error("パッケージの依存関係に循環があります: {cycle}")]
    DependencyCycle { cycle: String },

    // Versioning errors
    #[error("公開済みバージョンが不正です ({package}: {raw})")]
    InvalidPreviousVersion { package: String, raw: String },

    // Manifest errors
    #[error("マニフェストを読み込めません ({path:?}): {message}")]
    ManifestRead { path: PathBuf, message: String },

    #[error("マニフェストを解析できません ({path:?}): {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("マニフェストを書き込めません ({path:?}): {message}")]
    ManifestWrite { path: PathBuf, message: String },

    // Registry errors
    #[error("レジストリへの問い合わせに失敗しました: {message}")]
    RegistryQuery { message: String },

    // Command execution errors
    #[error("コマンド実行エラー ({command}): {message}")]
    CommandFailed { command: String, message: String },
}

impl ReleaseError {
    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::NotAuthenticated => vec![
                "npm loginを実行してください",
                "npm whoamiで認証状態を確認できます",
            ],
            Self::ConfigNotFound { .. } => vec![
                "initコマンドで設定ファイルを生成できます",
                "ワークスペースのルートで実行しているか確認してください",
            ],
            Self::ConfigInvalid { .. } => {
                vec!["設定ファイルのYAML構文とフィールド名を確認してください"]
            }
            Self::DuplicatePackage { .. } => {
                vec!["packagesの各エントリ名を一意にしてください"]
            }
            Self::UnknownDependency { .. } => vec![
                "dependenciesには設定済みのパッケージ名のみ指定できます",
                "パッケージ名の綴りを確認してください",
            ],
            Self::DependencyCycle { .. } => {
                vec!["循環している依存関係を解消してください"]
            }
            Self::InvalidPreviousVersion { .. } => vec![
                "レジストリ上のバージョンをSemVer形式（例: 1.0.0）に修正してください",
            ],
            Self::ManifestRead { .. } | Self::ManifestParse { .. } => {
                vec!["package.jsonの存在とJSON構文を確認してください"]
            }
            Self::ManifestWrite { .. } => {
                vec!["ファイルの書き込み権限を確認してください"]
            }
            Self::RegistryQuery { .. } => vec![
                "ネットワーク接続を確認してください",
                "しばらく待ってから再試行してください",
            ],
            Self::CommandFailed { .. } => vec![
                "npmがインストールされているか確認してください",
                "コマンドの出力を確認してください",
            ],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            Self::ConfigInvalid { .. } => "CONFIG_INVALID",
            Self::DuplicatePackage { .. } => "DUPLICATE_PACKAGE",
            Self::UnknownDependency { .. } => "UNKNOWN_DEPENDENCY",
            Self::DependencyCycle { .. } => "DEPENDENCY_CYCLE",
            Self::InvalidPreviousVersion { .. } => "INVALID_PREVIOUS_VERSION",
            Self::ManifestRead { .. } => "MANIFEST_READ",
            Self::ManifestParse { .. } => "MANIFEST_PARSE",
            Self::ManifestWrite { .. } => "MANIFEST_WRITE",
            Self::RegistryQuery { .. } => "REGISTRY_QUERY_FAILED",
            Self::CommandFailed { .. } => "COMMAND_FAILED",
        }
    }

    /// Check if the error occurred before any manifest mutation can have happened
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated
                | Self::ConfigNotFound { .. }
                | Self::ConfigInvalid { .. }
                | Self::DuplicatePackage { .. }
                | Self::UnknownDependency { .. }
                | Self::DependencyCycle { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_authenticated_error() {
        let error = ReleaseError::NotAuthenticated;

        assert_eq!(error.code(), "NOT_AUTHENTICATED");
        assert!(error.is_precondition());
        assert!(!error.suggested_actions().is_empty());
        assert!(error.to_string().contains("ログイン"));
    }

    #[test]
    fn test_unknown_dependency_error() {
        let error = ReleaseError::UnknownDependency {
            package: "tstuto-server".to_string(),
            dependency: "tstuto-apii".to_string(),
        };

        assert_eq!(error.code(), "UNKNOWN_DEPENDENCY");
        assert!(error.is_precondition());
        let display = error.to_string();
        assert!(display.contains("tstuto-server"));
        assert!(display.contains("tstuto-apii"));
    }

    #[test]
    fn test_dependency_cycle_error() {
        let error = ReleaseError::DependencyCycle {
            cycle: "a -> b -> a".to_string(),
        };

        assert_eq!(error.code(), "DEPENDENCY_CYCLE");
        assert!(error.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_invalid_previous_version_error() {
        let error = ReleaseError::InvalidPreviousVersion {
            package: "@alice/tstuto-server".to_string(),
            raw: "not-a-version".to_string(),
        };

        assert_eq!(error.code(), "INVALID_PREVIOUS_VERSION");
        assert!(!error.is_precondition());
        let actions = error.suggested_actions();
        assert!(actions.iter().any(|a| a.contains("SemVer")));
    }

    #[test]
    fn test_manifest_errors_carry_path() {
        let error = ReleaseError::ManifestParse {
            path: PathBuf::from("/tmp/pkg/package.json"),
            message: "expected value at line 1".to_string(),
        };

        assert_eq!(error.code(), "MANIFEST_PARSE");
        assert!(error.to_string().contains("package.json"));
    }

    #[test]
    fn test_registry_query_error() {
        let error = ReleaseError::RegistryQuery {
            message: "connection refused".to_string(),
        };

        assert_eq!(error.code(), "REGISTRY_QUERY_FAILED");
        let actions = error.suggested_actions();
        assert!(actions.iter().any(|a| a.contains("ネットワーク")));
    }

    #[test]
    fn test_command_failed_error() {
        let error = ReleaseError::CommandFailed {
            command: "npm whoami".to_string(),
            message: "No such file or directory".to_string(),
        };

        assert_eq!(error.code(), "COMMAND_FAILED");
        assert!(error.to_string().contains("npm whoami"));
    }
}
