pub mod core;
pub mod interaction;
pub mod manifest;
pub mod orchestration;
pub mod registry;

pub use crate::core::*;
pub use interaction::{PresetAnswers, TerminalPrompter};
pub use manifest::{PackageManifest, validate_package_name};
pub use orchestration::{
    HistoryOptions, ReleaseHistory, ReleaseOptions, ReleaseOrchestrator, ReleasePlan,
    ReleaseReport,
};
pub use registry::NpmRegistry;
