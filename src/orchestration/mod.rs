pub mod history;
pub mod plan;
pub mod release_orchestrator;

pub use history::{HistoryOptions, ReleaseHistory, ReleaseRecord};
pub use plan::ReleasePlan;
pub use release_orchestrator::{ReleaseOptions, ReleaseOrchestrator, ReleaseReport};
