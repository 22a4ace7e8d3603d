//! Domain logic - pure release rules independent of git, processes and prompts

pub mod action;
pub mod metadata;
pub mod prerelease;
pub mod state;
pub mod version;

pub use action::Action;
pub use metadata::{ProjectIdentity, ReleaseIntent, RepoMetadata};
pub use prerelease::PreRelease;
pub use state::{detect_state, PreReleasePattern, ReleaseState};
pub use version::{compute_new_version, Version};
