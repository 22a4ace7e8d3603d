//! Command implementations behind the `cosmodrome` binary

pub mod init;
pub mod orchestration;

pub use init::run_init;
pub use orchestration::{
    Collaborators, Provider, ReleaseChoices, ReleaseOrchestrator, ReleaseOutcome, ReleaseStep,
};
