//! Release workflow orchestration
//!
//! The release runs as a strict sequence of named steps. No step begins
//! until the previous one succeeded, and any failure ends the run with the
//! orchestrator parked on the step that failed. Nothing is rolled back:
//! once the version has been applied, a later failure leaves the bump,
//! commit and tag in place.
//!
//! Every side effect goes through an injected collaborator, so the whole
//! workflow can be replayed in tests.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::boundary::ReleaseWarning;
use crate::config::{load_config, ReleaseConfig};
use crate::domain::{
    detect_state, Action, PreReleasePattern, ReleaseIntent, ReleaseState, RepoMetadata, Version,
};
use crate::error::{CosmodromeError, Result};
use crate::git::{Author, Repository};
use crate::process::{CommandRunner, PackageManager};
use crate::publish::{PublishedRelease, ReleasePublisher, RemoteReleaseRequest};
use crate::ui::{Prompter, Reporter};
use crate::workspace::WorkspaceContext;

/// Named states of a release run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleaseStep {
    NotStarted,
    CleanCheck,
    ProjectLoad,
    ConfigLoad,
    StateDetection,
    ActionSelection,
    VersionCompute,
    VersionApply,
    MetadataCollection,
    LocalGitUpdate,
    RemoteGitUpdate,
    RemoteReleaseCreation,
    Completed,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseStep::NotStarted => "not started",
            ReleaseStep::CleanCheck => "working tree check",
            ReleaseStep::ProjectLoad => "project loading",
            ReleaseStep::ConfigLoad => "configuration loading",
            ReleaseStep::StateDetection => "release state detection",
            ReleaseStep::ActionSelection => "action selection",
            ReleaseStep::VersionCompute => "version computation",
            ReleaseStep::VersionApply => "version update",
            ReleaseStep::MetadataCollection => "release details collection",
            ReleaseStep::LocalGitUpdate => "local git update",
            ReleaseStep::RemoteGitUpdate => "push",
            ReleaseStep::RemoteReleaseCreation => "remote release creation",
            ReleaseStep::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Where the repository is hosted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitHub,
    DevOps,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::GitHub, Provider::DevOps];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::GitHub => "GitHub",
            Provider::DevOps => "DevOps",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Answers gathered before touching git
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseChoices {
    pub commit_message: String,
    pub create_tag: bool,
    pub push: bool,
    pub provider: Provider,
    pub draft: bool,
    pub generate_notes: bool,
    pub target_branch: String,
}

/// Result of a completed release run
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub intent: ReleaseIntent,
    pub metadata: RepoMetadata,
    pub choices: ReleaseChoices,
    /// Short hash of the release commit
    pub commit: String,
    pub release: Option<PublishedRelease>,
    pub warnings: Vec<ReleaseWarning>,
}

/// External capabilities a release run needs
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub repository: &'a dyn Repository,
    pub runner: &'a dyn CommandRunner,
    pub prompter: &'a dyn Prompter,
    pub reporter: &'a dyn Reporter,
    pub publisher: &'a dyn ReleasePublisher,
}

/// Action picked at [ReleaseStep::ActionSelection]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Selection {
    action: Action,
    produce_pre_release: bool,
}

/// Drives one release run from a clean tree to a published release
pub struct ReleaseOrchestrator<'a> {
    root: PathBuf,
    config_path: PathBuf,
    deps: Collaborators<'a>,
    package_manager: PackageManager,
    step: ReleaseStep,
}

impl<'a> ReleaseOrchestrator<'a> {
    /// `config_path` is resolved against `root` when relative
    pub fn new(root: impl Into<PathBuf>, config_path: impl AsRef<Path>, deps: Collaborators<'a>) -> Self {
        let root = root.into();
        let config_path = root.join(config_path);

        ReleaseOrchestrator {
            root,
            config_path,
            deps,
            package_manager: PackageManager::default(),
            step: ReleaseStep::NotStarted,
        }
    }

    /// The step the run is on, or failed on
    pub fn current_step(&self) -> ReleaseStep {
        self.step
    }

    /// Run every step in order.
    pub async fn run(&mut self) -> Result<ReleaseOutcome> {
        let branch = self.check_clean()?;
        let workspace = self.load_project()?;
        let config = self.load_config()?;
        let (current, state) = self.detect_state(&workspace, &config)?;
        let selection = self.select_action(&state)?;
        let (intent, metadata) =
            self.compute_version(&workspace, &config, current, &state, selection)?;
        self.apply_version(&workspace, &intent)?;
        let choices = self.collect_metadata(&metadata, &branch)?;
        let commit = self.update_local_git(&config, &metadata, &choices)?;

        let mut warnings = Vec::new();
        self.update_remote_git(&config, &metadata, &choices, &branch, &mut warnings)?;
        let release = self
            .create_remote_release(&config, &intent, &metadata, &choices, &mut warnings)
            .await?;

        self.enter(ReleaseStep::Completed);
        self.deps.reporter.success("well done 🚀 !!");

        Ok(ReleaseOutcome {
            intent,
            metadata,
            choices,
            commit,
            release,
            warnings,
        })
    }

    fn enter(&mut self, step: ReleaseStep) {
        debug!(%step, "entering release step");
        self.step = step;
    }

    fn warn(&self, warnings: &mut Vec<ReleaseWarning>, warning: ReleaseWarning) {
        self.deps.reporter.warn(&warning);
        warnings.push(warning);
    }

    /// Require a clean working tree on a checked-out branch
    fn check_clean(&mut self) -> Result<String> {
        self.enter(ReleaseStep::CleanCheck);

        if !self.deps.repository.is_clean()? {
            return Err(CosmodromeError::DirtyWorkingTree);
        }

        self.deps.repository.current_branch()
    }

    fn load_project(&mut self) -> Result<WorkspaceContext> {
        self.enter(ReleaseStep::ProjectLoad);

        let prompter = self.deps.prompter;
        let workspace = WorkspaceContext::resolve(&self.root, |workspaces| {
            let index = prompter.select("choose the workspace", workspaces, 0)?;
            workspaces
                .get(index)
                .cloned()
                .ok_or_else(|| CosmodromeError::prompt(format!("no workspace at index {}", index)))
        })?;

        info!(
            workspace = %workspace.active_workspace_path,
            monorepo = workspace.is_monorepo,
            "resolved workspace"
        );
        Ok(workspace)
    }

    fn load_config(&mut self) -> Result<ReleaseConfig> {
        self.enter(ReleaseStep::ConfigLoad);

        let config = load_config(&self.config_path)?;
        self.deps.reporter.complete("configuration loaded successfully");
        Ok(config)
    }

    fn detect_state(
        &mut self,
        workspace: &WorkspaceContext,
        config: &ReleaseConfig,
    ) -> Result<(Version, ReleaseState)> {
        self.enter(ReleaseStep::StateDetection);

        let current = workspace.current_version()?;
        let pattern = PreReleasePattern::new(&config.pre_release_prefix)?;
        let state = detect_state(&current, &pattern);

        debug!(
            version = %current,
            tag = pattern.tag(),
            pre_release = state.is_pre_release,
            "detected release state"
        );
        Ok((current, state))
    }

    fn select_action(&mut self, state: &ReleaseState) -> Result<Selection> {
        self.enter(ReleaseStep::ActionSelection);

        let items: Vec<String> = state
            .allowed_actions
            .iter()
            .map(|action| action.to_string())
            .collect();
        let index = self
            .deps
            .prompter
            .select("choose a version type", &items, 0)?;
        let action = state
            .allowed_actions
            .get(index)
            .copied()
            .ok_or_else(|| CosmodromeError::prompt(format!("no action at index {}", index)))?;

        let must_be_pre_release = if action == Action::Promote {
            false
        } else if state.is_pre_release {
            true
        } else {
            self.deps.prompter.confirm("Is a pre-release ?", false)?
        };

        Ok(Selection {
            action,
            produce_pre_release: action == Action::PreRelease || must_be_pre_release,
        })
    }

    fn compute_version(
        &mut self,
        workspace: &WorkspaceContext,
        config: &ReleaseConfig,
        current: Version,
        state: &ReleaseState,
        selection: Selection,
    ) -> Result<(ReleaseIntent, RepoMetadata)> {
        self.enter(ReleaseStep::VersionCompute);

        ensure_allowed(state, selection.action, &current)?;
        let new_version = current.transition(
            selection.action,
            &config.pre_release_prefix,
            selection.produce_pre_release,
        )?;
        let intent = ReleaseIntent::new(current, new_version);
        let metadata = RepoMetadata::build(
            &intent,
            &workspace.identity()?,
            &config.release_commit_prefix,
        );

        info!(
            from = %intent.current_version,
            to = %intent.new_version,
            tag = %metadata.tag_name,
            "computed release"
        );
        Ok((intent, metadata))
    }

    fn apply_version(&mut self, workspace: &WorkspaceContext, intent: &ReleaseIntent) -> Result<()> {
        self.enter(ReleaseStep::VersionApply);

        let dir = workspace.active_dir();
        let new_version = intent.new_version.to_string();

        self.deps.reporter.pending("updating version ...");
        debug!(program = self.package_manager.program(), dir = %dir.display(), "applying version");
        self.package_manager
            .set_version(self.deps.runner, &dir, &new_version)?;
        self.package_manager
            .refresh_lockfile(self.deps.runner, &dir)?;
        self.deps.reporter.complete(&format!(
            "version updated from {} to {} in package.json and package-lock.json",
            intent.current_version, intent.new_version
        ));
        Ok(())
    }

    fn collect_metadata(&mut self, metadata: &RepoMetadata, branch: &str) -> Result<ReleaseChoices> {
        self.enter(ReleaseStep::MetadataCollection);

        let prompter = self.deps.prompter;
        self.deps.reporter.pending("asking for release details ...");

        let commit_message = prompter.input("Insert the commit message:", &metadata.commit_message)?;
        let create_tag = prompter.confirm("Create the tag ?", true)?;
        let push = prompter.confirm("Push ?", true)?;

        let providers: Vec<String> = Provider::ALL.iter().map(|p| p.to_string()).collect();
        let index = prompter.select("Choose the repository provider", &providers, 0)?;
        let provider = Provider::ALL
            .get(index)
            .copied()
            .ok_or_else(|| CosmodromeError::prompt(format!("no provider at index {}", index)))?;

        let mut choices = ReleaseChoices {
            commit_message,
            create_tag,
            push,
            provider,
            draft: false,
            generate_notes: true,
            target_branch: branch.to_string(),
        };

        if provider == Provider::GitHub {
            choices.draft = prompter.confirm("Mark the release as draft ?", choices.draft)?;
            choices.generate_notes =
                prompter.confirm("Generate release notes automatically ?", choices.generate_notes)?;
            choices.target_branch = prompter.input(
                "Insert the git branch name for release ( default current ):",
                &choices.target_branch,
            )?;
        }

        self.deps.reporter.complete("all release details collected");
        Ok(choices)
    }

    /// Commit first, then tag the new commit
    fn update_local_git(
        &mut self,
        config: &ReleaseConfig,
        metadata: &RepoMetadata,
        choices: &ReleaseChoices,
    ) -> Result<String> {
        self.enter(ReleaseStep::LocalGitUpdate);

        let author = Author::new(&config.git.author_username, &config.git.author_email);
        let commit = self
            .deps
            .repository
            .commit_all(&choices.commit_message, &author)?;
        self.deps.reporter.complete(&format!(
            "created commit {} with message {}",
            commit, choices.commit_message
        ));

        if choices.create_tag {
            self.deps.repository.create_tag(&metadata.tag_name)?;
            self.deps
                .reporter
                .complete(&format!("created tag {}", metadata.tag_name));
        }

        Ok(commit)
    }

    fn update_remote_git(
        &mut self,
        config: &ReleaseConfig,
        metadata: &RepoMetadata,
        choices: &ReleaseChoices,
        branch: &str,
        warnings: &mut Vec<ReleaseWarning>,
    ) -> Result<()> {
        self.enter(ReleaseStep::RemoteGitUpdate);

        let remote = config.git.remote.as_str();
        let reporter = self.deps.reporter;

        if choices.push {
            reporter.pending("pushing new commit ...");
            self.deps.repository.push_branch(remote, branch)?;
            reporter.complete("commit pushed");
        } else {
            self.warn(
                warnings,
                ReleaseWarning::CommitNotPushed {
                    remote: remote.to_string(),
                    branch: branch.to_string(),
                },
            );
        }

        if choices.create_tag {
            reporter.pending("pushing new tag ...");
            self.deps.repository.push_tag(remote, &metadata.tag_name)?;
            reporter.complete("tag pushed");
        }

        Ok(())
    }

    async fn create_remote_release(
        &mut self,
        config: &ReleaseConfig,
        intent: &ReleaseIntent,
        metadata: &RepoMetadata,
        choices: &ReleaseChoices,
        warnings: &mut Vec<ReleaseWarning>,
    ) -> Result<Option<PublishedRelease>> {
        self.enter(ReleaseStep::RemoteReleaseCreation);

        if choices.provider != Provider::GitHub {
            self.warn(
                warnings,
                ReleaseWarning::UnsupportedProvider {
                    provider: choices.provider.to_string(),
                    release_name: metadata.release_name.clone(),
                },
            );
            return Ok(None);
        }

        let credentials = config
            .github
            .as_ref()
            .ok_or_else(|| CosmodromeError::MissingProviderConfig("github".to_string()))?;

        if !choices.push {
            self.warn(
                warnings,
                ReleaseWarning::ReleaseNotCreated {
                    release_name: metadata.release_name.clone(),
                },
            );
            return Ok(None);
        }

        let request = RemoteReleaseRequest {
            tag_name: metadata.tag_name.clone(),
            target_branch: choices.target_branch.clone(),
            release_name: metadata.release_name.clone(),
            draft: choices.draft,
            pre_release: intent.is_pre_release,
            generate_notes: choices.generate_notes,
        };

        self.deps.reporter.pending("pushing release on GitHub ...");
        let release = self.deps.publisher.publish(&request, credentials).await?;
        self.deps
            .reporter
            .complete(&format!("Release {} created", metadata.release_name));

        Ok(Some(release))
    }
}

/// Reject an action the detected state does not offer
fn ensure_allowed(state: &ReleaseState, action: Action, current: &Version) -> Result<()> {
    if state.allows(action) {
        return Ok(());
    }
    Err(CosmodromeError::IllegalTransition {
        action: action.to_string(),
        version: current.to_string(),
        reason: "not allowed from the current release state".to_string(),
    })
}
