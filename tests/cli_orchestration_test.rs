use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use cosmodrome::boundary::ReleaseWarning;
use cosmodrome::cli::{Collaborators, Provider, ReleaseOrchestrator, ReleaseOutcome, ReleaseStep};
use cosmodrome::config::GitHubConfig;
use cosmodrome::git::{Author, GitOperation, MockRepository};
use cosmodrome::process::CommandRunner;
use cosmodrome::publish::{PublishedRelease, ReleasePublisher, RemoteReleaseRequest};
use cosmodrome::ui::{Prompter, Reporter};
use cosmodrome::{CosmodromeError, Result};

// ============================================================================
// Scripted collaborators
// ============================================================================

#[derive(Debug, Clone)]
enum Answer {
    Select(usize),
    Confirm(bool),
    Input(&'static str),
    /// Accept whatever default the prompt offers
    Default,
}

struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    fn new(answers: Vec<Answer>) -> Self {
        ScriptedPrompter {
            answers: RefCell::new(answers.into()),
            asked: RefCell::new(Vec::new()),
        }
    }

    fn next(&self, message: &str) -> Answer {
        self.asked.borrow_mut().push(message.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected prompt: {}", message))
    }

    fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&self, message: &str, items: &[String], default: usize) -> Result<usize> {
        match self.next(message) {
            Answer::Select(index) => {
                assert!(index < items.len(), "{} has no item {}", message, index);
                Ok(index)
            }
            Answer::Default => Ok(default),
            other => panic!("expected a selection for '{}', got {:?}", message, other),
        }
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        match self.next(message) {
            Answer::Confirm(value) => Ok(value),
            Answer::Default => Ok(default),
            other => panic!("expected a confirmation for '{}', got {:?}", message, other),
        }
    }

    fn input(&self, message: &str, default: &str) -> Result<String> {
        match self.next(message) {
            Answer::Input(value) => Ok(value.to_string()),
            Answer::Default => Ok(default.to_string()),
            other => panic!("expected text for '{}', got {:?}", message, other),
        }
    }
}

#[derive(Default)]
struct RecordingRunner {
    calls: RefCell<Vec<(String, PathBuf)>>,
    fail: bool,
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<String> {
        let command = format!("{} {}", program, args.join(" "));
        if self.fail {
            return Err(CosmodromeError::process(command, "npm ERR! code E401\n"));
        }
        self.calls.borrow_mut().push((command, cwd.to_path_buf()));
        Ok(String::new())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    requests: Mutex<Vec<(RemoteReleaseRequest, GitHubConfig)>>,
    fail: bool,
}

impl RecordingPublisher {
    fn requests(&self) -> Vec<RemoteReleaseRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }
}

#[async_trait]
impl ReleasePublisher for RecordingPublisher {
    async fn publish(
        &self,
        request: &RemoteReleaseRequest,
        credentials: &GitHubConfig,
    ) -> Result<PublishedRelease> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), credentials.clone()));
        if self.fail {
            return Err(CosmodromeError::remote(Some(401), "Bad credentials"));
        }
        Ok(PublishedRelease {
            id: 7,
            html_url: Some(format!("https://github.com/acme/rocket/releases/{}", request.tag_name)),
        })
    }
}

#[derive(Default)]
struct RecordingReporter {
    lines: RefCell<Vec<String>>,
    warnings: RefCell<Vec<ReleaseWarning>>,
}

impl Reporter for RecordingReporter {
    fn pending(&self, message: &str) {
        self.lines.borrow_mut().push(format!("pending: {}", message));
    }

    fn complete(&self, message: &str) {
        self.lines.borrow_mut().push(format!("complete: {}", message));
    }

    fn success(&self, message: &str) {
        self.lines.borrow_mut().push(format!("success: {}", message));
    }

    fn warn(&self, warning: &ReleaseWarning) {
        self.warnings.borrow_mut().push(warning.clone());
    }

    fn error(&self, message: &str) {
        self.lines.borrow_mut().push(format!("error: {}", message));
    }
}

struct Harness {
    repo: MockRepository,
    runner: RecordingRunner,
    prompter: ScriptedPrompter,
    reporter: RecordingReporter,
    publisher: RecordingPublisher,
}

impl Harness {
    fn new(answers: Vec<Answer>) -> Self {
        Harness {
            repo: MockRepository::new(),
            runner: RecordingRunner::default(),
            prompter: ScriptedPrompter::new(answers),
            reporter: RecordingReporter::default(),
            publisher: RecordingPublisher::default(),
        }
    }

    fn with_repo(mut self, repo: MockRepository) -> Self {
        self.repo = repo;
        self
    }

    fn with_failing_npm(mut self) -> Self {
        self.runner.fail = true;
        self
    }

    fn with_failing_publish(mut self) -> Self {
        self.publisher.fail = true;
        self
    }

    async fn run(&self, root: &Path) -> (Result<ReleaseOutcome>, ReleaseStep) {
        let deps = Collaborators {
            repository: &self.repo,
            runner: &self.runner,
            prompter: &self.prompter,
            reporter: &self.reporter,
            publisher: &self.publisher,
        };
        let mut orchestrator = ReleaseOrchestrator::new(root, ".cosmodrome.json", deps);
        let result = orchestrator.run().await;
        (result, orchestrator.current_step())
    }

    fn commands(&self) -> Vec<String> {
        self.runner
            .calls
            .borrow()
            .iter()
            .map(|(command, _)| command.clone())
            .collect()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

const CONFIG_WITH_GITHUB: &str = r#"{
  "preReleasePrefix": "alpha",
  "releaseCommitPrefix": "release",
  "git": { "authorEmail": "bot@example.com", "authorUsername": "release-bot" },
  "github": { "owner": "acme", "repo": "rocket", "token": "t0k" }
}"#;

const CONFIG_WITHOUT_GITHUB: &str = r#"{
  "preReleasePrefix": "alpha",
  "releaseCommitPrefix": "release",
  "git": { "authorEmail": "bot@example.com", "authorUsername": "release-bot" }
}"#;

fn project(version: &str, config: Option<&str>) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("package.json"),
        format!(r#"{{"name": "rocket", "version": "{}"}}"#, version),
    )
    .unwrap();
    if let Some(config) = config {
        fs::write(temp.path().join(".cosmodrome.json"), config).unwrap();
    }
    temp
}

fn monorepo() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("package.json"),
        r#"{"name": "root", "private": true, "workspaces": ["packages/*"]}"#,
    )
    .unwrap();
    for (dir, manifest) in [
        ("packages/api", r#"{"name": "@acme/api", "version": "0.4.1"}"#),
        (
            "packages/web",
            r#"{"name": "web", "slug": "webapp", "version": "1.0.0"}"#,
        ),
    ] {
        fs::create_dir_all(temp.path().join(dir)).unwrap();
        fs::write(temp.path().join(dir).join("package.json"), manifest).unwrap();
    }
    fs::write(temp.path().join(".cosmodrome.json"), CONFIG_WITH_GITHUB).unwrap();
    temp
}

fn author() -> Author {
    Author::new("release-bot", "bot@example.com")
}

/// Answers for a GitHub release accepting every default after the action
fn github_defaults(mut head: Vec<Answer>) -> Vec<Answer> {
    head.extend(vec![
        Answer::Default, // commit message
        Answer::Default, // create tag
        Answer::Default, // push
        Answer::Default, // provider: GitHub
        Answer::Default, // draft
        Answer::Default, // release notes
        Answer::Default, // target branch
    ]);
    head
}

// ============================================================================
// Happy paths
// ============================================================================

#[tokio::test]
async fn test_stable_minor_release_runs_every_step() {
    let temp = project("1.2.3", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(github_defaults(vec![
        Answer::Select(1),      // minor
        Answer::Confirm(false), // not a pre-release
    ]));

    let (result, step) = harness.run(temp.path()).await;
    let outcome = result.unwrap();

    assert_eq!(step, ReleaseStep::Completed);
    assert_eq!(outcome.intent.current_version.to_string(), "1.2.3");
    assert_eq!(outcome.intent.new_version.to_string(), "1.3.0");
    assert!(!outcome.intent.is_pre_release);
    assert_eq!(outcome.metadata.tag_name, "v1.3.0");
    assert_eq!(outcome.commit, "abc1234");
    assert_eq!(outcome.release.as_ref().map(|r| r.id), Some(7));
    assert!(outcome.warnings.is_empty());

    assert_eq!(
        harness.commands(),
        vec!["npm pkg set version=1.3.0", "npm i"]
    );
    assert!(harness
        .runner
        .calls
        .borrow()
        .iter()
        .all(|(_, cwd)| cwd == temp.path()));

    assert_eq!(
        harness.repo.operations(),
        vec![
            GitOperation::Commit {
                message: "release: v1.3.0".to_string(),
                author: author(),
            },
            GitOperation::Tag("v1.3.0".to_string()),
            GitOperation::PushBranch {
                remote: "origin".to_string(),
                branch: "main".to_string(),
            },
            GitOperation::PushTag {
                remote: "origin".to_string(),
                tag: "v1.3.0".to_string(),
            },
        ]
    );

    assert_eq!(
        harness.publisher.requests(),
        vec![RemoteReleaseRequest {
            tag_name: "v1.3.0".to_string(),
            target_branch: "main".to_string(),
            release_name: "v1.3.0".to_string(),
            draft: false,
            pre_release: false,
            generate_notes: true,
        }]
    );
}

#[tokio::test]
async fn test_stable_to_pre_release_on_devops() {
    let temp = project("1.2.3", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(vec![
        Answer::Select(0),     // major
        Answer::Confirm(true), // must be a pre-release
        Answer::Default,       // commit message
        Answer::Default,       // create tag
        Answer::Default,       // push
        Answer::Select(1),     // DevOps
    ]);

    let (result, step) = harness.run(temp.path()).await;
    let outcome = result.unwrap();

    assert_eq!(step, ReleaseStep::Completed);
    assert_eq!(outcome.intent.new_version.to_string(), "2.0.0-alpha.1");
    assert!(outcome.intent.is_pre_release);
    assert_eq!(outcome.choices.provider, Provider::DevOps);
    assert!(outcome.release.is_none());
    assert!(harness.publisher.requests().is_empty());
    assert_eq!(
        outcome.warnings,
        vec![ReleaseWarning::UnsupportedProvider {
            provider: "DevOps".to_string(),
            release_name: "v2.0.0-alpha.1".to_string(),
        }]
    );
    assert_eq!(*harness.reporter.warnings.borrow(), outcome.warnings);
}

#[tokio::test]
async fn test_pre_release_increment_skips_pre_release_question() {
    let temp = project("2.0.0-alpha.1", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(github_defaults(vec![Answer::Select(0)])); // pre-release

    let (result, _) = harness.run(temp.path()).await;
    let outcome = result.unwrap();

    assert_eq!(outcome.intent.new_version.to_string(), "2.0.0-alpha.2");
    assert!(!harness
        .prompter
        .asked()
        .iter()
        .any(|message| message.contains("pre-release")));

    let requests = harness.publisher.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].pre_release);
    assert_eq!(requests[0].tag_name, "v2.0.0-alpha.2");
}

#[tokio::test]
async fn test_promote_produces_stable_release() {
    let temp = project("2.0.0-alpha.2", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(github_defaults(vec![Answer::Select(1)])); // promote

    let (result, _) = harness.run(temp.path()).await;
    let outcome = result.unwrap();

    assert_eq!(outcome.intent.new_version.to_string(), "2.0.0");
    assert!(!outcome.intent.is_pre_release);
    assert!(!harness.publisher.requests()[0].pre_release);
    assert_eq!(harness.commands()[0], "npm pkg set version=2.0.0");
}

#[tokio::test]
async fn test_other_pre_release_tag_is_treated_as_stable() {
    let temp = project("1.0.0-beta.3", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(github_defaults(vec![
        Answer::Select(2), // patch
        Answer::Confirm(false),
    ]));

    let (result, _) = harness.run(temp.path()).await;
    assert_eq!(result.unwrap().intent.new_version.to_string(), "1.0.1");
    assert!(harness.prompter.asked().contains(&"Is a pre-release ?".to_string()));
}

#[tokio::test]
async fn test_monorepo_workspace_release() {
    let temp = monorepo();
    let harness = Harness::new(github_defaults(vec![
        Answer::Select(1), // packages/web
        Answer::Select(2), // patch
        Answer::Confirm(false),
    ]));

    let (result, _) = harness.run(temp.path()).await;
    let outcome = result.unwrap();

    assert_eq!(outcome.metadata.tag_name, "webapp@v1.0.1");
    assert_eq!(outcome.metadata.commit_message, "release: webapp@v1.0.1");
    assert_eq!(harness.prompter.asked()[0], "choose the workspace");

    let web_dir = temp.path().join("packages/web");
    assert!(harness
        .runner
        .calls
        .borrow()
        .iter()
        .all(|(_, cwd)| *cwd == web_dir));
    assert!(harness
        .repo
        .operations()
        .contains(&GitOperation::Tag("webapp@v1.0.1".to_string())));
}

#[tokio::test]
async fn test_custom_answers_flow_into_git_and_release() {
    let temp = project("0.1.2", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(vec![
        Answer::Select(2),             // patch
        Answer::Confirm(false),        // stable
        Answer::Input("chore: ship it"),
        Answer::Default,               // create tag
        Answer::Default,               // push
        Answer::Default,               // GitHub
        Answer::Confirm(true),         // draft
        Answer::Confirm(false),        // no generated notes
        Answer::Input("release/0.1"),  // target branch
    ]);

    let (result, _) = harness.run(temp.path()).await;
    let outcome = result.unwrap();

    assert_eq!(outcome.choices.commit_message, "chore: ship it");
    assert_eq!(
        harness.repo.operations()[0],
        GitOperation::Commit {
            message: "chore: ship it".to_string(),
            author: author(),
        }
    );

    let request = &harness.publisher.requests()[0];
    assert!(request.draft);
    assert!(!request.generate_notes);
    assert_eq!(request.target_branch, "release/0.1");
    assert_eq!(request.release_name, "v0.1.3");
}

#[tokio::test]
async fn test_declined_tag_skips_tag_and_tag_push() {
    let temp = project("1.0.0", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(vec![
        Answer::Select(2),
        Answer::Confirm(false),
        Answer::Default,        // commit message
        Answer::Confirm(false), // no tag
        Answer::Default,        // push
        Answer::Select(1),      // DevOps
    ]);

    let (result, _) = harness.run(temp.path()).await;
    result.unwrap();

    let operations = harness.repo.operations();
    assert_eq!(operations.len(), 2);
    assert!(matches!(operations[0], GitOperation::Commit { .. }));
    assert!(matches!(operations[1], GitOperation::PushBranch { .. }));
}

#[tokio::test]
async fn test_declined_push_keeps_release_local() {
    let temp = project("1.0.0", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(vec![
        Answer::Select(2),
        Answer::Confirm(false),
        Answer::Default,        // commit message
        Answer::Default,        // create tag
        Answer::Confirm(false), // no push
        Answer::Default,        // GitHub
        Answer::Default,
        Answer::Default,
        Answer::Default,
    ]);

    let (result, step) = harness.run(temp.path()).await;
    let outcome = result.unwrap();

    assert_eq!(step, ReleaseStep::Completed);
    assert!(outcome.release.is_none());
    assert!(harness.publisher.requests().is_empty());
    assert_eq!(
        harness.repo.operations().last(),
        Some(&GitOperation::PushTag {
            remote: "origin".to_string(),
            tag: "v1.0.1".to_string(),
        })
    );
    assert_eq!(
        outcome.warnings,
        vec![
            ReleaseWarning::CommitNotPushed {
                remote: "origin".to_string(),
                branch: "main".to_string(),
            },
            ReleaseWarning::ReleaseNotCreated {
                release_name: "v1.0.1".to_string(),
            },
        ]
    );
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_dirty_tree_stops_before_any_side_effect() {
    let temp = project("1.2.3", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(Vec::new()).with_repo(MockRepository::new().with_local_changes());

    let (result, step) = harness.run(temp.path()).await;

    assert!(matches!(result, Err(CosmodromeError::DirtyWorkingTree)));
    assert_eq!(step, ReleaseStep::CleanCheck);
    assert!(harness.prompter.asked().is_empty());
    assert!(harness.commands().is_empty());
    assert!(harness.repo.operations().is_empty());
    assert!(harness.publisher.requests().is_empty());
}

#[tokio::test]
async fn test_detached_head_is_rejected() {
    let temp = project("1.2.3", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(Vec::new()).with_repo(MockRepository::new().with_branch(None));

    let (result, step) = harness.run(temp.path()).await;

    assert!(matches!(result, Err(CosmodromeError::DetachedHead)));
    assert_eq!(step, ReleaseStep::CleanCheck);
}

#[tokio::test]
async fn test_missing_config_file() {
    let temp = project("1.2.3", None);
    let harness = Harness::new(Vec::new());

    let (result, step) = harness.run(temp.path()).await;

    assert!(matches!(result, Err(CosmodromeError::ConfigNotFound(_))));
    assert_eq!(step, ReleaseStep::ConfigLoad);
    assert!(harness.commands().is_empty());
}

#[tokio::test]
async fn test_invalid_config_schema() {
    let temp = project("1.2.3", Some(r#"{"preReleasePrefix": "alpha"}"#));
    let harness = Harness::new(Vec::new());

    let (result, step) = harness.run(temp.path()).await;

    assert!(matches!(result, Err(CosmodromeError::InvalidConfigSchema(_))));
    assert_eq!(step, ReleaseStep::ConfigLoad);
}

#[tokio::test]
async fn test_missing_manifest() {
    let temp = TempDir::new().unwrap();
    let harness = Harness::new(Vec::new());

    let (result, step) = harness.run(temp.path()).await;

    assert!(matches!(result, Err(CosmodromeError::ManifestNotFound(_))));
    assert_eq!(step, ReleaseStep::ProjectLoad);
}

#[tokio::test]
async fn test_malformed_version_is_rejected_before_prompting() {
    let temp = project("1.2", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(Vec::new());

    let (result, step) = harness.run(temp.path()).await;

    assert!(matches!(
        result,
        Err(CosmodromeError::MalformedVersion { .. })
    ));
    assert_eq!(step, ReleaseStep::StateDetection);
    assert!(harness.prompter.asked().is_empty());
}

#[tokio::test]
async fn test_package_manager_failure_leaves_git_untouched() {
    let temp = project("1.2.3", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(vec![Answer::Select(2), Answer::Confirm(false)]).with_failing_npm();

    let (result, step) = harness.run(temp.path()).await;

    match result {
        Err(CosmodromeError::ProcessSpawnFailure { command, stderr }) => {
            assert_eq!(command, "npm pkg set version=1.2.4");
            assert_eq!(stderr, "npm ERR! code E401\n");
        }
        other => panic!("unexpected result: {:?}", other.map(|o| o.metadata)),
    }
    assert_eq!(step, ReleaseStep::VersionApply);
    assert!(harness.repo.operations().is_empty());
}

#[tokio::test]
async fn test_missing_github_config_after_push() {
    let temp = project("1.2.3", Some(CONFIG_WITHOUT_GITHUB));
    let harness = Harness::new(github_defaults(vec![
        Answer::Select(2),
        Answer::Confirm(false),
    ]));

    let (result, step) = harness.run(temp.path()).await;

    assert!(matches!(
        result,
        Err(CosmodromeError::MissingProviderConfig(_))
    ));
    assert_eq!(step, ReleaseStep::RemoteReleaseCreation);
    // no rollback: commit, tag and pushes stay in place
    assert_eq!(harness.repo.operations().len(), 4);
    assert!(harness.publisher.requests().is_empty());
}

#[tokio::test]
async fn test_publish_failure_is_not_rolled_back() {
    let temp = project("1.2.3", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(github_defaults(vec![
        Answer::Select(0),
        Answer::Confirm(false),
    ]))
    .with_failing_publish();

    let (result, step) = harness.run(temp.path()).await;

    assert!(matches!(
        result,
        Err(CosmodromeError::RemoteApiFailure {
            status: Some(401),
            ..
        })
    ));
    assert_eq!(step, ReleaseStep::RemoteReleaseCreation);
    assert_eq!(harness.publisher.requests().len(), 1);
    assert_eq!(harness.repo.operations().len(), 4);
    assert_eq!(harness.commands().len(), 2);
}

#[tokio::test]
async fn test_failed_push_stops_before_release() {
    let temp = project("1.2.3", Some(CONFIG_WITH_GITHUB));
    let harness = Harness::new(github_defaults(vec![
        Answer::Select(2),
        Answer::Confirm(false),
    ]))
    .with_repo(MockRepository::new().with_failing_push());

    let (result, step) = harness.run(temp.path()).await;

    assert!(matches!(result, Err(CosmodromeError::Git(_))));
    assert_eq!(step, ReleaseStep::RemoteGitUpdate);
    assert!(harness.publisher.requests().is_empty());
}
