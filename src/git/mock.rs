use crate::error::{CosmodromeError, Result};
use crate::git::{Author, Repository};
use std::cell::{Cell, RefCell};

/// A side effect recorded by [MockRepository]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOperation {
    Commit { message: String, author: Author },
    Tag(String),
    PushBranch { remote: String, branch: String },
    PushTag { remote: String, tag: String },
}

/// Mock repository for testing without actual git operations
pub struct MockRepository {
    clean: Cell<bool>,
    branch: Option<String>,
    fail_push: bool,
    operations: RefCell<Vec<GitOperation>>,
}

impl MockRepository {
    /// Create a clean mock repository on `main`
    pub fn new() -> Self {
        MockRepository {
            clean: Cell::new(true),
            branch: Some("main".to_string()),
            fail_push: false,
            operations: RefCell::new(Vec::new()),
        }
    }

    /// Mark the working tree as having local changes
    pub fn with_local_changes(self) -> Self {
        self.clean.set(false);
        self
    }

    /// Set the checked-out branch; `None` simulates a detached HEAD
    pub fn with_branch(mut self, branch: Option<&str>) -> Self {
        self.branch = branch.map(str::to_string);
        self
    }

    /// Make every push fail
    pub fn with_failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    /// Operations performed so far, in order
    pub fn operations(&self) -> Vec<GitOperation> {
        self.operations.borrow().clone()
    }

    fn record(&self, operation: GitOperation) {
        self.operations.borrow_mut().push(operation);
    }

    fn push(&self, operation: GitOperation) -> Result<()> {
        if self.fail_push {
            return Err(CosmodromeError::Git(git2::Error::from_str(
                "remote rejected push",
            )));
        }
        self.record(operation);
        Ok(())
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn is_clean(&self) -> Result<bool> {
        Ok(self.clean.get())
    }

    fn current_branch(&self) -> Result<String> {
        self.branch.clone().ok_or(CosmodromeError::DetachedHead)
    }

    fn commit_all(&self, message: &str, author: &Author) -> Result<String> {
        self.record(GitOperation::Commit {
            message: message.to_string(),
            author: author.clone(),
        });
        Ok("abc1234".to_string())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let exists = self
            .operations
            .borrow()
            .iter()
            .any(|op| matches!(op, GitOperation::Tag(existing) if existing == name));
        if exists {
            return Err(CosmodromeError::Git(git2::Error::from_str(&format!(
                "tag '{}' already exists",
                name
            ))));
        }

        self.record(GitOperation::Tag(name.to_string()));
        Ok(())
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.push(GitOperation::PushBranch {
            remote: remote.to_string(),
            branch: branch.to_string(),
        })
    }

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        self.push(GitOperation::PushTag {
            remote: remote.to_string(),
            tag: tag.to_string(),
        })
    }
}
