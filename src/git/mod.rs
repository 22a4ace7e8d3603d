//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! side effects of a release, so the orchestration can run against a real
//! repository or a recording mock.
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation for testing
//!
//! ```rust
//! # use cosmodrome::git::{Author, Repository};
//! # fn example<R: Repository>(repo: &R) -> cosmodrome::Result<()> {
//! if repo.is_clean()? {
//!     let author = Author::new("release-bot", "bot@example.com");
//!     repo.commit_all("release: v1.2.4", &author)?;
//!     repo.create_tag("v1.2.4")?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::{GitOperation, MockRepository};
pub use repository::Git2Repository;

use crate::error::Result;
use std::fmt;

/// Commit author identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Author {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Version-control operations a release needs
///
/// All methods return [crate::error::Result<T>]; implementations map their
/// underlying errors (like `git2::Error`) to [crate::error::CosmodromeError].
pub trait Repository {
    /// Whether the working tree has no uncommitted changes.
    ///
    /// Untracked files count as changes; ignored files do not.
    fn is_clean(&self) -> Result<bool>;

    /// Name of the checked-out branch.
    ///
    /// # Returns
    /// * `Ok(String)` - Branch name (e.g., "main")
    /// * `Err(DetachedHead)` - If HEAD does not point at a branch
    fn current_branch(&self) -> Result<String>;

    /// Commit every tracked modification, bypassing hooks.
    ///
    /// # Arguments
    /// * `message` - Commit message
    /// * `author` - Author identity recorded on the commit
    ///
    /// # Returns
    /// * `Ok(String)` - Short hash of the new commit
    fn commit_all(&self, message: &str, author: &Author) -> Result<String>;

    /// Create a lightweight tag at HEAD.
    ///
    /// Fails if a tag with the same name already exists.
    fn create_tag(&self, name: &str) -> Result<()>;

    /// Push `branch` to `remote`.
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;

    /// Push the tag `tag` to `remote`.
    fn push_tag(&self, remote: &str, tag: &str) -> Result<()>;
}
