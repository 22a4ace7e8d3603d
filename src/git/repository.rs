use crate::error::{CosmodromeError, Result};
use crate::git::Author;
use git2::{Cred, CredentialType, PushOptions, RemoteCallbacks, Repository as Git2Repo, Signature};
use std::path::Path;
use tracing::{info, instrument};

/// Credential callbacks are retried by libgit2; give up after this many tries
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn push_refspec(&self, remote_name: &str, refspec: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name)?;
        let git_config = self.repo.config()?;
        let mut rejection: Option<String> = None;
        let mut attempts = 0;

        {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(|url, username_from_url, allowed_types| {
                attempts += 1;
                if attempts > MAX_CREDENTIAL_ATTEMPTS {
                    return Err(git2::Error::from_str("authentication failed"));
                }
                resolve_credentials(&git_config, url, username_from_url, allowed_types)
            });
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejection = Some(format!("{} rejected: {}", refname, message));
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);
            remote.push(&[refspec], Some(&mut push_options))?;
        }

        match rejection {
            Some(message) => Err(CosmodromeError::Git(git2::Error::from_str(&message))),
            None => Ok(()),
        }
    }
}

/// Supports SSH keys from ~/.ssh/, the SSH agent, configured credential
/// helpers for HTTPS, and libgit2 defaults.
fn resolve_credentials(
    git_config: &git2::Config,
    url: &str,
    username_from_url: Option<&str>,
    allowed_types: CredentialType,
) -> std::result::Result<Cred, git2::Error> {
    let username = username_from_url.unwrap_or("git");

    if allowed_types.contains(CredentialType::SSH_KEY) {
        if let Ok(cred) = Cred::ssh_key_from_agent(username) {
            return Ok(cred);
        }

        if let Some(ssh_dir) = dirs::home_dir().map(|home| home.join(".ssh")) {
            for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                let path = ssh_dir.join(key);
                if path.exists() {
                    if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                        return Ok(cred);
                    }
                }
            }
        }
    }

    if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
        if let Ok(cred) = Cred::credential_helper(git_config, url, username_from_url) {
            return Ok(cred);
        }
    }

    Cred::default()
}

impl super::Repository for Git2Repository {
    fn is_clean(&self) -> Result<bool> {
        let mut options = git2::StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        let dirty = statuses
            .iter()
            .any(|entry| entry.status() != git2::Status::CURRENT && !entry.status().is_ignored());

        Ok(!dirty)
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(CosmodromeError::DetachedHead);
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or(CosmodromeError::DetachedHead)
    }

    #[instrument(skip(self, author), fields(author = %author))]
    fn commit_all(&self, message: &str, author: &Author) -> Result<String> {
        let mut index = self.repo.index()?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parent = self.repo.head()?.peel_to_commit()?;

        let author_sig = Signature::now(&author.name, &author.email)?;
        let committer = match self.repo.signature() {
            Ok(sig) => sig,
            Err(_) => author_sig.clone(),
        };

        let oid = self.repo.commit(
            Some("HEAD"),
            &author_sig,
            &committer,
            message,
            &tree,
            &[&parent],
        )?;

        let hash = oid.to_string();
        info!(commit = %hash, "created release commit");
        Ok(hash.chars().take(7).collect())
    }

    #[instrument(skip(self))]
    fn create_tag(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.tag_lightweight(name, head.as_object(), false)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
        self.push_refspec(remote, &refspec)?;
        info!(remote, branch, "pushed release commit");
        Ok(())
    }

    #[instrument(skip(self))]
    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        let refspec = format!("refs/tags/{}:refs/tags/{}", tag, tag);
        self.push_refspec(remote, &refspec)?;
        info!(remote, tag, "pushed release tag");
        Ok(())
    }
}
