//! Clone, read, commit and push the wiki checkout using git2-rs.

use std::path::{Path, PathBuf};

use chrono::{Offset, Utc};
use chrono_tz::Tz;
use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, PushOptions, RemoteCallbacks, Repository, Signature, Time};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::changelog::DEFAULT_TIME_ZONE;
use crate::error::WikiError;

/// File name of the changelog inside the wiki.
pub const CHANGELOG_FILE: &str = "Changelog.md";

/// Username sent with token credentials; GitHub only checks the password.
const AUTH_USERNAME: &str = "x-access-token";

/// Remote URL of a repository's wiki.
pub fn wiki_remote_url(owner: &str, repo: &str) -> String {
    format!("https://github.com/{}/{}.wiki.git", owner, repo)
}

/// Where the changelog text is loaded from and published to.
#[cfg_attr(test, mockall::automock)]
pub trait ChangelogStore {
    /// Fetch the store and return the changelog text, or `None` if the
    /// changelog does not exist yet.
    fn load(&mut self) -> Result<Option<String>, WikiError>;

    /// Replace the changelog with `content` and persist it under `message`.
    fn publish(&mut self, content: &str, message: &str) -> Result<(), WikiError>;
}

/// Identity used for changelog commits.
#[derive(Debug, Clone)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    /// Zone the commit timestamp is recorded in.
    pub zone: Tz,
}

impl Default for CommitAuthor {
    fn default() -> Self {
        Self {
            name: "kraken".to_string(),
            email: "kraken@users.noreply.github.com".to_string(),
            zone: DEFAULT_TIME_ZONE,
        }
    }
}

/// A wiki cloned into a temporary directory.
///
/// The checkout is deleted when the store is dropped.
pub struct WikiStore {
    remote_url: String,
    token: Option<String>,
    author: CommitAuthor,
    workdir: TempDir,
    repo: Option<Repository>,
}

impl WikiStore {
    /// Prepare a store for `remote_url`. Nothing is fetched until `load`.
    pub fn new(
        remote_url: impl Into<String>,
        token: Option<String>,
        author: CommitAuthor,
    ) -> Result<Self, WikiError> {
        let workdir = tempfile::Builder::new()
            .prefix("kraken-")
            .tempdir()
            .map_err(WikiError::Workdir)?;

        Ok(Self {
            remote_url: remote_url.into(),
            token,
            author,
            workdir,
            repo: None,
        })
    }

    /// Path of the checkout.
    pub fn path(&self) -> &Path {
        self.workdir.path()
    }

    fn changelog_path(&self) -> PathBuf {
        self.workdir.path().join(CHANGELOG_FILE)
    }

    fn callbacks(&self) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        if let Some(token) = self.token.as_deref() {
            callbacks.credentials(move |_url, _username, _allowed| {
                Cred::userpass_plaintext(AUTH_USERNAME, token)
            });
        }
        callbacks
    }

    fn clone_repo(&self) -> Result<Repository, WikiError> {
        debug!(url = %self.remote_url, path = %self.path().display(), "Cloning wiki");

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(self.callbacks());

        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(&self.remote_url, self.workdir.path())
            .map_err(|source| WikiError::Clone {
                url: self.remote_url.clone(),
                source,
            })
    }

    fn signature(&self) -> Result<Signature<'static>, WikiError> {
        let now = Utc::now().with_timezone(&self.author.zone);
        let time = Time::new(now.timestamp(), now.offset().fix().local_minus_utc() / 60);
        Signature::new(&self.author.name, &self.author.email, &time).map_err(WikiError::Commit)
    }

    fn commit(&self, repo: &Repository, message: &str) -> Result<(), WikiError> {
        let mut index = repo.index().map_err(WikiError::Commit)?;
        index
            .add_path(Path::new(CHANGELOG_FILE))
            .map_err(WikiError::Commit)?;
        index.write().map_err(WikiError::Commit)?;

        let tree_id = index.write_tree().map_err(WikiError::Commit)?;
        let tree = repo.find_tree(tree_id).map_err(WikiError::Commit)?;
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let sig = self.signature()?;
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(WikiError::Commit)?;

        debug!(commit = %oid, "Created changelog commit");
        Ok(())
    }

    fn push(&self, repo: &Repository) -> Result<(), WikiError> {
        let head = repo.head().map_err(WikiError::Push)?;
        let branch = head
            .name()
            .ok_or_else(|| WikiError::Push(git2::Error::from_str("HEAD is not a named branch")))?;
        let refspec = format!("{0}:{0}", branch);

        let mut remote = repo.find_remote("origin").map_err(WikiError::Push)?;

        // Refused ref updates only surface through this callback; push itself returns Ok.
        let mut rejected: Vec<String> = Vec::new();
        {
            let mut callbacks = self.callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejected.push(format!("{}: {}", refname, status));
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);

            remote
                .push(&[refspec.as_str()], Some(&mut push_options))
                .map_err(WikiError::Push)?;
        }

        if let Some(reason) = rejected.first() {
            return Err(WikiError::Push(git2::Error::from_str(&format!(
                "remote rejected {}",
                reason
            ))));
        }

        info!(branch, url = %self.remote_url, "Pushed changelog update");
        Ok(())
    }
}

impl ChangelogStore for WikiStore {
    fn load(&mut self) -> Result<Option<String>, WikiError> {
        if self.repo.is_none() {
            self.repo = Some(self.clone_repo()?);
        }

        let path = self.changelog_path();
        if !path.exists() {
            return Ok(None);
        }

        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(WikiError::ReadFailed)
    }

    fn publish(&mut self, content: &str, message: &str) -> Result<(), WikiError> {
        let repo = self.repo.as_ref().ok_or(WikiError::NotCloned)?;

        std::fs::write(self.changelog_path(), content).map_err(WikiError::WriteFailed)?;
        self.commit(repo, message)?;
        self.push(repo)
    }
}
