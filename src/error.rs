//! Error types for kraken modules using thiserror.

use thiserror::Error;

/// Errors from changelog parsing and release insertion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChangelogError {
    #[error("Version {0} already exists in changelog")]
    DuplicateVersion(String),

    #[error("Unexpected format for release header: '{line}'")]
    MalformedHeader { line: String },

    #[error("Release version must not be empty")]
    EmptyVersion,
}

/// Errors from GitHub API operations.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "GitHub authentication failed: no valid auth found. Pass --github-token, set GITHUB_TOKEN, or run 'gh auth login'"
    )]
    AuthenticationFailed,

    #[error("Failed to fetch PRs: {0}")]
    FetchPRs(#[source] Box<octocrab::Error>),

    #[error("Rate limited by GitHub API. Resets at: {reset_time}")]
    RateLimited { reset_time: String },

    #[error("Repository not found: {owner}/{repo}")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("Invalid repository '{0}', expected 'owner/repo'")]
    InvalidRepository(String),

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<GitHubError>),
}

/// Errors from wiki checkout operations.
#[derive(Error, Debug)]
pub enum WikiError {
    #[error("Failed to clone wiki from {url}: {source}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("Wiki has not been cloned yet")]
    NotCloned,

    #[error("Failed to read changelog: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to write changelog: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to create commit: {0}")]
    Commit(#[source] git2::Error),

    #[error("Failed to push wiki: {0}")]
    Push(#[source] git2::Error),

    #[error("Failed to create working directory: {0}")]
    Workdir(#[source] std::io::Error),
}

/// Errors from the update pipeline.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Wiki(#[from] WikiError),
}
