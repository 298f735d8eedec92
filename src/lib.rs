//! kraken - A CLI tool that folds merged pull request descriptions into a wiki changelog.
//!
//! # Overview
//!
//! Given a merge commit and a version, kraken finds the pull request that was
//! merged as that commit, parses its description as a changelog section, and
//! prepends it as a new release to `Changelog.md` in the repository's wiki.

pub mod changelog;
pub mod error;
pub mod github;
pub mod retry;
pub mod update;
pub mod wiki;

// Re-export commonly used types
pub use changelog::{Change, Changelog, DateProvider, FixedDate, ReferenceClock, Release, parse};
pub use error::{ChangelogError, GitHubError, UpdateError, WikiError};
pub use github::PullRequest;
pub use update::{UpdateConfig, UpdateOutcome, run_update};
