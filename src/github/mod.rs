//! GitHub API operations using octocrab.

pub mod auth;
pub mod prs;

pub use auth::get_github_token;
pub use prs::{
    GitHubFinder, PullRequest, PullRequestFinder, find_pull_request_by_merge_commit,
    parse_repository,
};
