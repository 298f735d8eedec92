//! Merge-commit → pull request lookup via octocrab.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GitHubError;
use crate::retry::retry_with_backoff;

/// The pull request fields the changelog update needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    pub body: Option<String>,
    pub author: Option<String>,
    pub state: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub merge_commit_sha: Option<String>,
    /// Whether the base repository has its wiki enabled.
    pub has_wiki: bool,
}

impl PullRequest {
    fn from_octocrab(pr: octocrab::models::pulls::PullRequest) -> Self {
        let has_wiki = pr
            .base
            .repo
            .as_ref()
            .and_then(|repo| repo.has_wiki)
            .unwrap_or(false);

        Self {
            number: pr.number,
            html_url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
            body: pr.body,
            author: pr.user.map(|u| u.login),
            state: pr
                .state
                .map(|s| format!("{:?}", s).to_lowercase())
                .unwrap_or_else(|| "unknown".to_string()),
            merged_at: pr.merged_at,
            merge_commit_sha: pr.merge_commit_sha,
            has_wiki,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

/// Resolves a merge commit to the pull request that produced it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestFinder: Send + Sync {
    async fn find_by_merge_commit(&self, commit: &str)
    -> Result<Option<PullRequest>, GitHubError>;
}

/// Finder backed by the GitHub REST API.
pub struct GitHubFinder {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubFinder {
    /// Build a finder authenticated with a personal access token.
    pub fn new(token: &str, owner: &str, repo: &str) -> Result<Self, GitHubError> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| GitHubError::FetchPRs(Box::new(e)))?;

        Ok(Self::with_client(octocrab, owner, repo))
    }

    /// Use a pre-configured client, e.g. one pointed at a mock server.
    pub fn with_client(octocrab: Octocrab, owner: &str, repo: &str) -> Self {
        Self {
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }
}

#[async_trait]
impl PullRequestFinder for GitHubFinder {
    async fn find_by_merge_commit(
        &self,
        commit: &str,
    ) -> Result<Option<PullRequest>, GitHubError> {
        retry_with_backoff(
            || find_pull_request_by_merge_commit(&self.octocrab, &self.owner, &self.repo, commit),
            |e| matches!(e, GitHubError::FetchPRs(_)),
            |e| GitHubError::RetriesExhausted(Box::new(e)),
        )
        .await
    }
}

/// Safety limit on listing pages (100 PRs each).
const MAX_PAGES: u32 = 50;

/// Page through all pull requests of `owner/repo` looking for the one whose
/// merge commit is `commit`.
///
/// Only merged pull requests are considered. Full hashes match
/// case-insensitively; abbreviated hashes of at least seven characters match
/// as a prefix. Returns `None` when no pull request matches.
pub async fn find_pull_request_by_merge_commit(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    commit: &str,
) -> Result<Option<PullRequest>, GitHubError> {
    let mut page = 1u32;

    loop {
        let result = octocrab
            .pulls(owner, repo)
            .list()
            .state(octocrab::params::State::All)
            .per_page(100)
            .page(page)
            .send()
            .await;

        let prs_page = result.map_err(|e| classify_error(e, owner, repo))?;

        if prs_page.items.is_empty() {
            break;
        }

        debug!(page, count = prs_page.items.len(), "Scanning pull requests");

        let has_next = prs_page.next.is_some();
        for pr in prs_page.items {
            // Open PRs carry a test-merge sha too; only merged ones count.
            let matched = pr.merged_at.is_some()
                && pr
                    .merge_commit_sha
                    .as_deref()
                    .is_some_and(|sha| commit_matches(sha, commit));
            if matched {
                return Ok(Some(PullRequest::from_octocrab(pr)));
            }
        }

        if !has_next {
            break;
        }

        page += 1;

        if page > MAX_PAGES {
            warn!(
                "Reached {}-page safety limit while searching PRs for {}/{}",
                MAX_PAGES, owner, repo
            );
            break;
        }
    }

    Ok(None)
}

/// Map octocrab errors onto the variants callers act on.
fn classify_error(e: octocrab::Error, owner: &str, repo: &str) -> GitHubError {
    // Check error content using both Display and Debug output
    // to handle different octocrab error formats
    let err_display = e.to_string();
    let err_debug = format!("{:?}", e);

    if err_display.to_lowercase().contains("rate limit")
        || err_debug.to_lowercase().contains("rate limit")
    {
        return GitHubError::RateLimited {
            reset_time: "unknown".to_string(),
        };
    }
    if err_display.contains("Not Found") || err_debug.contains("Not Found") {
        return GitHubError::RepositoryNotFound {
            owner: owner.to_string(),
            repo: repo.to_string(),
        };
    }
    GitHubError::FetchPRs(Box::new(e))
}

/// Whether a PR's merge commit is the requested commit.
pub fn commit_matches(merge_sha: &str, wanted: &str) -> bool {
    let wanted = wanted.trim();
    if wanted.len() < 7 {
        return false;
    }
    if wanted.len() >= merge_sha.len() {
        return merge_sha.eq_ignore_ascii_case(wanted);
    }
    merge_sha
        .get(..wanted.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(wanted))
}

/// Split an `owner/repo` slug or a GitHub remote URL into its parts.
pub fn parse_repository(input: &str) -> Result<(String, String), GitHubError> {
    let invalid = || GitHubError::InvalidRepository(input.to_string());
    let trimmed = input.trim();

    let path = if let Some(path) = trimmed.strip_prefix("git@github.com:") {
        path
    } else if let Some((_, path)) = trimmed.split_once("github.com/") {
        path
    } else {
        trimmed
    };

    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slug() {
        let (owner, repo) = parse_repository("podium/kraken").unwrap();
        assert_eq!(owner, "podium");
        assert_eq!(repo, "kraken");
    }

    #[test]
    fn test_parse_ssh_url() {
        let (owner, repo) = parse_repository("git@github.com:owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_https_url() {
        let (owner, repo) = parse_repository("https://github.com/owner/repo").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_invalid_repository() {
        for input in ["", "owner", "owner/", "/repo", "a/b/c"] {
            assert!(
                matches!(parse_repository(input), Err(GitHubError::InvalidRepository(_))),
                "expected rejection: {input}"
            );
        }
    }

    #[test]
    fn test_commit_matches_full_hash() {
        let sha = "0123456789abcdef0123456789abcdef01234567";
        assert!(commit_matches(sha, sha));
        assert!(commit_matches(sha, &sha.to_uppercase()));
        assert!(!commit_matches(sha, "1123456789abcdef0123456789abcdef01234567"));
    }

    #[test]
    fn test_commit_matches_abbreviated_hash() {
        let sha = "0123456789abcdef0123456789abcdef01234567";
        assert!(commit_matches(sha, "0123456"));
        assert!(!commit_matches(sha, "012345"));
        assert!(!commit_matches(sha, "0123457"));
    }
}
