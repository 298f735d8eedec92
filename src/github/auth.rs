//! GitHub token discovery.
//!
//! Checks in order:
//! 1. An explicit token (the `--github-token` flag)
//! 2. GITHUB_TOKEN environment variable
//! 3. GH_TOKEN environment variable
//! 4. gh CLI auth (via `gh auth token`)

use std::env;
use std::process::Command;

use crate::error::GitHubError;

/// Get a GitHub token, preferring an explicitly supplied one.
pub fn get_github_token(explicit: Option<&str>) -> Result<String, GitHubError> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(token) = env::var(var)
            && !token.trim().is_empty()
        {
            return Ok(token.trim().to_string());
        }
    }

    get_token_from_gh_cli().ok_or(GitHubError::AuthenticationFailed)
}

/// Try to get a token from the gh CLI.
fn get_token_from_gh_cli() -> Option<String> {
    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
