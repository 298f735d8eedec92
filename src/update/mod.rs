//! Update pipeline: fold a merged pull request into the wiki changelog.
//!
//! Orchestrates pull request lookup, changelog loading, release insertion,
//! and publishing (or printing, in dry-run mode).

pub mod output;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::changelog::parser::scan_changes;
use crate::changelog::writer::release_summary;
use crate::changelog::{DEFAULT_HEADER, DateProvider, parse};
use crate::error::UpdateError;
use crate::github::{PullRequest, PullRequestFinder};
use crate::wiki::ChangelogStore;

/// Configuration for one update run, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    pub version: String,
    pub git_commit: String,
    pub dry_run: bool,
}

/// What an update run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No pull request was merged as the given commit.
    NoPullRequest,
    /// The pull request's repository has its wiki disabled.
    WikiDisabled { pull_request: PullRequest },
    /// The changelog was rendered but not published.
    DryRun {
        pull_request: PullRequest,
        rendered: String,
    },
    /// The changelog was committed and pushed.
    Published {
        pull_request: PullRequest,
        summary: String,
    },
}

impl UpdateOutcome {
    /// Short result string reported to the calling workflow.
    pub fn result_text(&self) -> &'static str {
        match self {
            Self::NoPullRequest => "no pull request found",
            Self::WikiDisabled { .. } => "wiki disabled",
            Self::DryRun { .. } => "dry run",
            Self::Published { .. } => "great success",
        }
    }
}

/// Commit message for a changelog update made at `instant`, shown in `zone`.
pub fn commit_message(instant: DateTime<Utc>, zone: Tz) -> String {
    format!(
        "Update from kraken - {}",
        instant.with_timezone(&zone).format("%Y-%m-%d %H:%M")
    )
}

/// Run the update pipeline.
pub async fn run_update<F, S, D>(
    config: &UpdateConfig,
    finder: &F,
    store: &mut S,
    clock: &D,
    commit_zone: Tz,
) -> Result<UpdateOutcome, UpdateError>
where
    F: PullRequestFinder + ?Sized,
    S: ChangelogStore + ?Sized,
    D: DateProvider + ?Sized,
{
    let Some(pull_request) = finder.find_by_merge_commit(&config.git_commit).await? else {
        info!(commit = %config.git_commit, "No pull request found for commit");
        return Ok(UpdateOutcome::NoPullRequest);
    };

    info!(
        number = pull_request.number,
        url = %pull_request.html_url,
        author = pull_request.author.as_deref().unwrap_or("unknown"),
        state = %pull_request.state,
        "Found pull request"
    );

    if !pull_request.has_wiki {
        info!("Repository wiki is disabled, skipping changelog update");
        return Ok(UpdateOutcome::WikiDisabled { pull_request });
    }

    let raw = match store.load()? {
        Some(raw) => raw,
        None => {
            info!("No changelog in wiki yet, starting a new one");
            DEFAULT_HEADER.to_string()
        }
    };

    let mut changelog = parse(&raw)?;
    debug!(releases = changelog.releases.len(), "Parsed existing changelog");

    let body = pull_request.body.as_deref().unwrap_or_default();
    let scan = scan_changes(body.lines());
    if scan.orphaned > 0 {
        warn!(
            lines = scan.orphaned,
            "Pull request description has lines outside any '### ' group; they were dropped"
        );
    }
    if scan.changes.is_empty() {
        warn!("Pull request description has no '### ' change groups");
    }

    changelog.add_release(&config.version, &pull_request.html_url, body, clock)?;

    let summary = changelog
        .latest()
        .map(release_summary)
        .unwrap_or_default();
    let rendered = changelog.render();

    if config.dry_run {
        return Ok(UpdateOutcome::DryRun {
            pull_request,
            rendered,
        });
    }

    let message = commit_message(Utc::now(), commit_zone);
    store.publish(&rendered, &message)?;
    info!("{}", summary);

    Ok(UpdateOutcome::Published {
        pull_request,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::FixedDate;
    use crate::error::{ChangelogError, GitHubError, WikiError};
    use crate::github::prs::MockPullRequestFinder;
    use crate::wiki::store::MockChangelogStore;
    use chrono::{NaiveDate, TimeZone};

    const EXISTING: &str = "Header text\n## [1.0.1](https://x.com/pull/2) - 2021-03-05\n### Fixed\n- bug A\n";

    fn config(dry_run: bool) -> UpdateConfig {
        UpdateConfig {
            version: "1.1.0".to_string(),
            git_commit: "0123456789abcdef".to_string(),
            dry_run,
        }
    }

    fn pull_request(has_wiki: bool) -> PullRequest {
        PullRequest {
            number: 3,
            html_url: "https://x.com/pull/3".to_string(),
            body: Some("### Added\n- new feature\n".to_string()),
            author: Some("octocat".to_string()),
            state: "closed".to_string(),
            merged_at: None,
            merge_commit_sha: Some("0123456789abcdef".to_string()),
            has_wiki,
        }
    }

    fn finder_returning(pr: Option<PullRequest>) -> MockPullRequestFinder {
        let mut finder = MockPullRequestFinder::new();
        finder
            .expect_find_by_merge_commit()
            .withf(|commit| commit.to_string() == "0123456789abcdef")
            .times(1)
            .returning(move |_| Ok(pr.clone()));
        finder
    }

    fn clock() -> FixedDate {
        FixedDate(NaiveDate::from_ymd_opt(2021, 10, 10).unwrap())
    }

    fn utc() -> Tz {
        chrono_tz::UTC
    }

    #[tokio::test]
    async fn test_no_pull_request_short_circuits() {
        let finder = finder_returning(None);
        let mut store = MockChangelogStore::new();
        store.expect_load().never();
        store.expect_publish().never();

        let outcome = run_update(&config(false), &finder, &mut store, &clock(), utc())
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NoPullRequest);
    }

    #[tokio::test]
    async fn test_disabled_wiki_short_circuits() {
        let finder = finder_returning(Some(pull_request(false)));
        let mut store = MockChangelogStore::new();
        store.expect_load().never();

        let outcome = run_update(&config(false), &finder, &mut store, &clock(), utc())
            .await
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::WikiDisabled { .. }));
        assert_eq!(outcome.result_text(), "wiki disabled");
    }

    #[tokio::test]
    async fn test_publishes_new_release() {
        let finder = finder_returning(Some(pull_request(true)));
        let mut store = MockChangelogStore::new();
        store
            .expect_load()
            .times(1)
            .returning(|| Ok(Some(EXISTING.to_string())));
        store
            .expect_publish()
            .withf(|content, message| {
                content.starts_with(
                    "Header text\n## [1.1.0](https://x.com/pull/3) - 2021-10-10\n### Added\n- new feature\n\n## [1.0.1]",
                ) && message.starts_with("Update from kraken - ")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = run_update(&config(false), &finder, &mut store, &clock(), utc())
            .await
            .unwrap();

        match outcome {
            UpdateOutcome::Published { summary, .. } => {
                assert_eq!(summary, "Added 1.1.0 with 1 entry (Added: 1)");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dry_run_does_not_publish() {
        let finder = finder_returning(Some(pull_request(true)));
        let mut store = MockChangelogStore::new();
        store
            .expect_load()
            .returning(|| Ok(Some(EXISTING.to_string())));
        store.expect_publish().never();

        let outcome = run_update(&config(true), &finder, &mut store, &clock(), utc())
            .await
            .unwrap();

        match outcome {
            UpdateOutcome::DryRun { rendered, .. } => {
                assert!(rendered.contains("## [1.1.0](https://x.com/pull/3) - 2021-10-10"));
                assert!(rendered.contains("## [1.0.1](https://x.com/pull/2) - 2021-03-05"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_version_does_not_publish() {
        let finder = finder_returning(Some(pull_request(true)));
        let mut store = MockChangelogStore::new();
        store
            .expect_load()
            .returning(|| Ok(Some(EXISTING.to_string())));
        store.expect_publish().never();

        let mut cfg = config(false);
        cfg.version = "1.0.1".to_string();
        let err = run_update(&cfg, &finder, &mut store, &clock(), utc())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UpdateError::Changelog(ChangelogError::DuplicateVersion(ref v)) if v == "1.0.1"
        ));
    }

    #[tokio::test]
    async fn test_missing_changelog_uses_default_header() {
        let finder = finder_returning(Some(pull_request(true)));
        let mut store = MockChangelogStore::new();
        store.expect_load().returning(|| Ok(None));
        store
            .expect_publish()
            .withf(|content, _| {
                content.starts_with("# Changelog\n\n")
                    && content.contains("\n\n## [1.1.0](https://x.com/pull/3) - 2021-10-10\n")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        run_update(&config(false), &finder, &mut store, &clock(), utc())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_malformed_changelog_aborts() {
        let finder = finder_returning(Some(pull_request(true)));
        let mut store = MockChangelogStore::new();
        store
            .expect_load()
            .returning(|| Ok(Some("Header\n## Not a release\n".to_string())));
        store.expect_publish().never();

        let err = run_update(&config(false), &finder, &mut store, &clock(), utc())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UpdateError::Changelog(ChangelogError::MalformedHeader { .. })
        ));
    }

    #[tokio::test]
    async fn test_forge_and_store_errors_propagate() {
        let mut finder = MockPullRequestFinder::new();
        finder
            .expect_find_by_merge_commit()
            .returning(|_| Err(GitHubError::AuthenticationFailed));
        let mut store = MockChangelogStore::new();
        let err = run_update(&config(false), &finder, &mut store, &clock(), utc())
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::GitHub(GitHubError::AuthenticationFailed)));

        let finder = finder_returning(Some(pull_request(true)));
        let mut store = MockChangelogStore::new();
        store.expect_load().returning(|| Err(WikiError::NotCloned));
        let err = run_update(&config(false), &finder, &mut store, &clock(), utc())
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::Wiki(WikiError::NotCloned)));
    }

    #[test]
    fn test_commit_message_format() {
        let instant = Utc.with_ymd_and_hms(2021, 10, 10, 14, 5, 0).unwrap();
        assert_eq!(
            commit_message(instant, chrono_tz::America::Chicago),
            "Update from kraken - 2021-10-10 09:05"
        );

        let instant = Utc.with_ymd_and_hms(2021, 12, 10, 14, 5, 0).unwrap();
        assert_eq!(
            commit_message(instant, chrono_tz::America::Chicago),
            "Update from kraken - 2021-12-10 08:05"
        );
    }
}
