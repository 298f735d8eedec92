//! kraken - CLI entry point.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::Parser;
use semver::Version;
use tracing_subscriber::EnvFilter;

use kraken::github::{GitHubFinder, get_github_token, parse_repository};
use kraken::update::output::set_output;
use kraken::wiki::{CommitAuthor, WikiStore, wiki_remote_url};
use kraken::{ReferenceClock, UpdateConfig, UpdateOutcome, run_update};

/// Add a merged pull request's description to the wiki changelog.
#[derive(Parser, Debug)]
#[command(name = "kraken")]
#[command(about = "Add a merged pull request's description to the wiki changelog")]
#[command(version)]
struct Cli {
    /// GitHub access token used for the API and the wiki repository
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    github_repo: String,

    /// Merge commit hash of the pull request
    #[arg(long, env = "GITHUB_SHA")]
    git_commit: String,

    /// Semantic version of the release
    #[arg(long = "set-version", value_name = "VERSION")]
    release_version: Version,

    /// IANA time zone used for release dates and commit times
    #[arg(long, value_name = "ZONE", default_value = "America/Chicago")]
    time_zone: Tz,

    /// Dry run - print the updated changelog without pushing
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let clock = ReferenceClock::new(cli.time_zone);

    // Release headers only accept MAJOR.MINOR.PATCH.
    if !cli.release_version.pre.is_empty() || !cli.release_version.build.is_empty() {
        anyhow::bail!(
            "Version {} has pre-release or build metadata, which the changelog cannot record",
            cli.release_version
        );
    }

    let (owner, repo) = parse_repository(&cli.github_repo)?;
    let token = get_github_token(cli.github_token.as_deref())
        .context("GitHub authentication required")?;

    println!("Repository: {}/{}", owner, repo);
    println!("Commit: {}", cli.git_commit);
    println!("Version: {}", cli.release_version);
    println!("Time zone: {}", cli.time_zone);

    let finder = GitHubFinder::new(&token, &owner, &repo)?;
    let author = CommitAuthor {
        zone: clock.zone(),
        ..CommitAuthor::default()
    };
    let mut store = WikiStore::new(wiki_remote_url(&owner, &repo), Some(token), author)
        .context("Failed to prepare wiki checkout")?;

    let config = UpdateConfig {
        version: cli.release_version.to_string(),
        git_commit: cli.git_commit.clone(),
        dry_run: cli.dry_run,
    };

    let outcome = run_update(&config, &finder, &mut store, &clock, clock.zone())
        .await
        .context("Failed to update changelog")?;

    match &outcome {
        UpdateOutcome::NoPullRequest => {
            println!("No pull request was merged as {}. Nothing to add.", cli.git_commit);
        }
        UpdateOutcome::WikiDisabled { pull_request } => {
            println!(
                "Wiki is disabled for {}/{}; skipping PR #{}.",
                owner, repo, pull_request.number
            );
        }
        UpdateOutcome::DryRun {
            pull_request,
            rendered,
        } => {
            println!("\n--- Dry Run Output (PR #{}) ---\n", pull_request.number);
            println!("{}", rendered);
        }
        UpdateOutcome::Published { summary, .. } => {
            println!("✓ {}", summary);
        }
    }

    set_output("result", outcome.result_text()).context("Failed to write step output")?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "kraken=debug" } else { "kraken=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
