//! Markdown → [`Changelog`] parsing.
//!
//! Segmentation is lenient: any line whose trimmed form starts with `## `
//! opens a release section, and any line starting with `### ` opens a change
//! group. Field extraction is strict: every release section must begin with a
//! header matching [`ReleaseHeader::parse`], or the whole document is rejected.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::ChangelogError;

use super::model::{Change, Changelog, Release};

const RELEASE_PREFIX: &str = "## ";
const CHANGE_PREFIX: &str = "### ";

static RELEASE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^##\s+\[(\d+\.\d+\.\d+)\]\((https:[^\s)]+)\)\s+-\s+(\d{1,4}-\d{1,2}-\d{1,2})$",
    )
    .expect("Invalid regex")
});

/// Fields of a `## [version](url) - date` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHeader {
    pub version: String,
    pub pull_request_url: String,
    pub date: String,
}

impl ReleaseHeader {
    /// Match a release header line against the strict pattern.
    ///
    /// Version must be three dot-separated integers, the url must start with
    /// `https:`, and the date is `Y-M-D` with 1-4 digit year and 1-2 digit
    /// month and day. The date is kept exactly as written.
    pub fn parse(line: &str) -> Result<Self, ChangelogError> {
        let trimmed = line.trim();
        let caps = RELEASE_HEADER_RE
            .captures(trimmed)
            .ok_or_else(|| ChangelogError::MalformedHeader {
                line: trimmed.to_string(),
            })?;

        Ok(Self {
            version: caps[1].to_string(),
            pull_request_url: caps[2].to_string(),
            date: caps[3].to_string(),
        })
    }
}

/// Whether a line starts a new release section.
pub fn is_release_boundary(line: &str) -> bool {
    line.trim().starts_with(RELEASE_PREFIX)
}

/// The kind named by a `### <kind>` line, if it is one.
pub fn change_heading(line: &str) -> Option<&str> {
    line.strip_prefix(CHANGE_PREFIX).map(str::trim)
}

/// Strip surrounding whitespace and one leading `-` from a bullet line.
fn clean_entry(line: &str) -> String {
    let trimmed = line.trim();
    trimmed.strip_prefix('-').unwrap_or(trimmed).trim().to_string()
}

/// Parse a full changelog document.
///
/// A document with no release heading is all header and yields zero
/// releases. Releases are returned in source order.
pub fn parse(raw: &str) -> Result<Changelog, ChangelogError> {
    let lines: Vec<&str> = raw.lines().collect();
    let header_end = lines
        .iter()
        .position(|line| is_release_boundary(line))
        .unwrap_or(lines.len());

    let header = lines[..header_end].iter().map(|l| l.to_string()).collect();
    let releases = split_releases(&lines[header_end..])
        .iter()
        .map(|group| parse_release_section(group))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Changelog { header, releases })
}

/// Group lines so each group starts at a release boundary.
///
/// The first line always opens the first group.
fn split_releases<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut groups: Vec<Vec<&'a str>> = Vec::new();
    for &line in lines {
        match groups.last_mut() {
            Some(group) if !is_release_boundary(line) => group.push(line),
            _ => groups.push(vec![line]),
        }
    }
    groups
}

/// Parse one release section. Line 0 must be a valid release header.
pub fn parse_release_section(lines: &[&str]) -> Result<Release, ChangelogError> {
    let (first, rest) = lines
        .split_first()
        .ok_or_else(|| ChangelogError::MalformedHeader {
            line: String::new(),
        })?;
    let header = ReleaseHeader::parse(first)?;

    Ok(Release {
        version: header.version,
        pull_request_url: header.pull_request_url,
        date: header.date,
        changes: scan_changes(rest.iter().copied()).changes,
    })
}

/// Parse the inner content of one release section, such as a pull request
/// description, into its change groups.
///
/// Text before the first `### ` heading is discarded. Groups are returned
/// exactly as they appear; repeated kinds are not merged here.
pub fn parse_release_body(body: &str) -> Vec<Change> {
    scan_changes(body.lines()).changes
}

/// Result of scanning change groups.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub changes: Vec<Change>,
    /// Bullet lines seen before any `### ` heading.
    pub orphaned: usize,
}

/// Scan state: either no group is open or one is accumulating entries.
#[derive(Debug)]
enum ScanState {
    NoChangeOpen,
    ChangeOpen(Change),
}

/// Run the change-group state machine over `lines`.
pub fn scan_changes<'a, I>(lines: I) -> ScanOutcome
where
    I: IntoIterator<Item = &'a str>,
{
    let mut outcome = ScanOutcome::default();
    let mut state = ScanState::NoChangeOpen;

    for line in lines {
        if let Some(kind) = change_heading(line) {
            if let ScanState::ChangeOpen(change) = state {
                outcome.changes.push(change);
            }
            state = ScanState::ChangeOpen(Change::new(kind));
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match &mut state {
            ScanState::ChangeOpen(change) => change.entries.push(clean_entry(line)),
            ScanState::NoChangeOpen => outcome.orphaned += 1,
        }
    }

    if let ScanState::ChangeOpen(change) = state {
        outcome.changes.push(change);
    }

    outcome
}
