//! Changelog, release and change-group types.

use serde::{Deserialize, Serialize};

use crate::error::ChangelogError;

use super::clock::DateProvider;
use super::parser::parse_release_body;

/// Date format written into release headers.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A parsed changelog document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    /// Lines before the first release heading, verbatim.
    pub header: Vec<String>,
    /// Releases, newest first.
    pub releases: Vec<Release>,
}

/// One `## [version](url) - date` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    pub pull_request_url: String,
    pub date: String,
    pub changes: Vec<Change>,
}

/// One `### <kind>` group of bullet entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub kind: String,
    pub entries: Vec<String>,
}

impl Changelog {
    /// Prepend a release built from a pull request description.
    ///
    /// The body is read as the inner content of one release section. Change
    /// groups of the same kind are merged. Fails without touching the release
    /// list when `version` is empty or already present.
    pub fn add_release<D>(
        &mut self,
        version: &str,
        pull_request_url: &str,
        pull_request_body: &str,
        clock: &D,
    ) -> Result<(), ChangelogError>
    where
        D: DateProvider + ?Sized,
    {
        if version.is_empty() {
            return Err(ChangelogError::EmptyVersion);
        }
        if self.find_release(version).is_some() {
            return Err(ChangelogError::DuplicateVersion(version.to_string()));
        }

        let mut release = Release {
            version: version.to_string(),
            pull_request_url: pull_request_url.to_string(),
            date: clock.today().format(DATE_FORMAT).to_string(),
            changes: Vec::new(),
        };
        for change in parse_release_body(pull_request_body) {
            release.push_change(change);
        }

        self.releases.insert(0, release);
        Ok(())
    }

    /// Look up a release by exact version label.
    pub fn find_release(&self, version: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.version == version)
    }

    /// The newest release, if any.
    pub fn latest(&self) -> Option<&Release> {
        self.releases.first()
    }
}

impl Release {
    /// Append a change group, merging its entries into an existing group of
    /// the same kind.
    pub fn push_change(&mut self, change: Change) {
        match self.changes.iter_mut().find(|c| c.kind == change.kind) {
            Some(existing) => existing.entries.extend(change.entries),
            None => self.changes.push(change),
        }
    }

    /// Total number of bullet entries across all groups.
    pub fn entry_count(&self) -> usize {
        self.changes.iter().map(|c| c.entries.len()).sum()
    }
}

impl Change {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            entries: Vec::new(),
        }
    }
}
