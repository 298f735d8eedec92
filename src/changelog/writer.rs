//! [`Changelog`] → markdown rendering.

use std::fmt;

use super::model::{Change, Changelog, Release};

impl Changelog {
    /// Render the document in the changelog dialect.
    ///
    /// Each header line is followed by a newline, then releases are joined by
    /// a blank line. Parsing the result yields an equal model.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Changelog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.header {
            writeln!(f, "{}", line)?;
        }
        for (i, release) in self.releases.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}", release)?;
        }
        Ok(())
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "## [{}]({}) - {}",
            self.version, self.pull_request_url, self.date
        )?;
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}", change)?;
        }
        Ok(())
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### {}", self.kind)?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "- {}", entry)?;
        }
        Ok(())
    }
}

/// One-line summary of a release for logs and action output.
pub fn release_summary(release: &Release) -> String {
    let groups: Vec<String> = release
        .changes
        .iter()
        .map(|c| format!("{}: {}", c.kind, c.entries.len()))
        .collect();

    let entry_word = if release.entry_count() == 1 {
        "entry"
    } else {
        "entries"
    };

    if groups.is_empty() {
        format!("Added {} with no changelog entries", release.version)
    } else {
        format!(
            "Added {} with {} {} ({})",
            release.version,
            release.entry_count(),
            entry_word,
            groups.join(", ")
        )
    }
}
