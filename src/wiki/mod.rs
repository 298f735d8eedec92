//! Wiki repository access: the backing store of `Changelog.md`.

pub mod store;

pub use store::{CHANGELOG_FILE, ChangelogStore, CommitAuthor, WikiStore, wiki_remote_url};
