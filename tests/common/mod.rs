//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Get the path to a changelog fixture.
pub fn changelog_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("changelogs").join(name)
}

/// Read a fixture file as a string.
pub fn read_fixture(path: PathBuf) -> String {
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

/// A bare repository standing in for a remote wiki.
pub struct BareWiki {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl BareWiki {
    /// Create a bare repository with one commit holding `files`.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init_bare(dir.path()).expect("Failed to init bare repo");

        {
            let mut builder = repo.treebuilder(None).expect("Failed to create treebuilder");
            for (name, content) in files {
                let blob = repo.blob(content.as_bytes()).expect("Failed to write blob");
                builder
                    .insert(*name, blob, 0o100644)
                    .expect("Failed to insert tree entry");
            }
            let tree_id = builder.write().expect("Failed to write tree");
            let tree = repo.find_tree(tree_id).expect("Failed to find tree");
            let sig = Signature::now("Wiki Seed", "seed@example.com")
                .expect("Failed to create signature");
            repo.commit(Some("HEAD"), &sig, &sig, "Initial wiki page", &tree, &[])
                .expect("Failed to create commit");
        }

        Self { dir, repo }
    }

    /// Clone URL for this repository.
    pub fn url(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// OID of the commit HEAD points to.
    pub fn head_oid(&self) -> Oid {
        self.repo
            .head()
            .expect("Failed to read HEAD")
            .target()
            .expect("HEAD has no target")
    }

    /// Read a file from the HEAD commit, if present.
    pub fn read_head_file(&self, name: &str) -> Option<String> {
        let commit = self.repo.head().ok()?.peel_to_commit().ok()?;
        let entry = commit.tree().ok()?.get_path(Path::new(name)).ok()?;
        let blob = self.repo.find_blob(entry.id()).ok()?;
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }

    /// Hold the lock on HEAD's branch so the next update of it is refused.
    pub fn lock_head_ref(&self) {
        let head = self.repo.head().expect("Failed to read HEAD");
        let name = head.name().expect("HEAD is not a named branch");
        std::fs::write(self.path().join(format!("{}.lock", name)), "")
            .expect("Failed to create ref lock");
    }

    /// Message of the HEAD commit.
    pub fn head_message(&self) -> String {
        let commit = self
            .repo
            .head()
            .expect("Failed to read HEAD")
            .peel_to_commit()
            .expect("HEAD is not a commit");
        commit.message().unwrap_or_default().to_string()
    }
}
