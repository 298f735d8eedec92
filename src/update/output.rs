//! GitHub Actions step output.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Environment variable naming the step output file.
pub const GITHUB_OUTPUT_ENV_VAR: &str = "GITHUB_OUTPUT";

/// Report `name=value` to the calling workflow.
///
/// Appends to the file named by `GITHUB_OUTPUT` when it is set, and falls
/// back to the legacy `::set-output` workflow command on stdout.
pub fn set_output(name: &str, value: &str) -> std::io::Result<()> {
    match std::env::var_os(GITHUB_OUTPUT_ENV_VAR) {
        Some(path) if !path.is_empty() => append_output(Path::new(&path), name, value),
        _ => {
            println!("::set-output name={}::{}", name, value);
            Ok(())
        }
    }
}

fn append_output(path: &Path, name: &str, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}={}", name, value)
}
