//! One-time copy of the local record into the consumer location.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use serde::Serialize;

/// Result of a migration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Not attempted yet.
    NotRun,
    /// Local record copied verbatim.
    Copied,
    /// External record already present; left untouched.
    SkippedExternalExists,
    /// Nothing to migrate.
    SkippedNoLocal,
    /// Copy failed; the bridge keeps running unsynced from local state.
    Failed(String),
}

impl MigrationOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, MigrationOutcome::Failed(_))
    }
}

/// Copy `local` to `external` when `local` exists and `external` does not.
///
/// The external file is created with `create_new`, so a record that shows up
/// between the check and the copy is never overwritten. Failures are logged
/// and returned, never raised.
pub fn migrate_if_needed(local: &Path, external: &Path) -> MigrationOutcome {
    if external.exists() {
        tracing::debug!(external = %external.display(), "external policy exists, skipping migration");
        return MigrationOutcome::SkippedExternalExists;
    }
    if !local.exists() {
        tracing::debug!(local = %local.display(), "no local policy, skipping migration");
        return MigrationOutcome::SkippedNoLocal;
    }

    tracing::warn!(
        local = %local.display(),
        external = %external.display(),
        "migrating policy to consumer storage"
    );

    match copy_new(local, external) {
        Ok(bytes) => {
            tracing::info!(bytes, "policy migrated");
            MigrationOutcome::Copied
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            tracing::debug!("external policy appeared concurrently, skipping migration");
            MigrationOutcome::SkippedExternalExists
        }
        Err(e) => {
            tracing::error!(error = %e, "policy migration failed");
            // Do not leave a truncated record for the consumer.
            let _ = fs::remove_file(external);
            MigrationOutcome::Failed(e.to_string())
        }
    }
}

fn copy_new(from: &Path, to: &Path) -> io::Result<u64> {
    let mut src = File::open(from)?;
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut dst = OpenOptions::new().write(true).create_new(true).open(to)?;
    let n = io::copy(&mut src, &mut dst)?;
    dst.sync_all()?;
    Ok(n)
}
