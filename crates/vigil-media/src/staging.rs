//! Input file staging.
//!
//! The platform reads virtual-live sources from an upload directory whose
//! location differs between deployments. Staging copies the input file into
//! every candidate directory that exists and resolves the first destination
//! where the file is confirmed present.

use std::path::{Path, PathBuf};

use vigil_core::error::{Error, Result};

/// Root under which uploads are addressed by absolute path.
pub const UPLOAD_ROOT: &str = "/data/upload/";

/// Copies `source` into every candidate directory that exists.
///
/// # Errors
///
/// Returns a setup error if `source` has no file name or no candidate
/// directory accepted the copy.
pub async fn copy_to_candidates(source: &Path, candidates: &[PathBuf]) -> Result<()> {
    let name = file_name(source)?;
    let mut copied = 0usize;
    for dir in candidates {
        if tokio::fs::metadata(dir).await.is_err() {
            continue;
        }
        let dest = dir.join(&name);
        match tokio::fs::copy(source, &dest).await {
            Ok(_) => {
                tracing::debug!(dest = %dest.display(), "staged input file");
                copied += 1;
            }
            Err(err) => {
                tracing::warn!(dest = %dest.display(), %err, "staging copy failed");
            }
        }
    }
    if copied == 0 {
        return Err(Error::setup(format!(
            "copy {} to {candidates:?}: no candidate directory accepted the file",
            source.display()
        )));
    }
    Ok(())
}

/// Returns the first candidate directory where `name` is present.
pub async fn first_existing(name: &str, candidates: &[PathBuf]) -> Option<PathBuf> {
    for dir in candidates {
        let path = dir.join(name);
        if tokio::fs::metadata(&path).await.is_ok() {
            return Some(path);
        }
    }
    None
}

/// Translates a staged path into the form the upload endpoint expects:
/// absolute paths under the upload root pass through, anything else is
/// addressed by the short `upload/<name>` form.
///
/// # Errors
///
/// Returns a setup error if the path has no file name.
pub fn upload_path(staged: &Path) -> Result<String> {
    let display = staged.display().to_string();
    if display.starts_with(UPLOAD_ROOT) {
        return Ok(display);
    }
    Ok(format!("upload/{}", file_name(staged)?))
}

/// Stages `source` into the candidates and resolves its upload path.
///
/// # Errors
///
/// Returns a setup error if the copy fails everywhere or the staged file
/// cannot be found afterwards.
pub async fn stage_input(source: &Path, candidates: &[PathBuf]) -> Result<String> {
    copy_to_candidates(source, candidates).await?;
    let name = file_name(source)?;
    let staged = first_existing(&name, candidates)
        .await
        .ok_or_else(|| Error::setup("no staged source file found"))?;
    upload_path(&staged)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::setup(format!("{} has no file name", path.display())))
}
