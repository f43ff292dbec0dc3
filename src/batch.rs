// Bulk upload of a local directory. Files go up one at a time with a
// short pause in between so the service's rate limits are not hit.

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::RepoRef;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of `upload_directory`, one name per directory entry.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, ApiError)>,
}

impl UploadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Upload every regular file directly inside `dir` to the repository root,
/// in file-name order. Subdirectories are skipped. A failed file is recorded
/// and the remaining files are still attempted.
///
/// `on_file` is called with each file name right before it is uploaded.
pub fn upload_directory<F>(
    api: &ApiClient,
    repo: &RepoRef,
    dir: &Path,
    delay: Duration,
    mut on_file: F,
) -> ApiResult<UploadReport>
where
    F: FnMut(&str),
{
    let mut entries = std::fs::read_dir(dir)
        .and_then(|rd| rd.collect::<Result<Vec<_>, _>>())
        .map_err(|e| ApiError::io(dir, e))?;
    entries.sort_by_key(|e| e.file_name());
    debug!(dir = %dir.display(), count = entries.len(), "uploading directory");

    let mut report = UploadReport::default();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();

        match entry.file_type() {
            Ok(kind) if kind.is_dir() => {
                debug!(%name, "skipping directory");
                report.skipped.push(name);
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                report.failed.push((name, ApiError::io(&path, e)));
                continue;
            }
        }

        on_file(&name);
        let message = format!("Upload {name} from repo-manager");
        match api.upload_file(repo, &path, Some(&name), Some(&message)) {
            Ok(_) => report.uploaded.push(name),
            Err(e) => {
                warn!(%name, error = %e, "upload failed");
                report.failed.push((name, e));
            }
        }

        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
    Ok(report)
}
