//! Folder and file upload into a container.
//!
//! The folder upload enumerates the whole local tree first, then writes each
//! file with one whole-file request, in discovery order. A failing file never
//! stops the batch; every file gets exactly one line in the report.
//!
//! Uploads use the Graph simple-upload endpoint, so each file must fit in a
//! single request (see [`SIMPLE_UPLOAD_LIMIT_BYTES`]). Larger files are still
//! attempted once and will be rejected remotely; resumable upload sessions
//! are not implemented.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::graph::RemoteStore;

/// Largest file the Graph simple-upload endpoint accepts in one request.
pub const SIMPLE_UPLOAD_LIMIT_BYTES: u64 = 250 * 1024 * 1024;

/// One local file and where it lands in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub local_file_path: PathBuf,
    /// Forward-slash path relative to the container root, without leading or
    /// trailing slash.
    pub remote_relative_path: String,
}

impl UploadTask {
    /// Path passed to the remote write call.
    pub fn remote_call_path(&self) -> String {
        format!("/{}", self.remote_relative_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Succeeded,
    /// The remote call returned without a created item.
    Failed,
    /// Reading the file or the remote call raised.
    Errored(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub task: UploadTask,
    pub status: UploadStatus,
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.task.remote_relative_path;
        match &self.status {
            UploadStatus::Succeeded => write!(f, "Uploaded: {path}"),
            UploadStatus::Failed => write!(f, "Failed: {path}"),
            UploadStatus::Errored(message) => write!(f, "Error uploading {path}: {message}"),
        }
    }
}

/// Failures that stop an upload before any file is written.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum UploadError {
    #[error("Local folder '{}' does not exist.", .0.display())]
    FolderNotFound(PathBuf),

    #[error("No files found in local folder '{}'.", .0.display())]
    NoFiles(PathBuf),

    #[error("Local file '{}' does not exist.", .0.display())]
    FileNotFound(PathBuf),

    /// The directory walk itself failed.
    #[error("{0}")]
    Walk(#[from] walkdir::Error),
}

impl UploadError {
    /// Text returned to the caller in place of a report.
    pub fn report(&self) -> String {
        match self {
            Self::Walk(err) => format!("Error uploading folder: {err}"),
            other => other.to_string(),
        }
    }
}

/// Joins the destination prefix, relative directory and file name into a
/// normalized remote path.
///
/// Backslashes in `dest` are treated as separators; the local parts keep
/// theirs, since on Unix a backslash is a valid file name character. Empty
/// segments are dropped, so the result never starts or ends with `/`.
pub fn remote_path(dest: Option<&str>, relative_dir: &str, file_name: &str) -> String {
    dest.unwrap_or_default()
        .split(['/', '\\'])
        .chain(relative_dir.split('/'))
        .chain(file_name.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Enumerates every file under `local_folder` and maps it to its remote path.
///
/// Entries are sorted by file name within each directory, so the order is
/// deterministic across platforms. Directory symlinks are not followed.
///
/// # Errors
///
/// Returns [`UploadError::FolderNotFound`] if `local_folder` is not a
/// directory, [`UploadError::NoFiles`] if the tree holds no files, and
/// [`UploadError::Walk`] if a directory cannot be read.
pub fn plan_uploads(
    local_folder: &Path,
    dest: Option<&str>,
) -> Result<Vec<UploadTask>, UploadError> {
    if !local_folder.is_dir() {
        return Err(UploadError::FolderNotFound(local_folder.to_path_buf()));
    }

    let mut tasks = Vec::new();
    for entry in WalkDir::new(local_folder).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() || !entry.path().is_file() {
            continue;
        }

        let relative_dir = entry
            .path()
            .strip_prefix(local_folder)
            .ok()
            .and_then(Path::parent)
            .map(path_to_slashes)
            .unwrap_or_default();
        let file_name = entry.file_name().to_string_lossy();

        tasks.push(UploadTask {
            local_file_path: entry.path().to_path_buf(),
            remote_relative_path: remote_path(dest, &relative_dir, &file_name),
        });
    }

    if tasks.is_empty() {
        return Err(UploadError::NoFiles(local_folder.to_path_buf()));
    }
    Ok(tasks)
}

fn path_to_slashes(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins outcome lines with newlines.
pub fn render_report(outcomes: &[UploadOutcome]) -> String {
    outcomes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Uploads local files into a container through a [`RemoteStore`].
#[derive(Clone)]
pub struct FolderUploader {
    store: Arc<dyn RemoteStore>,
}

impl FolderUploader {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Uploads every file under `local_folder` and returns the text report.
    ///
    /// Preconditions and walk failures are returned as a single line; in
    /// that case no remote call has been made.
    pub async fn upload_folder(
        &self,
        container_id: &str,
        local_folder: &Path,
        dest: Option<&str>,
    ) -> String {
        match self.try_upload_folder(container_id, local_folder, dest).await {
            Ok(outcomes) => render_report(&outcomes),
            Err(err) => {
                warn!(local_folder = %local_folder.display(), error = %err, "Folder upload aborted");
                err.report()
            }
        }
    }

    /// Like [`Self::upload_folder`] but returns the structured outcomes.
    ///
    /// # Errors
    ///
    /// Returns the [`plan_uploads`] errors. Per-file failures are outcomes,
    /// not errors.
    pub async fn try_upload_folder(
        &self,
        container_id: &str,
        local_folder: &Path,
        dest: Option<&str>,
    ) -> Result<Vec<UploadOutcome>, UploadError> {
        let tasks = plan_uploads(local_folder, dest)?;
        info!(
            container_id,
            local_folder = %local_folder.display(),
            files = tasks.len(),
            "Uploading folder"
        );

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            outcomes.push(self.upload_task(container_id, task).await);
        }

        let succeeded = outcomes
            .iter()
            .filter(|outcome| outcome.status == UploadStatus::Succeeded)
            .count();
        info!(
            container_id,
            succeeded,
            failed = outcomes.len() - succeeded,
            "Folder upload finished"
        );
        Ok(outcomes)
    }

    /// Uploads one file. The remote path is `dest_path` when given, else the
    /// file name at the container root.
    pub async fn upload_file(
        &self,
        container_id: &str,
        local_file: &Path,
        dest_path: Option<&str>,
    ) -> String {
        if !local_file.is_file() {
            return UploadError::FileNotFound(local_file.to_path_buf()).report();
        }

        let file_name = local_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let remote_relative_path = match dest_path.map(|dest| remote_path(Some(dest), "", "")) {
            Some(path) if !path.is_empty() => path,
            _ => remote_path(None, "", &file_name),
        };

        let task = UploadTask {
            local_file_path: local_file.to_path_buf(),
            remote_relative_path,
        };
        self.upload_task(container_id, task).await.to_string()
    }

    async fn upload_task(&self, container_id: &str, task: UploadTask) -> UploadOutcome {
        let status = match tokio::fs::read(&task.local_file_path).await {
            Ok(content) => {
                let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
                if size > SIMPLE_UPLOAD_LIMIT_BYTES {
                    warn!(
                        path = %task.remote_relative_path,
                        size,
                        limit = SIMPLE_UPLOAD_LIMIT_BYTES,
                        "File exceeds the single-request upload limit"
                    );
                }

                match self
                    .store
                    .write_content(container_id, &task.remote_call_path(), content)
                    .await
                {
                    Ok(Some(_)) => UploadStatus::Succeeded,
                    Ok(None) => UploadStatus::Failed,
                    Err(err) => UploadStatus::Errored(err.to_string()),
                }
            }
            Err(err) => UploadStatus::Errored(err.to_string()),
        };

        match &status {
            UploadStatus::Succeeded => info!(path = %task.remote_relative_path, "Uploaded file"),
            UploadStatus::Failed => {
                warn!(path = %task.remote_relative_path, "Upload returned no item");
            }
            UploadStatus::Errored(message) => {
                warn!(path = %task.remote_relative_path, error = %message, "Upload failed");
            }
        }

        UploadOutcome { task, status }
    }
}
