//! Output path resolution and artifact persistence.
//!
//! Writes go through the host pipeline's filesystem abstraction so the
//! artifact lands in the same target as the build outputs, including virtual
//! filesystems used during build staging.

use crate::error::ProfileError;
use crate::session::ProfilePayload;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// File name used when the artifact path is derived from the pipeline's own
/// output directory.
pub const PROFILE_FILE_NAME: &str = "webpack.cpuprofile";

/// The host-supplied `write_file` capability.
pub trait OutputFileSystem: Send + Sync {
    /// Create or overwrite `path` with `contents`.
    ///
    /// Intermediate directories are the pipeline's responsibility; by
    /// completion time its output directory already exists.
    fn write_file<'a>(
        &'a self,
        path: &'a Path,
        contents: &'a [u8],
    ) -> BoxFuture<'a, io::Result<()>>;
}

/// Pick the artifact path: an explicit path wins; otherwise the pipeline's
/// output directory plus [`PROFILE_FILE_NAME`]. With neither available the
/// session could never complete, so this is a configuration error raised at
/// attachment rather than at the end of the build.
pub fn resolve_output_path(
    explicit: Option<&Path>,
    pipeline_output_dir: Option<&Path>,
) -> Result<PathBuf, ProfileError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match pipeline_output_dir {
        Some(dir) => Ok(dir.join(PROFILE_FILE_NAME)),
        None => Err(ProfileError::Configuration(
            "an explicit output path or a configured pipeline output directory \
             is required to place the CPU profile"
                .into(),
        )),
    }
}

pub(crate) async fn write_profile(
    filesystem: &dyn OutputFileSystem,
    path: &Path,
    payload: &ProfilePayload,
) -> Result<(), ProfileError> {
    filesystem
        .write_file(path, payload.as_bytes())
        .await
        .map_err(|source| ProfileError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// The real filesystem.
///
/// Writes a sibling temp file and renames it into place, so a failed write
/// never leaves a partial artifact at the target path.
pub struct NativeFileSystem;

impl OutputFileSystem for NativeFileSystem {
    fn write_file<'a>(
        &'a self,
        path: &'a Path,
        contents: &'a [u8],
    ) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            let file_name = path.file_name().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", path.display()),
                )
            })?;
            let mut tmp_name = file_name.to_os_string();
            tmp_name.push(".tmp");
            let tmp = path.with_file_name(tmp_name);

            if let Err(err) = tokio::fs::write(&tmp, contents).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(err);
            }
            match tokio::fs::rename(&tmp, path).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    let _ = tokio::fs::remove_file(&tmp).await;
                    Err(err)
                }
            }
        })
    }
}

/// In-memory filesystem for pipelines that stage their outputs virtually.
///
/// Clones share the same backing store, so a handle kept by the host can
/// inspect what the plugin wrote.
#[derive(Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

impl OutputFileSystem for MemoryFileSystem {
    fn write_file<'a>(
        &'a self,
        path: &'a Path,
        contents: &'a [u8],
    ) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        })
    }
}
