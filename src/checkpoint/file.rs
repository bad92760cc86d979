use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{
    Checkpoint, CheckpointStore, check_revision, sort_newest_first, validate_session_id,
};
use crate::errors::StoreError;

const CHECKPOINT_EXT: &str = "json";

/// One JSON file per session under a directory.
///
/// Writes go to a temporary file that is synced and renamed over the target,
/// so a crash never leaves a torn checkpoint. A `<id>.lock` sidecar held with
/// an exclusive advisory lock serializes writers across processes, and the
/// stored revision is compared under that lock. All filesystem access runs
/// on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", session_id, CHECKPOINT_EXT))
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Run blocking filesystem work off the async executor.
async fn blocking<F, R>(f: F) -> Result<R, StoreError>
where
    F: FnOnce() -> Result<R, StoreError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::TaskPanicked(e.to_string()))?
}

fn read_checkpoint(path: &Path, session_id: &str) -> Result<Option<Checkpoint>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path)(e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Serialization {
            session_id: session_id.to_string(),
            source,
        })
}

fn write_checkpoint(
    dir: &Path,
    path: &Path,
    checkpoint: &Checkpoint,
    expected_revision: Option<u64>,
) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(io_err(dir))?;

    let json =
        serde_json::to_string_pretty(checkpoint).map_err(|source| StoreError::Serialization {
            session_id: checkpoint.session_id.clone(),
            source,
        })?;

    let lock_path = path.with_extension("lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(io_err(&lock_path))?;
    lock_file.lock_exclusive().map_err(io_err(&lock_path))?;

    let tmp_path = path.with_extension("json.tmp");
    let result = (|| {
        let found = read_checkpoint(path, &checkpoint.session_id)?.map(|c| c.revision);
        check_revision(&checkpoint.session_id, expected_revision, found)?;

        let mut tmp = File::create(&tmp_path).map_err(io_err(&tmp_path))?;
        tmp.write_all(json.as_bytes()).map_err(io_err(&tmp_path))?;
        tmp.sync_all().map_err(io_err(&tmp_path))?;
        drop(tmp);
        fs::rename(&tmp_path, path).map_err(io_err(path))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    let _ = FileExt::unlock(&lock_file);
    result
}

#[async_trait]
impl CheckpointStore for FileStore {
    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, StoreError> {
        validate_session_id(session_id)?;
        let path = self.path_for(session_id);
        let id = session_id.to_string();
        blocking(move || read_checkpoint(&path, &id)).await
    }

    async fn save(
        &self,
        checkpoint: &Checkpoint,
        expected_revision: Option<u64>,
    ) -> Result<(), StoreError> {
        validate_session_id(&checkpoint.session_id)?;
        let dir = self.dir.clone();
        let path = self.path_for(&checkpoint.session_id);
        let session_id = checkpoint.session_id.clone();
        let revision = checkpoint.revision;
        let checkpoint = checkpoint.clone();
        blocking(move || write_checkpoint(&dir, &path, &checkpoint, expected_revision)).await?;
        tracing::debug!(session_id = %session_id, revision, "Checkpoint written");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Checkpoint>, StoreError> {
        let dir = self.dir.clone();
        blocking(move || {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(io_err(&dir)(e)),
            };

            let mut all = Vec::new();
            for entry in entries {
                let path = entry.map_err(io_err(&dir))?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(CHECKPOINT_EXT) {
                    continue;
                }
                let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if validate_session_id(id).is_err() {
                    continue;
                }
                match read_checkpoint(&path, id) {
                    Ok(Some(cp)) => all.push(cp),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable checkpoint"),
                }
            }
            sort_newest_first(&mut all);
            Ok(all)
        })
        .await
    }
}
