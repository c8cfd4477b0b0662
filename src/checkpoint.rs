use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::{SnapdeckError, SnapdeckResult};

/// Persists the resume cursor for one run.
///
/// The cursor is an index into the flattened work-item sequence; it is written
/// only after an item completes, so a crash mid-item re-does that item rather
/// than skipping it. Files are keyed by run id so runs never collide.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    dir: PathBuf,
    run_id: String,
    enabled: bool,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>, run_id: impl Into<String>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            run_id: run_id.into(),
            enabled,
        }
    }

    /// A store that never reads or writes anything.
    pub fn disabled() -> Self {
        Self::new(".", "", false)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.progress.txt", self.run_id))
    }

    /// Read the persisted cursor; 0 when checkpointing is disabled or no file
    /// exists yet.
    pub fn read_cursor(&self) -> SnapdeckResult<u64> {
        if !self.enabled {
            return Ok(0);
        }
        let path = self.path();
        if !path.exists() {
            return Ok(0);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read checkpoint '{}'", path.display()))?;
        text.trim().parse::<u64>().map_err(|e| {
            SnapdeckError::validation(format!(
                "checkpoint '{}' does not hold a cursor: {e}",
                path.display()
            ))
        })
    }

    /// Overwrite the cursor. A no-op when checkpointing is disabled.
    pub fn write_cursor(&self, cursor: u64) -> SnapdeckResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let path = self.path();
        ensure_dir(&self.dir)?;
        std::fs::write(&path, cursor.to_string())
            .with_context(|| format!("failed to write checkpoint '{}'", path.display()))?;
        tracing::debug!(cursor, path = %path.display(), "checkpoint updated");
        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> SnapdeckResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
    Ok(())
}
