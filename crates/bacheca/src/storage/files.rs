//! Directory-of-files slot backend.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Slot, SlotStorage};
use crate::error::{Error, Result};

/// Stores each slot as `<dir>/<slot>.json`.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// slot file, so a crash mid-write leaves the previous payload intact.
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    /// Open (and create if needed) a slot directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| Error::DirectoryCreate {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self { dir })
    }

    /// The directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `slot`.
    #[must_use]
    pub fn slot_path(&self, slot: Slot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.name()))
    }
}

impl SlotStorage for FileSlots {
    fn read(&self, slot: Slot) -> Result<Option<String>> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::slot_read(slot, err.to_string())),
        }
    }

    fn write(&self, slot: Slot, payload: &str) -> Result<()> {
        let path = self.slot_path(slot);
        let tmp = self.dir.join(format!(".{}.json.tmp", slot.name()));

        fs::write(&tmp, payload).map_err(|err| Error::slot_write(slot, err.to_string()))?;
        fs::rename(&tmp, &path).map_err(|err| {
            let _ = fs::remove_file(&tmp);
            Error::slot_write(slot, err.to_string())
        })?;

        debug!("Wrote {} bytes to {}", payload.len(), path.display());
        Ok(())
    }

    fn remove(&self, slot: Slot) -> Result<()> {
        match fs::remove_file(self.slot_path(slot)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::slot_write(slot, err.to_string())),
        }
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}
