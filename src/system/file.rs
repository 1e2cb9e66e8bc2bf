use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::log::pam_warn;

/// A generated file that must not outlive the check it was written for.
///
/// `remove` deletes it and reports failures; if the value is dropped
/// instead (an error or panic got in between) the file is deleted on a
/// best-effort basis.
#[must_use]
pub struct TransientFile {
    path: PathBuf,
    removed: bool,
}

impl TransientFile {
    pub fn create(path: impl Into<PathBuf>, contents: &str) -> Result<Self> {
        let path = path.into();
        fs::write(&path, contents).map_err(Error::io(&path))?;

        Ok(TransientFile {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(mut self) -> Result<()> {
        self.removed = true;
        fs::remove_file(&self.path).map_err(Error::io(&self.path))
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(err) = fs::remove_file(&self.path) {
                pam_warn!("cannot remove {}: {err}", self.path.display());
            }
        }
    }
}
