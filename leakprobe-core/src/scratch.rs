use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};

/// Delete the scratch database. A missing file is not an error.
pub fn remove_scratch(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("removed scratch database {}", path.display());
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(Error::Scratch {
            path: path.to_path_buf(),
            source,
        }),
    }
}
