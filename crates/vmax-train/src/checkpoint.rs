//! Saving and loading parameters as JSON.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::TrainError;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TrainError + '_ {
    move |source| TrainError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Serialize `params` to `path`, creating parent directories.
pub fn save_params<T: Serialize + ?Sized>(path: &Path, params: &T) -> Result<(), TrainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, params).map_err(|e| TrainError::Serialize {
        reason: e.to_string(),
    })?;
    writer.flush().map_err(io_error(path))?;
    info!(path = %path.display(), "saved parameters");
    Ok(())
}

/// Read parameters written by [`save_params`].
pub fn load_params<T: DeserializeOwned>(path: &Path) -> Result<T, TrainError> {
    let file = File::open(path).map_err(io_error(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| TrainError::Serialize {
        reason: e.to_string(),
    })
}
