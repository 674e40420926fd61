//! File-backed settings space.
//!
//! The node's configuration lives in a flat file on the storage card,
//! written by the bus configuration protocol. This adapter serves the
//! byte-range reads [`NodeSettings::load`](crate::config::NodeSettings::load)
//! performs at startup and after a live configuration update.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use log::warn;

use crate::app::ports::{SettingsSpace, SpaceError};

pub struct FileSettingsSpace {
    path: PathBuf,
}

impl FileSettingsSpace {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsSpace for FileSettingsSpace {
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<(), SpaceError> {
        // Opened per read: reads happen once at startup and on rare config
        // updates, and the file may be rewritten underneath us in between.
        let mut file = File::open(&self.path).map_err(|e| {
            warn!("settings file {}: {e}", self.path.display());
            SpaceError::Io
        })?;
        file.seek(SeekFrom::Start(u64::from(addr)))
            .map_err(|_| SpaceError::Io)?;
        file.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                SpaceError::OutOfBounds
            } else {
                SpaceError::Io
            }
        })
    }
}
