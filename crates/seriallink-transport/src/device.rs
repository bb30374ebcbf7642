use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::LinkTransport;

/// A serial device (or any character device / file) opened for reading and writing.
///
/// The device is opened once and the handle is cloned so that the read half and
/// the write half are independent file descriptors. A pending read therefore
/// never holds up a write. Line settings (baud rate, parity) are expected to be
/// configured beforehand, e.g. with `stty`.
#[derive(Debug)]
pub struct SerialDevice {
    path: PathBuf,
    read: File,
    write: File,
}

impl SerialDevice {
    /// Open the device at `path` read-write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let read = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .await
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;
        let write = read
            .try_clone()
            .await
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        debug!(?path, "opened serial device");
        Ok(Self { path, read, write })
    }

    /// Device path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LinkTransport for SerialDevice {
    type Read = File;
    type Write = File;

    fn into_split(self) -> (Self::Read, Self::Write) {
        (self.read, self.write)
    }
}
