//! Loading CSV files into memory

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::error::LoadError;
use crate::memory::AlignedBuffer;

/// Read the whole file at `path` into an aligned buffer
pub fn load<P: AsRef<Path>>(path: P) -> Result<AlignedBuffer, LoadError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|source| LoadError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;

    let read_failed = |source| LoadError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };

    let len = file.metadata().map_err(read_failed)?.len() as usize;
    let mut buffer = AlignedBuffer::zeroed(len)?;
    file.read_exact(buffer.as_mut_slice()).map_err(read_failed)?;

    debug!("loaded {} ({} bytes)", path.display(), len);
    Ok(buffer)
}
