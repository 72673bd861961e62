//! Binary image loader.
//!
//! An image is a 4-byte little-endian payload length followed by exactly
//! that many bytes of code. Anything shorter or longer than the header
//! declares is rejected.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("load_file: reached EOF (actual size is less than header)")]
    TooShort,
    #[error("load_file: input file remained (actual size is more than header)")]
    TrailingBytes,
    #[error("load_file: program does not fit in memory: {size} bytes at {entry:#x}")]
    TooLarge { size: u32, entry: u32 },
}

/// Read and validate an image file, returning the program payload.
pub fn read_image(path: &Path) -> Result<Vec<u8>, LoaderError> {
    let mut file = File::open(path)?;

    let mut header = [0u8; 4];
    read_fully(&mut file, &mut header)?;
    let prog_size = u32::from_le_bytes(header);

    let mut payload = vec![0u8; prog_size as usize];
    read_fully(&mut file, &mut payload)?;

    let mut tail = [0u8; 1];
    if file.read(&mut tail)? != 0 {
        return Err(LoaderError::TrailingBytes);
    }

    tracing::info!(path = %path.display(), size = prog_size, "loaded program image");
    Ok(payload)
}

fn read_fully(file: &mut File, buf: &mut [u8]) -> Result<(), LoaderError> {
    file.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            LoaderError::TooShort
        } else {
            LoaderError::Io(e)
        }
    })
}
