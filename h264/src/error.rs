use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The writer ran out of space and could not grow. Once returned, every later write on the
    /// same writer returns it again.
    #[error("bitstream buffer overflow (capacity {capacity} bytes)")]
    BufferOverflow { capacity: usize },
    #[error("bitstream writer is not byte aligned")]
    NotByteAligned,
    #[error("writing {0} is not supported")]
    Unsupported(&'static str),
    #[error("unsupported general_level_idc {0}")]
    UnsupportedLevelIdc(u8),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
