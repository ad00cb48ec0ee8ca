use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("buffer too short: need at least {need} bytes, got {got}")]
    BufferTooShort { need: usize, got: usize },

    #[error("calldata shorter than the 4-byte selector")]
    MissingSelector,

    #[error("bad argument encoding: {0}")]
    BadArgumentEncoding(String),

    #[error("duplicate selector 0x{0:08x} registered for distinct functions")]
    DuplicateSelector(u32),
}

pub type Result<T> = std::result::Result<T, CodecError>;
