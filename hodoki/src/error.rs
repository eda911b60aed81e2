use thiserror::Error;

#[derive(Debug, Error)]
pub enum HodokiError {
    #[error("Unrecognized format: {0}")]
    FormatNotRecognized(String),
    #[error("{name} is recognized by more than one format: {tags}")]
    AmbiguousFormat { name: String, tags: String },
    #[error("Unknown format tag: {0}")]
    UnknownFormat(String),
    #[error("Format tag registered twice: {0}")]
    DuplicateFormat(String),
    #[error("Failed to guess the key: expected size {expected:#X}, got {actual:#X}")]
    KeyRecoveryFailed { expected: u64, actual: u64 },
    #[error("Unexpected end of stream: requested {requested} bytes, {available} available")]
    UnexpectedEof { requested: usize, available: usize },
    #[error("Position {position} is out of range (size {size})")]
    OutOfRange { position: i64, size: usize },
    #[error("Corrupt data: {0}")]
    CorruptData(String),
    #[error("Probability model cannot hold more than {0} symbols")]
    AlphabetOverflow(usize),
    #[error("Nesting deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl From<scroll::Error> for HodokiError {
    fn from(err: scroll::Error) -> Self {
        match err {
            scroll::Error::TooBig { size, len } => HodokiError::UnexpectedEof {
                requested: size,
                available: len,
            },
            err => HodokiError::CorruptData(err.to_string()),
        }
    }
}
