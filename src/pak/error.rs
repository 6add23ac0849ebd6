use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PakError {
    #[error("unsupported pak version {0}")]
    UnsupportedVersion(u32),

    #[error("truncated pak header: {available} bytes available, {needed} needed")]
    TruncatedHeader { needed: usize, available: usize },

    #[error("truncated entry table: {needed} bytes needed past offset {offset}, {available} available")]
    TruncatedEntryTable {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("truncated alias table: {needed} bytes needed past offset {offset}, {available} available")]
    TruncatedAliasTable {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("malformed pak: {0}")]
    MalformedArchive(String),

    #[error("resource {0} not found")]
    NotFound(u16),

    #[error("out of memory allocating {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("too many {what} for pak version {version}: {count}")]
    TooManyResources {
        what: &'static str,
        version: u32,
        count: usize,
    },

    #[error("pak would be {size} bytes, offsets are limited to 32 bits")]
    ArchiveTooLarge { size: u64 },

    #[error("alias {id} points at entry {entry_index}, but there are only {resource_count} resources")]
    InvalidAlias {
        id: u16,
        entry_index: u16,
        resource_count: usize,
    },

    #[error("alias id {0} is also a resource id")]
    AliasShadowsResource(u16),

    #[error("buffer too small: {needed} bytes needed, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("broken pak index at line {line}: {reason}")]
    BadIndex { line: usize, reason: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PakError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedArchive(reason.into())
    }
}

pub type PakResult<T> = Result<T, PakError>;
