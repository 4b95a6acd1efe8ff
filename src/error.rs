use crate::guid::Guid;

/// Errors returned while unwrapping a firmware container or capsule.
///
/// Every offset is absolute, counted from the start of the input buffer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fewer bytes remain than the structure (or slice) being read needs.
    #[error("truncated buffer at offset {offset:#x}: need {needed} bytes, {available} available")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A header declares a size smaller than its own fixed layout.
    #[error("invalid header size in {header}: expected at least {minimum}, got {declared}")]
    InvalidHeaderSize {
        header: &'static str,
        minimum: usize,
        declared: u32,
    },

    /// The capsule header's image size does not match the input length.
    #[error("invalid capsule image size: expected {declared}, got {actual}")]
    SizeMismatch { declared: u32, actual: usize },

    /// The container's image does not end exactly at the end of the file.
    #[error(
        "invalid image data size: offset {image_offset} + size {image_size} != file size {file_size}"
    )]
    ImageSizeMismatch {
        image_offset: u32,
        image_size: u32,
        file_size: usize,
    },

    #[error(transparent)]
    UnsupportedCapsule(#[from] Unsupported),

    /// A payload item offset points back into the FMP header or offset table.
    #[error("invalid offset for payload item {index}: expected minimum {minimum}, got {offset}")]
    InvalidOffset {
        index: u16,
        offset: u64,
        minimum: usize,
    },

    #[error("UpdateImageSize larger than available data: at most {available}, got {declared}")]
    OversizedImage { declared: u32, available: usize },

    #[error("PayloadSize larger than available data: at most {available}, got {declared}")]
    OversizedPayload { declared: u32, available: usize },

    /// Chunk addresses must follow each other without gaps or overlaps.
    #[error(
        "non-consecutive chunk at offset {offset:#x}: expected address {expected}, got {found}"
    )]
    NonConsecutiveChunk {
        offset: usize,
        expected: usize,
        found: u32,
    },

    #[error(transparent)]
    Parse(#[from] binrw::Error),
}

/// Why a capsule was rejected as a whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unsupported {
    #[error("unsupported capsule GUID: expected {expected}, got {found}")]
    Guid { expected: Guid, found: Guid },
    #[error("unsupported FMP capsule header version: expected {expected}, got {found}")]
    Version { expected: u32, found: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
