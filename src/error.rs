//! Error types for turbo-maze.

use crate::grid::Pos;

/// Result type alias
pub type Result<T> = std::result::Result<T, MazeError>;

/// Errors surfaced by grid access, algorithms and persistence.
#[derive(Debug, thiserror::Error)]
pub enum MazeError {
    /// Coordinate outside the lattice
    #[error("coordinate ({}, {}) out of bounds for {width}x{height} grid", pos.x, pos.y)]
    OutOfBounds {
        /// Offending coordinate
        pos: Pos,
        /// Grid width
        width: u32,
        /// Grid height
        height: u32,
    },

    /// Zero-sized grid, or a grid whose cell count overflows `u32`
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// A stepper or journal was driven against a grid of another size
    #[error("grid is {actual_width}x{actual_height}, expected {width}x{height}")]
    GridMismatch {
        /// Expected width
        width: u32,
        /// Expected height
        height: u32,
        /// Width of the grid that was passed in
        actual_width: u32,
        /// Height of the grid that was passed in
        actual_height: u32,
    },

    /// Braid factor outside `[0, 1]`
    #[error("braid factor {0} outside [0, 1]")]
    InvalidBraidFactor(f64),

    /// Stitch density outside `[0, 1]`
    #[error("stitch density {0} outside [0, 1]")]
    InvalidStitchDensity(f64),

    /// Block size of zero
    #[error("block size must be at least 1")]
    InvalidBlockSize,

    /// Maze file or event log does not start with the expected magic
    #[error("bad magic: expected {expected:?}")]
    BadMagic {
        /// Magic bytes that were expected
        expected: &'static [u8],
    },

    /// Maze file version this build cannot read
    #[error("unsupported maze file version {0}")]
    UnsupportedVersion(u8),

    /// Payload length does not match the grid size
    #[error("payload holds {actual} cells, expected {expected}")]
    PayloadSize {
        /// `width * height`
        expected: usize,
        /// Bytes actually found
        actual: usize,
    },

    /// Metadata JSON longer than the 16-bit length field allows
    #[error("metadata is {0} bytes, limit is 65535")]
    MetadataTooLarge(usize),

    /// Metadata JSON could not be encoded or decoded
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Event record with an unknown type tag
    #[error("unknown event tag {0:#04x}")]
    UnknownEvent(u8),

    /// Direction byte that is not a single wall bit
    #[error("invalid direction byte {0:#04x}")]
    InvalidDirection(u8),

    /// Event log ended in the middle of a record
    #[error("event log truncated after {consumed} events")]
    TruncatedLog {
        /// Complete events read before the cut
        consumed: u64,
    },

    /// Grid too large for the 16-bit event-log coordinates
    #[error("{width}x{height} grid exceeds the 65536x65536 event log limit")]
    CoordinateOverflow {
        /// Grid width
        width: u32,
        /// Grid height
        height: u32,
    },

    /// Generator or solver name that is not recognised
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Seed-only maze file without a stored seed or algorithm
    #[error("seed-only maze is missing `{0}` metadata")]
    MissingMetadata(&'static str),

    /// Worker pool could not be created
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
