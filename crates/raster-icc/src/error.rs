//! ICC error types.

use thiserror::Error;

/// Result alias for profile and transform operations.
pub type IccResult<T> = Result<T, IccError>;

/// Failures from Little CMS or from sample slices handed to a transform.
#[derive(Debug, Clone, Error)]
pub enum IccError {
    /// The bytes are not an ICC profile.
    #[error("cannot parse ICC data: {0}")]
    Parse(String),

    /// A built-in profile could not be constructed or serialized.
    #[error("cannot build profile: {0}")]
    Build(String),

    /// Two profiles could not be linked.
    #[error("cannot link profiles: {0}")]
    Link(String),

    /// The profile is neither gray nor RGB.
    #[error("profile '{0}' is neither gray nor RGB")]
    UnsupportedClass(String),

    /// The sample slice does not hold whole pixels.
    #[error("{len} samples is not a multiple of {channels} channels")]
    PartialPixel {
        /// Samples supplied.
        len: usize,
        /// Channels per source pixel.
        channels: usize,
    },
}
