/// A width mismatch between two `Sdata` operands, or between a requested width and a
/// value that cannot be represented at that width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WidthError {
    /// Two operands were expected to carry the same width but did not.
    #[error("width mismatch: expected {expected} bits, got {actual} bits")]
    Mismatch {
        /// The width the caller required.
        expected: u32,
        /// The width actually supplied.
        actual: u32,
    },
    /// A bit-width of zero was requested; all `Sdata` values carry at least one bit.
    #[error("zero-width value is not representable")]
    ZeroWidth,
    /// A width wider than `Sdata`'s backing storage (128 bits) was requested.
    #[error("width {0} exceeds the maximum supported width of 128 bits")]
    TooWide(u32),
    /// A narrowing operation (e.g. `sext`/`zext` to a smaller width, or bit extraction)
    /// was given a range that does not fit in the source width.
    #[error("bit range out of bounds: {lo}..={hi} does not fit in a {width}-bit value")]
    OutOfRange {
        /// Lower bound of the requested range.
        lo: u32,
        /// Upper bound of the requested range.
        hi: u32,
        /// Width of the value the range was requested against.
        width: u32,
    },
}

impl WidthError {
    /// Build a [`WidthError::Mismatch`] from the two widths under comparison.
    pub const fn mismatch(expected: u32, actual: u32) -> Self {
        Self::Mismatch { expected, actual }
    }
}
