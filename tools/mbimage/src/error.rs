use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    #[error("unexpected character {0:?} in image definition")]
    UnexpectedChar(char),

    #[error("image data is incorrect size: expected {expected} bytes, got {actual}")]
    BadSize { expected: usize, actual: usize },

    #[error("index cannot be negative")]
    NegativeIndex,

    #[error("index too large")]
    IndexTooLarge,

    #[error("brightness {0} out of bounds (0..=9)")]
    BrightnessOutOfBounds(i32),

    #[error("images must be the same size")]
    SizeMismatch,

    #[error("brightness multiplier must not be negative")]
    NegativeMultiplier,

    #[error("brightness divisor must not be zero")]
    ZeroDivision,

    #[error("cannot allocate a {width}x{height} image")]
    TooLarge { width: usize, height: usize },
}
