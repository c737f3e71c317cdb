use thiserror::Error;

pub type Result<T> = std::result::Result<T, NetworkError>;

/// Failures raised by the numeric core. Each one is reported at the point of
/// use; nothing here is recovered from silently.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NetworkError {
    #[error("invalid network construction: {0}")]
    Construction(String),

    #[error("input has {actual} features, network expects {expected}")]
    InvalidInput { expected: usize, actual: usize },

    #[error("label {label} is outside the valid class range 0..{classes}")]
    InvalidLabel { label: i64, classes: usize },

    #[error("batch size must be positive, got {0}")]
    InvalidBatchSize(usize),

    #[error("learning rate must be a positive finite number, got {0}")]
    InvalidLearningRate(f64),
}

/// Failures while decoding the gzip-compressed IDX files.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected magic number {actual}, expected {expected}")]
    BadMagic { expected: i32, actual: i32 },

    #[error("file is truncated: header promises {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("image file holds {images} records but label file holds {labels}")]
    CountMismatch { images: usize, labels: usize },

    #[error("header dimensions {0:?} describe more bytes than can be addressed")]
    DimensionOverflow(Vec<usize>),

    #[error("negative dimension {0} in header")]
    NegativeDimension(i32),
}
