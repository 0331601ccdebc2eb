use thiserror::Error;

pub type WcsResult<T> = Result<T, WcsError>;

/// Failure of a single transform or of setting up a coordinate system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WcsError {
    #[error("Missing required WCS keyword: {keyword}")]
    MissingKeyword { keyword: String },

    #[error("Invalid WCS keyword '{keyword}': {message}")]
    InvalidKeyword { keyword: String, message: String },

    #[error("Unsupported projection: {code}")]
    UnsupportedProjection { code: String },

    #[error("Singularity in transformation: {message}")]
    Singularity { message: String },

    #[error("Coordinate out of bounds: {message}")]
    OutOfBounds { message: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Convergence failure: {message}")]
    ConvergenceFailure { message: String },

    #[error("Non-invertible matrix (determinant = {determinant})")]
    NonInvertibleMatrix { determinant: f64 },

    #[error("Coordinate system has no longitude/latitude axis pair")]
    MissingCelestialAxes,

    #[error("Non-finite value: {message}")]
    NonFinite { message: String },
}

impl WcsError {
    pub fn missing_keyword(keyword: impl Into<String>) -> Self {
        Self::MissingKeyword {
            keyword: keyword.into(),
        }
    }

    pub fn invalid_keyword(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKeyword {
            keyword: keyword.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_projection(code: impl Into<String>) -> Self {
        Self::UnsupportedProjection { code: code.into() }
    }

    pub fn singularity(message: impl Into<String>) -> Self {
        Self::Singularity {
            message: message.into(),
        }
    }

    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::OutOfBounds {
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn convergence_failure(message: impl Into<String>) -> Self {
        Self::ConvergenceFailure {
            message: message.into(),
        }
    }

    pub fn non_invertible_matrix(determinant: f64) -> Self {
        Self::NonInvertibleMatrix { determinant }
    }

    pub fn non_finite(message: impl Into<String>) -> Self {
        Self::NonFinite {
            message: message.into(),
        }
    }

    /// True for errors tied to one input coordinate rather than to the
    /// coordinate system itself.
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::Singularity { .. } | Self::NonFinite { .. }
        )
    }
}

/// The header stream could not be read at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("record count must be positive, got {0}")]
    NonPositiveRecordCount(i64),

    #[error("header holds {available} records but {expected} were declared")]
    Truncated { expected: usize, available: usize },
}

/// Why a parsed description cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("header parse failed: {0}")]
    ParseFailure(#[from] ParseError),

    #[error("no coordinate system with exactly two axes")]
    NoUsableSystem,

    #[error("unsupported axis count {0}, only 2-axis systems are handled")]
    UnsupportedAxisCount(usize),
}

/// Which way a transform was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    PixelToSky,
    SkyToPixel,
}

/// Integer status codes reported across the host boundary.
///
/// The numbering follows the long-standing WCSLIB convention so callers that
/// already branch on those values keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum WcsStatus {
    Success = 0,
    InvalidHandle = 1,
    SingularMatrix = 3,
    MissingCelestialAxes = 4,
    InvalidProjection = 6,
    IllConditioned = 7,
    InvalidPixel = 8,
    InvalidWorld = 9,
}

impl WcsStatus {
    pub fn from_error(err: &WcsError, direction: Direction) -> Self {
        match err {
            WcsError::NonInvertibleMatrix { .. } => Self::SingularMatrix,
            WcsError::MissingCelestialAxes => Self::MissingCelestialAxes,
            WcsError::ConvergenceFailure { .. } => Self::IllConditioned,
            WcsError::MissingKeyword { .. }
            | WcsError::InvalidKeyword { .. }
            | WcsError::UnsupportedProjection { .. }
            | WcsError::InvalidParameter { .. } => Self::InvalidProjection,
            WcsError::OutOfBounds { .. }
            | WcsError::Singularity { .. }
            | WcsError::NonFinite { .. } => match direction {
                Direction::PixelToSky => Self::InvalidPixel,
                Direction::SkyToPixel => Self::InvalidWorld,
            },
        }
    }

    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<WcsStatus> for i32 {
    fn from(status: WcsStatus) -> i32 {
        status.code()
    }
}
