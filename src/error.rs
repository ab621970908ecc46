use thiserror::Error;

/// Precondition violations raised by the plateau search.
///
/// "No plateau" is not an error; it is `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlateauError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A downstream statistic could not be computed (e.g. zero errors).
    #[error("numeric failure: {0}")]
    Numeric(String),
}

impl PlateauError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PlateauError::InvalidInput(message.into())
    }
}

/// Application-level error carrying the process exit code.
///
/// Exit codes: 2 = usage/config/IO, 3 = no usable data, 4 = numeric failure.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PlateauError> for AppError {
    fn from(err: PlateauError) -> Self {
        let exit_code = match err {
            PlateauError::InvalidInput(_) => 2,
            PlateauError::Numeric(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
