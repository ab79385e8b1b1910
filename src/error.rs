//! Application error type.
//!
//! Every fallible path in the crate returns `Result<_, AppError>`. The error
//! carries the process exit code so `main` can translate a failure without
//! matching on message text.
//!
//! Exit code convention:
//! - `2`: usage errors (bad flags, unreadable or unwritable files)
//! - `3`: data errors (empty or malformed measurement sets)
//! - `4`: numeric errors (the fit diverged or produced non-finite values)

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

    /// A usage/environment error (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// A data error: empty, ragged, or non-numeric input (exit code 3).
    pub fn data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// A numeric error: non-finite values during fitting (exit code 4).
    pub fn numeric(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn is_data(&self) -> bool {
        self.exit_code == 3
    }

    pub fn is_numeric(&self) -> bool {
        self.exit_code == 4
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
