//! Application-level error type.
//!
//! Every pipeline step returns `AppError`; the binary prints the message and
//! exits with the carried code:
//!
//! - `2`: configuration or I/O problem (bad flag, missing file, bad bundle)
//! - `3`: not enough usable data to train
//! - `4`: numerical / model failure
//! - `5`: server failure (bind, runtime)

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

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(5, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
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
