//! Process-level error type.
//!
//! Fatal errors only: unreadable sources, schema mismatches, tables with no usable
//! rows. Legitimately insufficient data (empty selection, single period, zero
//! denominator) is never an error; queries return `Option`/empty instead.

/// Exit code for an unreadable source or a schema mismatch.
const EXIT_LOAD: u8 = 2;
/// Exit code for a table with no usable rows after validation.
const EXIT_NO_DATA: u8 = 3;
/// Exit code for a broken internal invariant.
const EXIT_INTERNAL: u8 = 4;

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

    /// A source file could not be read, or its schema does not match.
    pub fn load(message: impl Into<String>) -> Self {
        Self::new(EXIT_LOAD, message)
    }

    /// A table ended up with no usable rows after row-level validation.
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(EXIT_NO_DATA, message)
    }

    /// An internal invariant was broken.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EXIT_INTERNAL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
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
