//! Error types.

use std::io;

use eh1 as embedded_hal;

/// Errors returned by bus port operations.
///
/// Mocks never produce these on their own; a test attaches one to an
/// expectation with `with_error` to exercise the error handling of the
/// driver under test.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// The device did not acknowledge
    #[error("no acknowledge")]
    Nack,
    /// The operation did not complete in time
    #[error("operation timed out")]
    Timeout,
    /// Data was lost because it was not read in time
    #[error("overrun")]
    Overrun,
    /// The bus could not be opened
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    /// A raw negative return code from the bus layer
    #[error("bus returned code {0}")]
    Code(i32),
    /// Anything else
    #[error("bus error: {0}")]
    Other(String),
}

impl embedded_hal::i2c::Error for BusError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
        match self {
            BusError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            BusError::Overrun => ErrorKind::Overrun,
            _ => ErrorKind::Other,
        }
    }
}

impl embedded_hal::spi::Error for BusError {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        match self {
            BusError::Overrun => embedded_hal::spi::ErrorKind::Overrun,
            _ => embedded_hal::spi::ErrorKind::Other,
        }
    }
}

impl embedded_io::Error for BusError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            BusError::Timeout => embedded_io::ErrorKind::TimedOut,
            BusError::DeviceNotFound(_) => embedded_io::ErrorKind::NotFound,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

/// Errors raised by the test runner and the scaffold generator.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A setup or teardown hook failed
    #[error("{stage} failed: {reason}")]
    Fixture {
        /// Which hook failed, e.g. `"global setup"`
        stage: &'static str,
        /// What went wrong
        reason: String,
    },
    /// The module name is not a valid Rust identifier
    #[error("invalid module name '{0}'")]
    InvalidModuleName(String),
    /// A scaffold was requested without any bus
    #[error("at least one bus must be selected")]
    NoBusSelected,
    /// The output file exists and overwriting was not requested
    #[error("refusing to overwrite {0}")]
    AlreadyExists(String),
    /// A command line argument could not be understood
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Logger initialisation failed
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] log::SetLoggerError),
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HarnessError {
    /// Shorthand for a failed fixture hook.
    pub fn fixture(stage: &'static str, reason: impl Into<String>) -> Self {
        HarnessError::Fixture {
            stage,
            reason: reason.into(),
        }
    }
}
