//! Call counters for intercepted bus functions.
//!
//! Every mock records each intercepted call in a [`CallCounter`]. Mocks
//! created with the same counter share one table, so a test can ask how
//! often the driver under test opened, wrote to or closed a bus without
//! caring which mock instance saw the call.
//!
//! ```
//! use comms_mock::counter::{CallCounter, Function};
//!
//! let counter = CallCounter::new();
//! counter.record(Function::I2cWrite);
//! counter.record(Function::I2cWrite);
//!
//! assert!(counter.was_called("i2c_write", 2));
//! assert!(counter.was_called("i2c_read", 0));
//! assert!(!counter.was_called("i2c_frobnicate", 0));
//!
//! counter.reset();
//! assert_eq!(counter.count(Function::I2cWrite), 0);
//! ```

use std::{
    fmt,
    str::FromStr,
    sync::{Arc, Mutex},
};

const FUNCTION_COUNT: usize = 11;

/// A bus function that can be intercepted by a mock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    /// `i2c_open`
    I2cOpen,
    /// `i2c_close`
    I2cClose,
    /// `i2c_write`
    I2cWrite,
    /// `i2c_read`
    I2cRead,
    /// `uart_open`
    UartOpen,
    /// `uart_close`
    UartClose,
    /// `uart_write`
    UartWrite,
    /// `uart_read`
    UartRead,
    /// `spi_open`
    SpiOpen,
    /// `spi_close`
    SpiClose,
    /// `spi_transfer`
    SpiTransfer,
}

impl Function {
    /// All functions, in counter table order.
    pub const ALL: [Function; FUNCTION_COUNT] = [
        Function::I2cOpen,
        Function::I2cClose,
        Function::I2cWrite,
        Function::I2cRead,
        Function::UartOpen,
        Function::UartClose,
        Function::UartWrite,
        Function::UartRead,
        Function::SpiOpen,
        Function::SpiClose,
        Function::SpiTransfer,
    ];

    /// The canonical name of the function, e.g. `"uart_read"`.
    pub fn name(self) -> &'static str {
        match self {
            Function::I2cOpen => "i2c_open",
            Function::I2cClose => "i2c_close",
            Function::I2cWrite => "i2c_write",
            Function::I2cRead => "i2c_read",
            Function::UartOpen => "uart_open",
            Function::UartClose => "uart_close",
            Function::UartWrite => "uart_write",
            Function::UartRead => "uart_read",
            Function::SpiOpen => "spi_open",
            Function::SpiClose => "spi_close",
            Function::SpiTransfer => "spi_transfer",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing a name that is not an intercepted function.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown function '{0}'")]
pub struct UnknownFunction(pub String);

impl FromStr for Function {
    type Err = UnknownFunction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Function::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| UnknownFunction(s.to_string()))
    }
}

/// Shared table of call counters, one per [`Function`].
///
/// Clones refer to the same table.
#[derive(Clone, Debug, Default)]
pub struct CallCounter {
    counts: Arc<Mutex<[u32; FUNCTION_COUNT]>>,
}

impl CallCounter {
    /// Create a counter table with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter of `function`.
    pub fn record(&self, function: Function) {
        let mut counts = self.counts.lock().unwrap();
        counts[function.index()] = counts[function.index()].saturating_add(1);
    }

    /// Number of recorded calls of `function` since the last reset.
    pub fn count(&self, function: Function) -> u32 {
        self.counts.lock().unwrap()[function.index()]
    }

    /// Check whether the function called `name` was called exactly
    /// `expected` times.
    ///
    /// Unknown names are logged and never match.
    pub fn was_called(&self, name: &str, expected: u32) -> bool {
        match name.parse::<Function>() {
            Ok(function) => self.count(function) == expected,
            Err(e) => {
                log::warn!("{} in call count query", e);
                false
            }
        }
    }

    /// Zero all counters.
    pub fn reset(&self) {
        *self.counts.lock().unwrap() = [0; FUNCTION_COUNT];
    }

    /// Current value of every counter.
    pub fn snapshot(&self) -> Vec<(Function, u32)> {
        let counts = self.counts.lock().unwrap();
        Function::ALL.iter().map(|f| (*f, counts[f.index()])).collect()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("i2c_open", Function::I2cOpen)]
    #[case("uart_read", Function::UartRead)]
    #[case("spi_transfer", Function::SpiTransfer)]
    fn parse_known_names(#[case] name: &str, #[case] function: Function) {
        assert_eq!(name.parse::<Function>(), Ok(function));
        assert_eq!(function.to_string(), name);
    }

    #[rstest]
    #[case("")]
    #[case("I2C_OPEN")]
    #[case("i2c_transfer")]
    fn parse_unknown_names(#[case] name: &str) {
        assert_eq!(
            name.parse::<Function>(),
            Err(UnknownFunction(name.to_string()))
        );
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in Function::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
            for b in &Function::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[test]
    fn counts_per_function() {
        let counter = CallCounter::new();
        counter.record(Function::SpiOpen);
        counter.record(Function::SpiTransfer);
        counter.record(Function::SpiTransfer);

        assert_eq!(counter.count(Function::SpiOpen), 1);
        assert_eq!(counter.count(Function::SpiTransfer), 2);
        assert_eq!(counter.count(Function::SpiClose), 0);
        assert!(counter.was_called("spi_transfer", 2));
        assert!(!counter.was_called("spi_transfer", 1));
    }

    #[test]
    fn unknown_name_never_matches() {
        let counter = CallCounter::new();
        assert!(!counter.was_called("can_send", 0));
    }

    #[test]
    fn clones_share_counts() {
        let counter = CallCounter::new();
        let clone = counter.clone();
        clone.record(Function::UartWrite);
        assert_eq!(counter.count(Function::UartWrite), 1);

        counter.reset();
        assert_eq!(clone.count(Function::UartWrite), 0);
    }

    #[test]
    fn snapshot_lists_every_function() {
        let counter = CallCounter::new();
        counter.record(Function::I2cClose);

        let snapshot = counter.snapshot();
        assert_eq!(snapshot.len(), Function::ALL.len());
        assert!(snapshot.contains(&(Function::I2cClose, 1)));
        assert!(snapshot.contains(&(Function::I2cOpen, 0)));
    }
}
