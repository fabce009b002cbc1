//! Logger setup for test binaries and the scaffold tool.
//!
//! The crate itself only emits records through the `log` facade. Call
//! [`init`] once, early in a test binary, to see them:
//!
//! - `RUST_LOG` selects the level (`error`, `warn`, `info`, `debug`,
//!   `trace`; anything else means `info`),
//! - `RUST_LOGGER` selects the sink: `term` (default) writes to the
//!   terminal, `test` writes through the print macros so the Cargo test
//!   harness captures the output per test.

use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode, TestLogger};

use crate::error::HarnessError;

/// Where log records go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sink {
    /// Standard error, colored when attached to a terminal
    Term,
    /// Captured by the Cargo test harness
    Test,
}

/// Parse a `RUST_LOG` style level. Unknown values mean `Info`.
pub fn parse_level(value: &str) -> LevelFilter {
    match value.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Parse a `RUST_LOGGER` value. Unknown values mean `Term`.
pub fn parse_sink(value: &str) -> Sink {
    match value {
        "test" => Sink::Test,
        _ => Sink::Term,
    }
}

/// Install the global logger as configured by the environment.
///
/// Fails if a logger is already installed.
pub fn init() -> Result<(), HarnessError> {
    let level = std::env::var("RUST_LOG")
        .map(|v| parse_level(&v))
        .unwrap_or(LevelFilter::Info);
    let sink = std::env::var("RUST_LOGGER")
        .map(|v| parse_sink(&v))
        .unwrap_or(Sink::Term);
    init_with(sink, level)
}

/// Install the global logger with an explicit sink and level.
pub fn init_with(sink: Sink, level: LevelFilter) -> Result<(), HarnessError> {
    match sink {
        Sink::Term => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )?,
        Sink::Test => TestLogger::init(level, Config::default())?,
    }
    Ok(())
}
