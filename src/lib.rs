//! Mocked I2C, UART and SPI buses for host-side driver tests.
//!
//! Drivers for sensors and boards usually talk to their hardware through a
//! handful of bus calls: open a device, write a command, read a response,
//! close it again. This crate lets such drivers be tested in CI without
//! any hardware attached.
//!
//! ## Usage
//!
//! Write the driver against the port traits in [`bus`] ([`I2cPort`],
//! [`UartPort`], [`SpiPort`]) instead of a concrete bus implementation.
//! In tests, pass a mock instead of the real port:
//!
//! 1. Define the expectations: a list of transactions (e.g. a read or write
//!    operation) that you expect the driver under test to invoke on the bus
//! 2. Instantiate the mock with the expectations
//! 3. Run the code under test
//! 4. At the end of the test, call `.done()` on the mock to ensure that all
//!    expectations were met
//!
//! Every intercepted call is also recorded in a [`CallCounter`], so tests can
//! assert how often each bus function was invoked.
//!
//! ```
//! use comms_mock::bus::{Handle, I2cPort};
//! use comms_mock::i2c::{Mock, Transaction};
//!
//! fn read_temperature<P: I2cPort>(port: &mut P, fd: Handle) -> Result<i16, comms_mock::BusError> {
//!     let mut raw = [0; 2];
//!     port.read(fd, 0x00, &mut raw)?;
//!     Ok(i16::from_be_bytes(raw) >> 4)
//! }
//!
//! let mut i2c = Mock::new(&[Transaction::read(0x00, vec![0x19, 0x00])]);
//! assert_eq!(read_temperature(&mut i2c, Handle(3)), Ok(400));
//! assert!(i2c.counter().was_called("i2c_read", 1));
//! i2c.done();
//! ```
//!
//! Mocks contain an `Arc` internally and can be cloned freely. This means
//! you can clone a mock before passing it to the driver, and then call
//! `.done()` on the second instance without having to reclaim the first one
//! from the driver.
//!
//! The mocks also implement the embedded-hal 1.0 traits (`I2c`, `SpiBus`)
//! and the embedded-io `Read` and `Write` traits, so drivers written against
//! those can be tested the same way.
//!
//! Beyond the mocks, [`runner`] runs suites of tests with setup and teardown
//! hooks and [`template`] generates test suite skeletons for new modules.
//!
//! ## Cargo Features
//!
//! - `embedded-hal-async`: Implement the embedded-hal-async and
//!   embedded-io-async traits for the mocks
#![cfg_attr(docsrs, feature(doc_cfg), feature(doc_auto_cfg))]
#![deny(missing_docs)]

pub mod bus;
pub mod common;
pub mod counter;
pub mod error;
pub mod i2c;
pub mod logging;
pub mod runner;
pub mod spi;
pub mod template;
pub mod uart;

pub use crate::{
    bus::{Handle, I2cPort, SpiMode, SpiPort, UartPort},
    counter::{CallCounter, Function},
    error::{BusError, HarnessError},
};
