//! SPI mock implementations.
//!
//! This mock supports defining and checking expectations to allow
//! automated testing of SPI based drivers. Mismatches between expected and
//! real SPI transactions will cause runtime assertions to assist with locating
//! faults.
//!
//! ## Usage
//!
//! ```
//! use comms_mock::bus::{SpiMode, SpiPort};
//! use comms_mock::spi::{Mock as SpiMock, Transaction as SpiTransaction};
//!
//! // Configure expectations
//! let expectations = [
//!     SpiTransaction::open("/dev/spidev0.0", SpiMode::Mode0, 1_000_000, 5),
//!     SpiTransaction::transfer(vec![0x9f, 0, 0], vec![0, 0xef, 0x40]),
//!     SpiTransaction::close(),
//! ];
//! let mut spi = SpiMock::new(&expectations);
//!
//! let fd = spi.open("/dev/spidev0.0", SpiMode::Mode0, 1_000_000).unwrap();
//!
//! let mut rx = [0; 3];
//! spi.transfer(fd, &[0x9f, 0, 0], &mut rx).unwrap();
//! assert_eq!(rx, [0, 0xef, 0x40]);
//!
//! spi.close(fd).unwrap();
//!
//! // Finalize expectations
//! spi.done();
//! ```
//!
//! ## embedded-hal
//!
//! The mock implements [`embedded_hal::spi::SpiBus`]. Every data movement
//! (`read`, `write`, `transfer`, `transfer_in_place`) is one intercepted
//! `spi_transfer` and matches a `Transfer` transaction:
//!
//! - `write` checks the transmitted bytes and discards the response,
//! - `read` transmits nothing the mock checks and receives the response,
//! - `transfer` and `transfer_in_place` do both.
//!
//! `flush` matches a `Flush` transaction and is not counted.
//!
//! [`embedded_hal::spi::SpiBus`]: https://docs.rs/embedded-hal/1/embedded_hal/spi/trait.SpiBus.html

use eh1 as embedded_hal;
use embedded_hal::spi::{self, SpiBus};

use crate::{
    bus::{BusResult, Handle, SpiMode, SpiPort},
    common::Generic,
    counter::Function,
    error::BusError,
};

/// SPI Transaction mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Open the device
    Open,
    /// Close the device
    Close,
    /// Full duplex transfer
    Transfer,
    /// Flush transaction
    Flush,
}

/// SPI transaction type
///
/// Models an SPI open, close or transfer (with response)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    expected_mode: Mode,
    expected_device: Option<String>,
    expected_spi_mode: Option<SpiMode>,
    expected_speed: Option<u32>,
    expected_data: Option<Vec<u8>>,
    response: Vec<u8>,
    return_value: Option<i32>,
    err: Option<BusError>,
}

impl Transaction {
    fn new(mode: Mode) -> Transaction {
        Transaction {
            expected_mode: mode,
            expected_device: None,
            expected_spi_mode: None,
            expected_speed: None,
            expected_data: None,
            response: Vec::new(),
            return_value: None,
            err: None,
        }
    }

    /// Create an open transaction returning handle `fd`
    pub fn open(device: &str, mode: SpiMode, speed_hz: u32, fd: i32) -> Transaction {
        Transaction {
            expected_device: Some(device.to_string()),
            expected_spi_mode: Some(mode),
            expected_speed: Some(speed_hz),
            return_value: Some(fd),
            ..Self::new(Mode::Open)
        }
    }

    /// Create a close transaction
    pub fn close() -> Transaction {
        Self::new(Mode::Close)
    }

    /// Create a transfer transaction
    ///
    /// `expected` is the data the driver must clock out, `response` the data
    /// clocked in.
    pub fn transfer(expected: Vec<u8>, response: Vec<u8>) -> Transaction {
        Transaction {
            expected_data: Some(expected),
            response,
            ..Self::new(Mode::Transfer)
        }
    }

    /// Create a transfer transaction that does not check transmitted data
    pub fn read(response: Vec<u8>) -> Transaction {
        Transaction {
            response,
            ..Self::new(Mode::Transfer)
        }
    }

    /// Create a flush transaction
    pub fn flush() -> Transaction {
        Self::new(Mode::Flush)
    }

    /// Override the value returned by a port transfer
    pub fn returning(mut self, value: i32) -> Self {
        self.return_value = Some(value);
        self
    }

    /// Add an error return to a transaction
    ///
    /// This is used to mock hardware failures.
    pub fn with_error(self, error: BusError) -> Self {
        Self {
            err: Some(error),
            ..self
        }
    }
}

/// Mock SPI implementation
///
/// This supports defining and checking expectations to allow
/// automated testing of SPI based drivers. Mismatches between expected and
/// real SPI transactions will cause runtime assertions to assist with locating
/// faults.
///
/// See the usage section in the module level docs for an example.
pub type Mock = Generic<Transaction>;

impl Mock {
    /// One intercepted transfer. `tx` is `None` when the caller transmits
    /// filler bytes, `rx` is `None` when the caller discards the response.
    fn do_transfer(&mut self, tx: Option<&[u8]>, rx: Option<&mut [u8]>) -> BusResult<usize> {
        let w = self.intercept(Function::SpiTransfer);

        assert_eq!(
            w.expected_mode,
            Mode::Transfer,
            "spi_transfer unexpected mode"
        );
        if let (Some(expected), Some(tx)) = (&w.expected_data, tx) {
            assert_eq!(
                expected.len(),
                tx.len(),
                "spi_transfer length mismatch"
            );
            if !tx.is_empty() {
                assert_eq!(
                    expected.as_slice(),
                    tx,
                    "spi_transfer data does not match expectation"
                );
            }
        }

        if let Some(err) = w.err {
            return Err(err);
        }

        let len = match rx {
            Some(rx) => {
                assert_eq!(
                    rx.len(),
                    w.response.len(),
                    "spi_transfer mismatched response length"
                );
                rx.copy_from_slice(&w.response);
                rx.len()
            }
            None => tx.map_or(0, <[u8]>::len),
        };
        Ok(w.return_value.map_or(len, |v| v.max(0) as usize))
    }
}

impl SpiPort for Mock {
    fn open(&mut self, device: &str, mode: SpiMode, speed_hz: u32) -> BusResult<Handle> {
        let w = self.intercept(Function::SpiOpen);

        assert_eq!(w.expected_mode, Mode::Open, "spi_open unexpected mode");
        assert_eq!(
            w.expected_device.as_deref(),
            Some(device),
            "spi_open device mismatch"
        );
        assert_eq!(w.expected_spi_mode, Some(mode), "spi_open mode mismatch");
        assert_eq!(w.expected_speed, Some(speed_hz), "spi_open speed mismatch");

        match w.err {
            Some(err) => Err(err),
            None => Ok(Handle(w.return_value.unwrap_or(0))),
        }
    }

    fn close(&mut self, _handle: Handle) -> BusResult<()> {
        let w = self.intercept(Function::SpiClose);

        assert_eq!(w.expected_mode, Mode::Close, "spi_close unexpected mode");

        match w.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn transfer(&mut self, _handle: Handle, tx: &[u8], rx: &mut [u8]) -> BusResult<usize> {
        self.do_transfer(Some(tx), Some(rx))
    }
}

impl spi::ErrorType for Mock {
    type Error = BusError;
}

impl SpiBus<u8> for Mock {
    /// spi::Read implementation for Mock
    ///
    /// This will cause an assertion if the read call does not match the next expectation
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.do_transfer(None, Some(buffer)).map(drop)
    }

    /// spi::Write implementation for Mock
    ///
    /// This will cause an assertion if the write call does not match the next expectation
    fn write(&mut self, buffer: &[u8]) -> Result<(), Self::Error> {
        self.do_transfer(Some(buffer), None).map(drop)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.do_transfer(Some(write), Some(read)).map(drop)
    }

    /// spi::TransferInplace implementation for Mock
    ///
    /// This writes the provided response to the buffer and will cause an assertion if the written data does not match the next expectation
    fn transfer_in_place(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let tx = buffer.to_vec();
        self.do_transfer(Some(&tx), Some(buffer)).map(drop)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        let w = self
            .next()
            .expect("no pending expectation for spi flush call");
        assert_eq!(w.expected_mode, Mode::Flush, "spi flush unexpected mode");
        match w.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(feature = "embedded-hal-async")]
impl embedded_hal_async::spi::SpiBus<u8> for Mock {
    async fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        SpiBus::<u8>::read(self, words)
    }

    async fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        SpiBus::<u8>::write(self, words)
    }

    async fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        SpiBus::<u8>::transfer(self, read, write)
    }

    async fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        SpiBus::<u8>::transfer_in_place(self, words)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        SpiBus::<u8>::flush(self)
    }
}
