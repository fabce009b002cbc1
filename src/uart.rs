//! UART mock implementations.
//!
//! You can set expectations for opening, writing to, reading from and
//! closing a serial port. Reads copy as much of the injected response as fits
//! into the caller's buffer and return the number of bytes copied, the way a
//! real port returns a short read.
//!
//! ## Usage
//!
//! ```
//! use std::time::Duration;
//!
//! use comms_mock::bus::UartPort;
//! use comms_mock::uart::{Mock as UartMock, Transaction as UartTransaction};
//!
//! let timeout = Duration::from_millis(100);
//! let expectations = [
//!     UartTransaction::open("/dev/ttyUSB0", 115_200, 4),
//!     UartTransaction::write(b"AT\r".to_vec()),
//!     UartTransaction::read(16, timeout, b"OK\r\n".to_vec()),
//!     UartTransaction::close(),
//! ];
//! let mut uart = UartMock::new(&expectations);
//!
//! let fd = uart.open("/dev/ttyUSB0", 115_200).unwrap();
//! uart.write(fd, b"AT\r").unwrap();
//!
//! // Short read: only four bytes were available
//! let mut buf = [0; 16];
//! assert_eq!(uart.read(fd, &mut buf, timeout).unwrap(), 4);
//! assert_eq!(&buf[..4], b"OK\r\n");
//!
//! uart.close(fd).unwrap();
//! uart.done();
//! ```
//!
//! ## embedded-io
//!
//! The mock implements [`embedded_io::Read`] and [`embedded_io::Write`] as
//! well. Those calls carry no timeout, so it is not checked.

use std::time::Duration;

use embedded_io::{ErrorType, Read, Write};

use crate::{
    bus::{BusResult, Handle, UartPort},
    common::Generic,
    counter::Function,
    error::BusError,
};

/// UART transaction modes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Open the port
    Open,
    /// Close the port
    Close,
    /// Write bytes
    Write,
    /// Read bytes
    Read,
    /// Flush the transmit buffer (embedded-io only, not counted)
    Flush,
}

/// UART transaction type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    expected_mode: Mode,
    expected_device: Option<String>,
    expected_baud: Option<u32>,
    expected_data: Vec<u8>,
    expected_len: Option<usize>,
    expected_timeout: Option<Duration>,
    response: Vec<u8>,
    return_value: Option<i32>,
    expected_err: Option<BusError>,
}

impl Transaction {
    fn new(mode: Mode) -> Transaction {
        Transaction {
            expected_mode: mode,
            expected_device: None,
            expected_baud: None,
            expected_data: Vec::new(),
            expected_len: None,
            expected_timeout: None,
            response: Vec::new(),
            return_value: None,
            expected_err: None,
        }
    }

    /// Create an open transaction returning handle `fd`
    pub fn open(device: &str, baud_rate: u32, fd: i32) -> Transaction {
        Transaction {
            expected_device: Some(device.to_string()),
            expected_baud: Some(baud_rate),
            return_value: Some(fd),
            ..Self::new(Mode::Open)
        }
    }

    /// Create a close transaction
    pub fn close() -> Transaction {
        Self::new(Mode::Close)
    }

    /// Create a write transaction
    pub fn write(expected_data: Vec<u8>) -> Transaction {
        Transaction {
            expected_data,
            ..Self::new(Mode::Write)
        }
    }

    /// Create a read transaction
    ///
    /// `len` is the buffer length the caller is expected to pass and
    /// `timeout` the expected timeout.
    pub fn read(len: usize, timeout: Duration, response: Vec<u8>) -> Transaction {
        Transaction {
            expected_len: Some(len),
            expected_timeout: Some(timeout),
            response,
            ..Self::new(Mode::Read)
        }
    }

    /// Create a read transaction that accepts any buffer length and timeout
    pub fn read_any(response: Vec<u8>) -> Transaction {
        Transaction {
            response,
            ..Self::new(Mode::Read)
        }
    }

    /// Create a flush transaction
    pub fn flush() -> Transaction {
        Self::new(Mode::Flush)
    }

    /// Override the value returned by a write
    pub fn returning(mut self, value: i32) -> Self {
        self.return_value = Some(value);
        self
    }

    /// Add an error return to a transaction
    ///
    /// This is used to mock failure behaviors.
    ///
    /// Note: When attaching this to a read transaction, the response in the
    /// expectation will not actually be written to the buffer.
    pub fn with_error(mut self, error: BusError) -> Self {
        self.expected_err = Some(error);
        self
    }
}

/// Mock UART implementation
pub type Mock = Generic<Transaction>;

impl Mock {
    fn do_write(&mut self, data: &[u8]) -> BusResult<usize> {
        let t = self.intercept(Function::UartWrite);

        assert_eq!(t.expected_mode, Mode::Write, "uart_write unexpected mode");
        assert_eq!(
            t.expected_data.len(),
            data.len(),
            "uart_write data length mismatch"
        );
        if !data.is_empty() {
            assert_eq!(
                t.expected_data, data,
                "uart_write data does not match expectation"
            );
        }

        match t.expected_err {
            Some(err) => Err(err),
            None => Ok(t.return_value.map_or(data.len(), |v| v.max(0) as usize)),
        }
    }

    fn do_read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> BusResult<usize> {
        let t = self.intercept(Function::UartRead);

        assert_eq!(t.expected_mode, Mode::Read, "uart_read unexpected mode");
        if let Some(len) = t.expected_len {
            assert_eq!(len, buf.len(), "uart_read length mismatch");
        }
        if let (Some(expected), Some(actual)) = (t.expected_timeout, timeout) {
            assert_eq!(expected, actual, "uart_read timeout mismatch");
        }

        match t.expected_err {
            Some(err) => Err(err),
            None => {
                let n = buf.len().min(t.response.len());
                buf[..n].copy_from_slice(&t.response[..n]);
                Ok(n)
            }
        }
    }
}

impl UartPort for Mock {
    fn open(&mut self, device: &str, baud_rate: u32) -> BusResult<Handle> {
        let t = self.intercept(Function::UartOpen);

        assert_eq!(t.expected_mode, Mode::Open, "uart_open unexpected mode");
        assert_eq!(
            t.expected_device.as_deref(),
            Some(device),
            "uart_open device mismatch"
        );
        assert_eq!(
            t.expected_baud,
            Some(baud_rate),
            "uart_open baud rate mismatch"
        );

        match t.expected_err {
            Some(err) => Err(err),
            None => Ok(Handle(t.return_value.unwrap_or(0))),
        }
    }

    fn close(&mut self, _handle: Handle) -> BusResult<()> {
        let t = self.intercept(Function::UartClose);

        assert_eq!(t.expected_mode, Mode::Close, "uart_close unexpected mode");

        match t.expected_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn write(&mut self, _handle: Handle, data: &[u8]) -> BusResult<usize> {
        self.do_write(data)
    }

    fn read(&mut self, _handle: Handle, buf: &mut [u8], timeout: Duration) -> BusResult<usize> {
        self.do_read(buf, Some(timeout))
    }
}

impl ErrorType for Mock {
    type Error = BusError;
}

impl Write for Mock {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.do_write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        let t = self.next().expect("no pending expectation for uart flush call");
        assert_eq!(t.expected_mode, Mode::Flush, "uart flush unexpected mode");

        match t.expected_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Read for Mock {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.do_read(buf, None)
    }
}

#[cfg(feature = "embedded-hal-async")]
impl embedded_io_async::Write for Mock {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Write::write(self, buf)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(self)
    }
}

#[cfg(feature = "embedded-hal-async")]
impl embedded_io_async::Read for Mock {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Read::read(self, buf)
    }
}
