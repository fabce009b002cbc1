//! Bus port traits.
//!
//! These are the hardware-facing calls a communication driver makes. A
//! driver that is generic over these traits can be handed a real bus in
//! production and one of the mocks in [`i2c`](crate::i2c),
//! [`uart`](crate::uart) or [`spi`](crate::spi) under test.

use std::{fmt, time::Duration};

use crate::error::BusError;

/// Result type of every port operation.
pub type BusResult<T> = Result<T, BusError>;

/// Descriptor of an opened bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(pub i32);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fd {}", self.0)
    }
}

/// SPI clock polarity and phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpiMode {
    /// CPOL = 0, CPHA = 0
    #[default]
    Mode0,
    /// CPOL = 0, CPHA = 1
    Mode1,
    /// CPOL = 1, CPHA = 0
    Mode2,
    /// CPOL = 1, CPHA = 1
    Mode3,
}

/// Command oriented I²C access (SMBus style: a command byte followed by
/// payload).
pub trait I2cPort {
    /// Open the bus device `bus` (e.g. `"/dev/i2c-1"`) for the slave at
    /// `address`.
    fn open(&mut self, bus: &str, address: u16) -> BusResult<Handle>;

    /// Close a previously opened bus.
    fn close(&mut self, handle: Handle) -> BusResult<()>;

    /// Write `cmd` followed by `data`. Returns the number of bytes written.
    fn write(&mut self, handle: Handle, cmd: u8, data: &[u8]) -> BusResult<usize>;

    /// Issue `cmd` and read the reply into `rx`. Returns the number of
    /// bytes read.
    fn read(&mut self, handle: Handle, cmd: u8, rx: &mut [u8]) -> BusResult<usize>;

    /// Write a command with payload, then read the reply.
    fn transfer(
        &mut self,
        handle: Handle,
        cmd: u8,
        data: &[u8],
        rx: &mut [u8],
    ) -> BusResult<usize> {
        self.write(handle, cmd, data)?;
        self.read(handle, cmd, rx)
    }
}

/// Byte stream access to a serial port.
pub trait UartPort {
    /// Open the serial device at `baud_rate`.
    fn open(&mut self, device: &str, baud_rate: u32) -> BusResult<Handle>;

    /// Close a previously opened port.
    fn close(&mut self, handle: Handle) -> BusResult<()>;

    /// Write `data`. Returns the number of bytes written.
    fn write(&mut self, handle: Handle, data: &[u8]) -> BusResult<usize>;

    /// Read up to `buf.len()` bytes, waiting at most `timeout`. Returns the
    /// number of bytes read.
    fn read(&mut self, handle: Handle, buf: &mut [u8], timeout: Duration) -> BusResult<usize>;
}

/// Full duplex SPI access.
pub trait SpiPort {
    /// Open the SPI device with the given mode and clock speed.
    fn open(&mut self, device: &str, mode: SpiMode, speed_hz: u32) -> BusResult<Handle>;

    /// Close a previously opened device.
    fn close(&mut self, handle: Handle) -> BusResult<()>;

    /// Clock out `tx` while clocking in `rx`. Returns the number of bytes
    /// transferred.
    fn transfer(&mut self, handle: Handle, tx: &[u8], rx: &mut [u8]) -> BusResult<usize>;
}
