//! I²C mock implementations.
//!
//! ## Usage
//!
//! ```
//! use comms_mock::bus::{Handle, I2cPort};
//! use comms_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
//!
//! // Configure expectations
//! let expectations = [
//!     I2cTransaction::open("/dev/i2c-1", 0x50, 3),
//!     I2cTransaction::write(0x10, vec![1, 2]),
//!     I2cTransaction::read(0x01, vec![3, 4]),
//!     I2cTransaction::close(),
//! ];
//! let mut i2c = I2cMock::new(&expectations);
//!
//! let fd = i2c.open("/dev/i2c-1", 0x50).unwrap();
//! assert_eq!(fd, Handle(3));
//!
//! // Writing
//! assert_eq!(i2c.write(fd, 0x10, &[1, 2]).unwrap(), 2);
//!
//! // Reading
//! let mut buf = [0; 2];
//! i2c.read(fd, 0x01, &mut buf).unwrap();
//! assert_eq!(buf, [3, 4]);
//!
//! i2c.close(fd).unwrap();
//!
//! // Every intercepted call was counted
//! assert!(i2c.counter().was_called("i2c_write", 1));
//!
//! // Finalise expectations
//! i2c.done();
//! ```
//!
//! ## Transactions
//!
//! - `Open`: expects an `open` of the given bus and address and returns the
//!   injected handle.
//! - `Close`: expects a `close`.
//! - `Write`: expects a `write` of the given command and payload.
//! - `Read`: expects a `read` of the given command and copies the response
//!   into the receive buffer.
//!
//! ## Testing Error Handling
//!
//! Attach an error to a transaction and the intercepted call returns it.
//! The call is still counted and its parameters are still checked.
//!
//! ```
//! use comms_mock::bus::{Handle, I2cPort};
//! use comms_mock::error::BusError;
//! use comms_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
//!
//! let mut i2c = I2cMock::new(&[
//!     I2cTransaction::read(0x01, vec![0, 0]).with_error(BusError::Nack),
//! ]);
//!
//! let mut buf = [0; 2];
//! let err = i2c.read(Handle(1), 0x01, &mut buf).unwrap_err();
//! assert_eq!(err, BusError::Nack);
//!
//! i2c.done();
//! ```
//!
//! ## embedded-hal
//!
//! The mock also implements [`embedded_hal::i2c::I2c`]. The first byte of a
//! bus write is treated as the command byte:
//!
//! - `write(addr, [cmd, data..])` matches a `Write(cmd, data)` transaction,
//! - `write_read(addr, [cmd, data..], buf)` matches a `Read(cmd)`
//!   transaction whose request payload is `data`,
//! - `read(addr, buf)` matches a `Read` created with
//!   [`Transaction::read_raw`],
//! - `write(addr, [])` matches a `Write` created with
//!   [`Transaction::write_raw`].
//!
//! In `transaction`, a `Write` operation directly followed by a `Read` is
//! the usual register read and is handled like `write_read`: it matches a
//! single `Read(cmd)` transaction and counts as one `i2c_read`. Any other
//! operation maps to its own transaction.
//!
//! Use [`Transaction::at`] to also check the slave address.
//!
//! [`embedded_hal::i2c::I2c`]: https://docs.rs/embedded-hal/1/embedded_hal/i2c/trait.I2c.html

use eh1 as embedded_hal;
use embedded_hal::{i2c, i2c::ErrorType};

use crate::{
    bus::{BusResult, Handle, I2cPort},
    common::Generic,
    counter::Function,
    error::BusError,
};

/// I2C transaction modes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Open the bus
    Open,
    /// Close the bus
    Close,
    /// Write a command with payload
    Write,
    /// Issue a command and read the reply
    Read,
}

/// I2C transaction type
///
/// Models one intercepted call and what it returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    expected_mode: Mode,
    expected_bus: Option<String>,
    expected_addr: Option<u16>,
    expected_cmd: Option<u8>,
    expected_data: Vec<u8>,
    response_data: Vec<u8>,
    return_value: Option<i32>,
    /// An optional error return for a transaction.
    ///
    /// This is in addition to the mode to allow validation that the
    /// transaction mode is correct prior to returning the error.
    expected_err: Option<BusError>,
}

impl Transaction {
    fn new(mode: Mode) -> Transaction {
        Transaction {
            expected_mode: mode,
            expected_bus: None,
            expected_addr: None,
            expected_cmd: None,
            expected_data: Vec::new(),
            response_data: Vec::new(),
            return_value: None,
            expected_err: None,
        }
    }

    /// Create an Open transaction returning handle `fd`
    pub fn open(bus: &str, addr: u16, fd: i32) -> Transaction {
        Transaction {
            expected_bus: Some(bus.to_string()),
            expected_addr: Some(addr),
            return_value: Some(fd),
            ..Self::new(Mode::Open)
        }
    }

    /// Create a Close transaction
    pub fn close() -> Transaction {
        Self::new(Mode::Close)
    }

    /// Create a Write transaction
    pub fn write(cmd: u8, expected: Vec<u8>) -> Transaction {
        Transaction {
            expected_cmd: Some(cmd),
            expected_data: expected,
            ..Self::new(Mode::Write)
        }
    }

    /// Create a Read transaction
    pub fn read(cmd: u8, response: Vec<u8>) -> Transaction {
        Transaction {
            expected_cmd: Some(cmd),
            response_data: response,
            ..Self::new(Mode::Read)
        }
    }

    /// Create a Read transaction without a command byte
    ///
    /// Only plain embedded-hal reads match this.
    pub fn read_raw(response: Vec<u8>) -> Transaction {
        Transaction {
            response_data: response,
            ..Self::new(Mode::Read)
        }
    }

    /// Create a Write transaction without a command byte
    ///
    /// Only plain embedded-hal writes match this, including empty ones.
    pub fn write_raw(expected: Vec<u8>) -> Transaction {
        Transaction {
            expected_data: expected,
            ..Self::new(Mode::Write)
        }
    }

    /// Expect the request payload of an embedded-hal `write_read`
    pub fn with_request(mut self, data: Vec<u8>) -> Self {
        self.expected_data = data;
        self
    }

    /// Expect the call to address the slave at `addr`
    ///
    /// Port calls carry no address, so this is only checked by the
    /// embedded-hal implementation.
    pub fn at(mut self, addr: u16) -> Self {
        self.expected_addr = Some(addr);
        self
    }

    /// Override the value returned by the call
    ///
    /// By default `write` returns the payload length and `read` the
    /// response length.
    pub fn returning(mut self, value: i32) -> Self {
        self.return_value = Some(value);
        self
    }

    /// Add an error return to a transaction
    ///
    /// This is used to mock failure behaviours.
    ///
    /// Note: When attaching this to a read transaction, the response in the
    /// expectation will not actually be written to the buffer.
    pub fn with_error(mut self, error: BusError) -> Self {
        self.expected_err = Some(error);
        self
    }

    fn count_or(&self, default: usize) -> usize {
        self.return_value.map_or(default, |v| v.max(0) as usize)
    }
}

/// Mock I2C implementation
///
/// This supports defining and checking expectations to allow
/// automated testing of I2C based drivers. Mismatches between expectations
/// will cause runtime assertions to assist in locating the source of the
/// fault.
pub type Mock = Generic<Transaction>;

impl I2cPort for Mock {
    fn open(&mut self, bus: &str, address: u16) -> BusResult<Handle> {
        let e = self.intercept(Function::I2cOpen);

        assert_eq!(e.expected_mode, Mode::Open, "i2c_open unexpected mode");
        assert_eq!(e.expected_bus.as_deref(), Some(bus), "i2c_open bus mismatch");
        assert_eq!(e.expected_addr, Some(address), "i2c_open address mismatch");

        match e.expected_err {
            Some(err) => Err(err),
            None => Ok(Handle(e.return_value.unwrap_or(0))),
        }
    }

    fn close(&mut self, _handle: Handle) -> BusResult<()> {
        let e = self.intercept(Function::I2cClose);

        assert_eq!(e.expected_mode, Mode::Close, "i2c_close unexpected mode");

        match e.expected_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn write(&mut self, _handle: Handle, cmd: u8, data: &[u8]) -> BusResult<usize> {
        let e = self.intercept(Function::I2cWrite);

        assert_eq!(e.expected_mode, Mode::Write, "i2c_write unexpected mode");
        assert_eq!(e.expected_cmd, Some(cmd), "i2c_write command mismatch");
        assert_eq!(
            e.expected_data.len(),
            data.len(),
            "i2c_write data length mismatch"
        );
        if !data.is_empty() {
            assert_eq!(
                e.expected_data, data,
                "i2c_write data does not match expectation"
            );
        }

        match e.expected_err {
            Some(err) => Err(err),
            None => Ok(e.count_or(data.len())),
        }
    }

    fn read(&mut self, _handle: Handle, cmd: u8, rx: &mut [u8]) -> BusResult<usize> {
        let e = self.intercept(Function::I2cRead);

        assert_eq!(e.expected_mode, Mode::Read, "i2c_read unexpected mode");
        assert_eq!(e.expected_cmd, Some(cmd), "i2c_read command mismatch");
        assert_eq!(
            rx.len(),
            e.response_data.len(),
            "i2c_read mismatched response length"
        );

        match e.expected_err {
            Some(err) => Err(err),
            None => {
                rx.copy_from_slice(&e.response_data);
                Ok(e.count_or(rx.len()))
            }
        }
    }
}

impl ErrorType for Mock {
    type Error = BusError;
}

impl i2c::I2c for Mock {
    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let e = self.intercept(Function::I2cRead);

        assert_eq!(e.expected_mode, Mode::Read, "i2c::read unexpected mode");
        assert_eq!(e.expected_cmd, None, "i2c::read expected a command byte");
        if let Some(addr) = e.expected_addr {
            assert_eq!(addr, u16::from(address), "i2c::read address mismatch");
        }
        assert_eq!(
            buffer.len(),
            e.response_data.len(),
            "i2c::read mismatched response length"
        );

        match e.expected_err {
            Some(err) => Err(err),
            None => {
                buffer.copy_from_slice(&e.response_data);
                Ok(())
            }
        }
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let e = self.intercept(Function::I2cWrite);

        assert_eq!(e.expected_mode, Mode::Write, "i2c::write unexpected mode");
        if let Some(addr) = e.expected_addr {
            assert_eq!(addr, u16::from(address), "i2c::write address mismatch");
        }
        let data = match e.expected_cmd {
            Some(cmd) => {
                assert_eq!(bytes.first(), Some(&cmd), "i2c::write command mismatch");
                &bytes[1..]
            }
            None => bytes,
        };
        assert_eq!(
            e.expected_data, data,
            "i2c::write data does not match expectation"
        );

        match e.expected_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        let (cmd, data) = bytes
            .split_first()
            .expect("i2c::write_read without a command byte");
        let e = self.intercept(Function::I2cRead);

        assert_eq!(
            e.expected_mode,
            Mode::Read,
            "i2c::write_read unexpected mode"
        );
        if let Some(addr) = e.expected_addr {
            assert_eq!(addr, u16::from(address), "i2c::write_read address mismatch");
        }
        assert_eq!(
            e.expected_cmd,
            Some(*cmd),
            "i2c::write_read command mismatch"
        );
        assert_eq!(
            e.expected_data, data,
            "i2c::write_read write data does not match expectation"
        );
        assert_eq!(
            buffer.len(),
            e.response_data.len(),
            "i2c::write_read mismatched response length"
        );

        match e.expected_err {
            Some(err) => Err(err),
            None => {
                buffer.copy_from_slice(&e.response_data);
                Ok(())
            }
        }
    }

    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut ops = operations.iter_mut().peekable();
        while let Some(op) = ops.next() {
            match op {
                i2c::Operation::Write(w)
                    if !w.is_empty() && matches!(ops.peek(), Some(i2c::Operation::Read(_))) =>
                {
                    if let Some(i2c::Operation::Read(r)) = ops.next() {
                        i2c::I2c::write_read(self, address, w, r)?;
                    }
                }
                i2c::Operation::Write(w) => i2c::I2c::write(self, address, w)?,
                i2c::Operation::Read(r) => i2c::I2c::read(self, address, r)?,
            }
        }
        Ok(())
    }
}

#[cfg(feature = "embedded-hal-async")]
impl embedded_hal_async::i2c::I2c for Mock {
    async fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        eh1::i2c::I2c::read(self, address, buffer)
    }

    async fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        eh1::i2c::I2c::write(self, address, bytes)
    }

    async fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        eh1::i2c::I2c::write_read(self, address, bytes, buffer)
    }

    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        eh1::i2c::I2c::transaction(self, address, operations)
    }
}

#[cfg(test)]
mod test {
    use std::time::SystemTime;

    use super::*;
    use crate::counter::CallCounter;

    const FD: Handle = Handle(3);

    mod port {
        use super::*;

        #[test]
        fn open_and_close() {
            let mut i2c = Mock::new(&[
                Transaction::open("/dev/i2c-1", 0x50, 3),
                Transaction::close(),
            ]);

            assert_eq!(i2c.open("/dev/i2c-1", 0x50).unwrap(), FD);
            i2c.close(FD).unwrap();

            assert!(i2c.counter().was_called("i2c_open", 1));
            assert!(i2c.counter().was_called("i2c_close", 1));
            i2c.done();
        }

        #[test]
        fn write() {
            let mut i2c = Mock::new(&[Transaction::write(0x02, vec![10, 12])]);

            assert_eq!(i2c.write(FD, 0x02, &[10, 12]).unwrap(), 2);

            i2c.done();
        }

        #[test]
        fn write_without_payload() {
            let mut i2c = Mock::new(&[Transaction::write(0x03, vec![])]);

            assert_eq!(i2c.write(FD, 0x03, &[]).unwrap(), 0);

            i2c.done();
        }

        #[test]
        fn read() {
            let mut i2c = Mock::new(&[Transaction::read(0x01, vec![1, 2])]);

            let mut buff = [0; 2];
            assert_eq!(i2c.read(FD, 0x01, &mut buff).unwrap(), 2);
            assert_eq!([1, 2], buff);

            i2c.done();
        }

        #[test]
        fn injected_return_value() {
            let mut i2c = Mock::new(&[
                Transaction::write(0x02, vec![1, 2, 3]).returning(1),
                Transaction::read(0x01, vec![9, 9]).returning(0),
            ]);

            assert_eq!(i2c.write(FD, 0x02, &[1, 2, 3]).unwrap(), 1);
            let mut buff = [0; 2];
            assert_eq!(i2c.read(FD, 0x01, &mut buff).unwrap(), 0);
            assert_eq!(buff, [9, 9]);

            i2c.done();
        }

        #[test]
        fn transfer_is_write_then_read() {
            let mut i2c = Mock::new(&[
                Transaction::write(0x02, vec![40]),
                Transaction::read(0x02, vec![0x01, 0x90]),
            ]);

            let mut buff = [0; 2];
            i2c.transfer(FD, 0x02, &[40], &mut buff).unwrap();
            assert_eq!(buff, [0x01, 0x90]);

            i2c.done();
        }

        #[test]
        fn transfer_stops_on_write_error() {
            let mut i2c = Mock::new(&[Transaction::write(0x02, vec![40]).with_error(BusError::Nack)]);

            let mut buff = [0; 2];
            assert_eq!(
                i2c.transfer(FD, 0x02, &[40], &mut buff).unwrap_err(),
                BusError::Nack
            );
            assert!(i2c.counter().was_called("i2c_read", 0));

            i2c.done();
        }

        #[test]
        fn shared_counter_across_mocks() {
            let counter = CallCounter::new();
            let mut a = Mock::with_counter(&[Transaction::close()], counter.clone());
            let mut b = Mock::with_counter(&[Transaction::close()], counter.clone());

            a.close(FD).unwrap();
            b.close(FD).unwrap();
            assert!(counter.was_called("i2c_close", 2));

            a.done();
            b.done();
        }

        #[test]
        fn mismatched_call_is_still_counted() {
            let mut i2c = Mock::new(&[Transaction::write(0x02, vec![1, 2])]);
            let mut driver = i2c.clone();

            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                driver.write(FD, 0x02, &[1, 3])
            }));

            assert!(result.is_err());
            assert!(i2c.counter().was_called("i2c_write", 1));
            assert_eq!(i2c.pending(), 0);
            i2c.done();
        }

        #[test]
        #[should_panic(expected = "i2c_write data does not match expectation")]
        fn write_data_mismatch() {
            let mut i2c = Mock::new(&[Transaction::write(0x02, vec![1, 2])]);

            i2c.write(FD, 0x02, &[1, 3]).unwrap();
        }

        #[test]
        #[should_panic(expected = "i2c_write data length mismatch")]
        fn write_length_mismatch() {
            let mut i2c = Mock::new(&[Transaction::write(0x02, vec![1, 2])]);

            i2c.write(FD, 0x02, &[1]).unwrap();
        }

        #[test]
        #[should_panic(expected = "i2c_read command mismatch")]
        fn read_command_mismatch() {
            let mut i2c = Mock::new(&[Transaction::read(0x01, vec![1])]);

            let mut buff = [0; 1];
            i2c.read(FD, 0x02, &mut buff).unwrap();
        }

        #[test]
        #[should_panic(expected = "i2c_read mismatched response length")]
        fn read_length_mismatch() {
            let mut i2c = Mock::new(&[Transaction::read(0x01, vec![1, 2])]);

            let mut buff = [0; 3];
            i2c.read(FD, 0x01, &mut buff).unwrap();
        }

        #[test]
        #[should_panic(expected = "i2c_open address mismatch")]
        fn open_address_mismatch() {
            let mut i2c = Mock::new(&[Transaction::open("/dev/i2c-1", 0x50, 3)]);

            i2c.open("/dev/i2c-1", 0x51).unwrap();
        }

        #[test]
        #[should_panic(expected = "i2c_write unexpected mode")]
        fn transaction_type_mismatch() {
            let mut i2c = Mock::new(&[Transaction::read(0x01, vec![10, 12])]);

            i2c.write(FD, 0x01, &[10, 12]).unwrap();
        }

        #[test]
        #[should_panic(expected = "no pending expectation for i2c_close call")]
        fn unexpected_call() {
            let mut i2c = Mock::new(&[]);

            i2c.close(FD).unwrap();
        }

        #[test]
        #[should_panic(expected = "Not all expectations consumed")]
        fn unconsumed_expectations() {
            let mut i2c = Mock::new(&[
                Transaction::write(0x02, vec![10, 12]),
                Transaction::write(0x02, vec![10, 12]),
            ]);

            i2c.write(FD, 0x02, &[10, 12]).unwrap();

            i2c.done();
        }

        #[test]
        fn clone_linked_to_original() {
            let mut i2c = Mock::new(&[
                Transaction::read(0x01, vec![1, 2]),
                Transaction::write(0x02, vec![3, 4]),
            ]);

            // Clone mock. The clone should be linked to the same data as the original.
            let mut i2c_clone = i2c.clone();

            let mut buff = [0; 2];
            i2c.read(FD, 0x01, &mut buff).unwrap();
            assert_eq!([1, 2], buff);

            i2c_clone.write(FD, 0x02, &[3, 4]).unwrap();

            // Randomly call `.done()` on the original mock, or on the clone.
            // Use "system time % 2" as poor man's `rand()`.
            let now = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap();
            if now.as_millis() % 2 == 0 {
                i2c.done();
            } else {
                i2c_clone.done();
            }
        }

        mod with_error {
            use super::*;

            #[test]
            fn open() {
                let mut i2c = Mock::new(&[Transaction::open("/dev/i2c-7", 0x20, 0)
                    .with_error(BusError::DeviceNotFound("/dev/i2c-7".into()))]);

                assert!(matches!(
                    i2c.open("/dev/i2c-7", 0x20),
                    Err(BusError::DeviceNotFound(_))
                ));
                assert!(i2c.counter().was_called("i2c_open", 1));
                i2c.done();
            }

            #[test]
            fn read_leaves_buffer_untouched() {
                let mut i2c =
                    Mock::new(&[Transaction::read(0x01, vec![10, 12]).with_error(BusError::Timeout)]);

                let mut buf = [0; 2];
                let err = i2c.read(FD, 0x01, &mut buf).unwrap_err();
                assert_eq!(err, BusError::Timeout);
                assert_eq!(buf, [0, 0]);
                i2c.done();
            }

            /// The transaction bytes should still be validated.
            #[test]
            #[should_panic(expected = "i2c_write data does not match expectation")]
            fn write_wrong_data() {
                let mut i2c =
                    Mock::new(&[Transaction::write(0x02, vec![10, 12]).with_error(BusError::Nack)]);
                let _ = i2c.write(FD, 0x02, &[10, 13]);
            }

            /// The transaction mode should still be validated.
            #[test]
            #[should_panic(expected = "i2c_read unexpected mode")]
            fn write_wrong_mode() {
                let mut i2c =
                    Mock::new(&[Transaction::write(0x02, vec![10, 12]).with_error(BusError::Nack)]);
                let mut buf = [0; 2];
                let _ = i2c.read(FD, 0x02, &mut buf);
            }
        }
    }

    mod embedded_hal_impl {
        use eh1::i2c::{I2c, Operation};

        use super::{BusError, Mock, Transaction};

        #[test]
        fn write() {
            let mut i2c = Mock::new(&[Transaction::write(0x10, vec![1, 2]).at(0x48)]);

            i2c.write(0x48, &[0x10, 1, 2]).unwrap();

            assert!(i2c.counter().was_called("i2c_write", 1));
            i2c.done();
        }

        #[test]
        fn write_read() {
            let mut i2c = Mock::new(&[Transaction::read(0x01, vec![3, 4])]);

            let mut buff = [0; 2];
            i2c.write_read(0x48, &[0x01], &mut buff).unwrap();
            assert_eq!(buff, [3, 4]);

            i2c.done();
        }

        #[test]
        fn write_read_with_request() {
            let mut i2c = Mock::new(&[Transaction::read(0x01, vec![3]).with_request(vec![0xaa])]);

            let mut buff = [0; 1];
            i2c.write_read(0x48, &[0x01, 0xaa], &mut buff).unwrap();
            assert_eq!(buff, [3]);

            i2c.done();
        }

        #[test]
        fn read_raw() {
            let mut i2c = Mock::new(&[Transaction::read_raw(vec![5, 6])]);

            let mut buff = [0; 2];
            i2c.read(0x48, &mut buff).unwrap();
            assert_eq!(buff, [5, 6]);

            i2c.done();
        }

        #[test]
        fn transaction_register_read() {
            let mut i2c = Mock::new(&[Transaction::read(0x10, vec![3, 4]).with_request(vec![1, 2])]);

            let mut v = [0u8; 2];
            i2c.transaction(
                0xaa,
                &mut [
                    Operation::Write(&[0x10, 1, 2]),
                    Operation::Read(&mut v),
                ],
            )
            .unwrap();
            assert_eq!(v, [3, 4]);

            let counter = i2c.counter();
            assert!(counter.was_called("i2c_read", 1));
            assert!(counter.was_called("i2c_write", 0));
            i2c.done();
        }

        #[test]
        fn transaction_separate_operations() {
            let mut i2c = Mock::new(&[
                Transaction::read_raw(vec![3, 4]),
                Transaction::write(0x10, vec![1, 2]),
                Transaction::write_raw(vec![]),
            ]);

            let mut v = [0u8; 2];
            i2c.transaction(
                0xaa,
                &mut [
                    Operation::Read(&mut v),
                    Operation::Write(&[0x10, 1, 2]),
                    Operation::Write(&[]),
                ],
            )
            .unwrap();
            assert_eq!(v, [3, 4]);

            let counter = i2c.counter();
            assert!(counter.was_called("i2c_read", 1));
            assert!(counter.was_called("i2c_write", 2));
            i2c.done();
        }

        #[test]
        fn error_is_returned() {
            let mut i2c = Mock::new(&[Transaction::write(0x10, vec![]).with_error(BusError::Nack)]);

            let err = i2c.write(0x48, &[0x10]).unwrap_err();
            assert_eq!(err, BusError::Nack);

            i2c.done();
        }

        #[test]
        #[should_panic(expected = "i2c::write address mismatch")]
        fn address_mismatch() {
            let mut i2c = Mock::new(&[Transaction::write(0x10, vec![]).at(0x48)]);

            i2c.write(0x49, &[0x10]).unwrap();
        }

        #[test]
        #[should_panic(expected = "i2c::read expected a command byte")]
        fn plain_read_against_command_read() {
            let mut i2c = Mock::new(&[Transaction::read(0x01, vec![1])]);

            let mut buff = [0; 1];
            i2c.read(0x48, &mut buff).unwrap();
        }

        #[test]
        fn empty_write() {
            let mut i2c = Mock::new(&[Transaction::write_raw(vec![]).at(0x48)]);

            i2c.write(0x48, &[]).unwrap();

            assert!(i2c.counter().was_called("i2c_write", 1));
            i2c.done();
        }

        #[test]
        #[should_panic(expected = "i2c::write command mismatch")]
        fn empty_write_against_command_write() {
            let mut i2c = Mock::new(&[Transaction::write(0x10, vec![])]);

            i2c.write(0x48, &[]).unwrap();
        }
    }

    #[cfg(feature = "embedded-hal-async")]
    mod embedded_hal_async_impl {
        use embedded_hal_async::i2c::I2c;

        use super::{Mock, Transaction};

        #[tokio::test]
        async fn write_read() {
            let mut i2c = Mock::new(&[
                Transaction::write(0x10, vec![1]),
                Transaction::read(0x01, vec![2]),
            ]);

            i2c.write(0x48, &[0x10, 1]).await.unwrap();
            let mut buff = [0; 1];
            i2c.write_read(0x48, &[0x01], &mut buff).await.unwrap();
            assert_eq!(buff, [2]);

            i2c.done();
        }
    }
}
