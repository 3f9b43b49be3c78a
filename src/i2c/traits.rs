// Licensed under the Apache-2.0 license

//! # I2C Bus Primitive Interface
//!
//! The transaction engine is built strictly from the operations in this
//! module. They are provided by the real-time I/O subsystem of the target
//! (or by the `sim` feature's `SimBus` on the host) and are consumed
//! here only through their contract:
//!
//! ```text
//! start ─┬─ write(address) ─ write(data)* ───────────────────────────── stop
//!        └─ write(address) ─ write(sub) ─ restart ─ write(address|1) ─ read* ─ stop
//! ```
//!
//! Electrical timing (clock stretching, rise/fall times) is owned entirely by
//! the implementation.

use crate::i2c::common::BusNo;

/// Primitive bus operations of one control context.
///
/// Every operation is scoped to a bus number, synchronous and blocking. The
/// engine neither retries nor reinterprets them beyond ack/nack handling.
///
/// # Examples
///
/// ```rust
/// use nrt_i2c::i2c::{BusNo, I2cPrimitives};
///
/// fn probe<P: I2cPrimitives>(bus: &mut P, busno: BusNo, address: u8) -> Result<bool, P::Error> {
///     bus.start(busno)?;
///     let ack = bus.write(busno, address)?;
///     bus.stop(busno)?;
///     Ok(ack)
/// }
/// ```
pub trait I2cPrimitives {
    /// Fault type of the underlying subsystem
    type Error: embedded_hal::i2c::Error + core::fmt::Debug;

    /// Assert a start condition.
    fn start(&mut self, busno: BusNo) -> Result<(), Self::Error>;

    /// Assert a repeated start without an intervening stop.
    fn restart(&mut self, busno: BusNo) -> Result<(), Self::Error>;

    /// Assert a stop condition.
    ///
    /// Always safe to call; issuing it is sufficient to release the bus.
    fn stop(&mut self, busno: BusNo) -> Result<(), Self::Error>;

    /// Clock out one byte and sample the acknowledge bit.
    ///
    /// Returns `true` when the addressed device pulled SDA low (ACK).
    fn write(&mut self, busno: BusNo, byte: u8) -> Result<bool, Self::Error>;

    /// Clock in one byte.
    ///
    /// With `ack` set the master acknowledges the byte; otherwise it NACKs,
    /// which ends a read burst.
    fn read(&mut self, busno: BusNo, ack: bool) -> Result<u8, Self::Error>;

    /// Program a bus switch with a channel mask.
    ///
    /// This is a complete transaction of its own: `address` is the 7-bit
    /// switch address and `mask` is written as the single data byte.
    fn switch_select(&mut self, busno: BusNo, address: u8, mask: u8) -> Result<(), Self::Error>;
}

impl<T: I2cPrimitives + ?Sized> I2cPrimitives for &mut T {
    type Error = T::Error;

    fn start(&mut self, busno: BusNo) -> Result<(), Self::Error> {
        T::start(self, busno)
    }

    fn restart(&mut self, busno: BusNo) -> Result<(), Self::Error> {
        T::restart(self, busno)
    }

    fn stop(&mut self, busno: BusNo) -> Result<(), Self::Error> {
        T::stop(self, busno)
    }

    fn write(&mut self, busno: BusNo, byte: u8) -> Result<bool, Self::Error> {
        T::write(self, busno, byte)
    }

    fn read(&mut self, busno: BusNo, ack: bool) -> Result<u8, Self::Error> {
        T::read(self, busno, ack)
    }

    fn switch_select(&mut self, busno: BusNo, address: u8, mask: u8) -> Result<(), Self::Error> {
        T::switch_select(self, busno, address, mask)
    }
}
