// Licensed under the Apache-2.0 license

//! I2C transaction engine.
//!
//! [`I2cController`] turns the primitive bus operations of a control context
//! into bracketed multi-byte transactions with uniform error semantics:
//!
//! - every transaction that started is stopped exactly once, on success, on a
//!   missing acknowledge and on a primitive fault
//! - a missing acknowledge fails the transaction with the [`Phase`] it
//!   happened in, except in [`poll`](I2cController::poll), which is a probe
//! - nothing is retried; callers retry whole transactions
//!
//! The controller is shared by reference between the chip drivers. It is
//! single-threaded; transactions never interleave because each one holds the
//! primitives exclusively until its stop condition.

use crate::i2c::common::{BusNo, DeviceAddress, Phase};
use crate::i2c::error::Error;
use crate::i2c::traits::I2cPrimitives;
use crate::i2c::transaction::Transaction;
use core::cell::{RefCell, RefMut};

/// First and last 7-bit addresses probed by [`I2cController::scan`]
pub const SCAN_RANGE: core::ops::RangeInclusive<u8> = 0x08..=0x77;

/// Capacity of a scan result
pub const SCAN_CAPACITY: usize = 112;

pub struct I2cController<P: I2cPrimitives> {
    hardware: RefCell<P>,
}

impl<P: I2cPrimitives> I2cController<P> {
    #[must_use]
    pub fn new(hardware: P) -> Self {
        Self {
            hardware: RefCell::new(hardware),
        }
    }

    /// Give back the primitives.
    pub fn release(self) -> P {
        self.hardware.into_inner()
    }

    /// Direct access to the primitives while no driver borrows the controller.
    pub fn hardware_mut(&mut self) -> &mut P {
        self.hardware.get_mut()
    }

    fn lock(&self) -> Result<RefMut<'_, P>, Error<P::Error>> {
        self.hardware.try_borrow_mut().map_err(|_| Error::Busy)
    }

    pub(crate) fn transaction<R>(
        &self,
        busno: BusNo,
        body: impl FnOnce(&mut Transaction<'_, P>) -> Result<R, Error<P::Error>>,
    ) -> Result<R, Error<P::Error>> {
        let mut hardware = self.lock()?;
        Transaction::run(&mut *hardware, busno, body)
    }

    /// Probe the device at `address`.
    ///
    /// Returns whether the address byte was acknowledged. An absent device is
    /// an expected outcome and yields `Ok(false)`; only primitive faults are
    /// reported as errors.
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] on a primitive fault, [`Error::Busy`] if another
    /// transaction is open.
    pub fn poll(&self, busno: BusNo, address: DeviceAddress) -> Result<bool, Error<P::Error>> {
        self.transaction(busno, |txn| txn.write(address.write()))
    }

    /// Write one byte to a device.
    ///
    /// With `ack` cleared, a NACK of the data byte is tolerated.
    ///
    /// # Errors
    ///
    /// [`Phase::BusAddress`] or [`Phase::WriteData`] NACK failures, and
    /// primitive faults.
    pub fn write_byte(
        &self,
        busno: BusNo,
        address: DeviceAddress,
        data: u8,
        ack: bool,
    ) -> Result<(), Error<P::Error>> {
        self.transaction(busno, |txn| {
            txn.address_write(address)?;
            if !txn.write(data)? && ack {
                return Err(Error::Nack(Phase::WriteData));
            }
            Ok(())
        })
    }

    /// Read one byte from a device.
    ///
    /// The byte is never acknowledged: there is nothing further to clock.
    ///
    /// # Errors
    ///
    /// [`Phase::ReadAddress`] NACK failure and primitive faults.
    pub fn read_byte(&self, busno: BusNo, address: DeviceAddress) -> Result<u8, Error<P::Error>> {
        self.transaction(busno, |txn| {
            txn.address_read(address)?;
            txn.read(false)
        })
    }

    /// Write `data` to a device starting at sub-address `addr`.
    ///
    /// With `ack_last` cleared the final byte may be NACKed, as EEPROMs do on
    /// a full page write. A NACK on any earlier byte always fails.
    ///
    /// # Errors
    ///
    /// [`Phase::BusAddress`], [`Phase::DataAddress`] or [`Phase::WriteData`]
    /// NACK failures, and primitive faults.
    pub fn write_many(
        &self,
        busno: BusNo,
        address: DeviceAddress,
        addr: u8,
        data: &[u8],
        ack_last: bool,
    ) -> Result<(), Error<P::Error>> {
        self.transaction(busno, |txn| {
            txn.address_write(address)?;
            txn.write_acked(addr, Phase::DataAddress)?;
            let last = data.len().saturating_sub(1);
            for (i, byte) in data.iter().enumerate() {
                if !txn.write(*byte)? && (i < last || ack_last) {
                    return Err(Error::Nack(Phase::WriteData));
                }
            }
            Ok(())
        })
    }

    /// Fill `data` from a device starting at sub-address `addr`.
    ///
    /// The sub-address is written, then a repeated start switches to the read
    /// direction. Every byte but the last is acknowledged; the last is NACKed
    /// so the device stops driving SDA.
    ///
    /// # Errors
    ///
    /// [`Phase::BusAddress`], [`Phase::DataAddress`] or [`Phase::ReadAddress`]
    /// NACK failures, and primitive faults. `data` may be partially filled.
    pub fn read_many(
        &self,
        busno: BusNo,
        address: DeviceAddress,
        addr: u8,
        data: &mut [u8],
    ) -> Result<(), Error<P::Error>> {
        self.transaction(busno, |txn| {
            txn.address_write(address)?;
            txn.write_acked(addr, Phase::DataAddress)?;
            txn.restart()?;
            txn.address_read(address)?;
            let last = data.len().saturating_sub(1);
            for (i, slot) in data.iter_mut().enumerate() {
                *slot = txn.read(i < last)?;
            }
            Ok(())
        })
    }

    /// Program a bus switch with a channel mask.
    ///
    /// The switch protocol is a primitive of its own (address and mask, no
    /// sub-address), so it is forwarded without engine bracketing.
    ///
    /// # Errors
    ///
    /// Primitive faults, and [`Error::Busy`] if a transaction is open.
    pub fn switch_select(
        &self,
        busno: BusNo,
        address: DeviceAddress,
        mask: u8,
    ) -> Result<(), Error<P::Error>> {
        log::trace!("{busno}: switch {address} mask {mask:#010b}");
        self.lock()?
            .switch_select(busno, address.seven_bit(), mask)
            .map_err(Error::Bus)
    }

    /// Poll every non-reserved 7-bit address on a bus.
    ///
    /// Responding addresses are returned in ascending order.
    ///
    /// # Errors
    ///
    /// The first primitive fault aborts the scan.
    pub fn scan(
        &self,
        busno: BusNo,
    ) -> Result<heapless::Vec<DeviceAddress, SCAN_CAPACITY>, Error<P::Error>> {
        let mut found = heapless::Vec::new();
        for seven_bit in SCAN_RANGE {
            let address = DeviceAddress::from_seven_bit(seven_bit);
            if self.poll(busno, address)? && found.push(address).is_err() {
                break;
            }
        }
        log::debug!("{busno}: scan found {} device(s)", found.len());
        Ok(found)
    }
}
