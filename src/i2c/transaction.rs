// Licensed under the Apache-2.0 license

//! Open I2C transaction with guaranteed stop.
//!
//! A [`Transaction`] is created by a successful start condition and issues
//! exactly one stop condition when it ends, whether it is closed explicitly,
//! dropped after an error, or dropped while unwinding.

use crate::i2c::common::{BusNo, DeviceAddress, Phase};
use crate::i2c::error::Error;
use crate::i2c::traits::I2cPrimitives;

pub(crate) struct Transaction<'a, P: I2cPrimitives> {
    bus: &'a mut P,
    busno: BusNo,
    open: bool,
}

impl<'a, P: I2cPrimitives> Transaction<'a, P> {
    /// Assert a start condition. No stop is owed if the start itself faults.
    pub(crate) fn begin(bus: &'a mut P, busno: BusNo) -> Result<Self, Error<P::Error>> {
        bus.start(busno).map_err(Error::Bus)?;
        log::trace!("{busno}: start");
        Ok(Self {
            bus,
            busno,
            open: true,
        })
    }

    pub(crate) fn restart(&mut self) -> Result<(), Error<P::Error>> {
        log::trace!("{}: restart", self.busno);
        self.bus.restart(self.busno).map_err(Error::Bus)
    }

    pub(crate) fn write(&mut self, byte: u8) -> Result<bool, Error<P::Error>> {
        self.bus.write(self.busno, byte).map_err(Error::Bus)
    }

    /// Write a byte that must be acknowledged.
    pub(crate) fn write_acked(&mut self, byte: u8, phase: Phase) -> Result<(), Error<P::Error>> {
        if self.write(byte)? {
            Ok(())
        } else {
            Err(Error::Nack(phase))
        }
    }

    pub(crate) fn address_write(&mut self, address: DeviceAddress) -> Result<(), Error<P::Error>> {
        self.write_acked(address.write(), Phase::BusAddress)
    }

    pub(crate) fn address_read(&mut self, address: DeviceAddress) -> Result<(), Error<P::Error>> {
        self.write_acked(address.read(), Phase::ReadAddress)
    }

    pub(crate) fn read(&mut self, ack: bool) -> Result<u8, Error<P::Error>> {
        self.bus.read(self.busno, ack).map_err(Error::Bus)
    }

    /// Issue the stop condition and report its outcome.
    pub(crate) fn end(mut self) -> Result<(), Error<P::Error>> {
        self.open = false;
        log::trace!("{}: stop", self.busno);
        self.bus.stop(self.busno).map_err(Error::Bus)
    }

    /// Run `body` inside a transaction and end it on every exit path.
    ///
    /// The body's error wins over a fault from the closing stop.
    pub(crate) fn run<R>(
        bus: &'a mut P,
        busno: BusNo,
        body: impl FnOnce(&mut Self) -> Result<R, Error<P::Error>>,
    ) -> Result<R, Error<P::Error>> {
        let mut txn = Self::begin(bus, busno)?;
        match body(&mut txn) {
            Ok(value) => {
                txn.end()?;
                Ok(value)
            }
            Err(err) => {
                log::debug!("{busno}: {err}");
                if let Err(stop_err) = txn.end() {
                    log::warn!("{busno}: stop after failed transaction: {stop_err}");
                }
                Err(err)
            }
        }
    }
}

impl<P: I2cPrimitives> Drop for Transaction<'_, P> {
    fn drop(&mut self) {
        if self.open {
            self.open = false;
            log::warn!("{}: transaction abandoned, forcing stop", self.busno);
            let _ = self.bus.stop(self.busno);
        }
    }
}
