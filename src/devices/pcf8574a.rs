// Licensed under the Apache-2.0 license

//! Driver for the PCF8574A remote 8-bit I/O expander.
//!
//! The pins are quasi-bidirectional: a 1 in the output latch is only weakly
//! pulled high, so the pin doubles as an input that external circuitry can
//! pull low; a 0 is strongly driven low. Software cannot tell the two uses
//! apart; writing 1 to every pin meant to be read is the caller's job.

use crate::i2c::{BusNo, DeviceAddress, DeviceConfig, Error, I2cController, I2cPrimitives};

pub struct Pcf8574a<'a, P: I2cPrimitives> {
    controller: &'a I2cController<P>,
    busno: BusNo,
    address: DeviceAddress,
}

impl<'a, P: I2cPrimitives> Pcf8574a<'a, P> {
    pub const DEFAULT_ADDRESS: u8 = 0x7c;

    /// Expander on bus 0 at the default address.
    #[must_use]
    pub fn new(controller: &'a I2cController<P>) -> Self {
        Self::with_config(controller, DeviceConfig::builder(Self::DEFAULT_ADDRESS).build())
    }

    #[must_use]
    pub fn with_config(controller: &'a I2cController<P>, config: DeviceConfig) -> Self {
        Self {
            controller,
            busno: config.busno,
            address: config.address,
        }
    }

    #[must_use]
    pub fn config(&self) -> DeviceConfig {
        DeviceConfig {
            busno: self.busno,
            address: self.address,
        }
    }

    /// Drive `data` on the pins. High bits become weak-high inputs.
    ///
    /// # Errors
    ///
    /// NACK of the address or the data byte, and primitive faults.
    pub fn drive(&self, data: u8) -> Result<(), Error<P::Error>> {
        self.controller
            .write_byte(self.busno, self.address, data, true)
    }

    /// Sample the pin levels.
    ///
    /// # Errors
    ///
    /// NACK of the read address and primitive faults.
    pub fn sense(&self) -> Result<u8, Error<P::Error>> {
        self.controller.read_byte(self.busno, self.address)
    }
}
