// Licensed under the Apache-2.0 license

//! Driver for the I2C bus switch (PCA954x family).
//!
//! The switch type is detected by the control context during I2C init; this
//! driver only programs the channel mask through the dedicated switch-select
//! primitive.

use crate::i2c::{BusNo, DeviceAddress, DeviceConfig, Error, I2cController, I2cPrimitives};

pub struct I2cSwitch<'a, P: I2cPrimitives> {
    controller: &'a I2cController<P>,
    busno: BusNo,
    address: DeviceAddress,
}

impl<'a, P: I2cPrimitives> I2cSwitch<'a, P> {
    pub const DEFAULT_ADDRESS: u8 = 0xe8;
    pub const CHANNELS: u8 = 8;

    /// Switch on bus 0 at the default address.
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

    /// Enable one channel (0-7), disabling all others.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] before any bus access for channels above 7,
    /// otherwise primitive faults.
    pub fn select(&self, channel: u8) -> Result<(), Error<P::Error>> {
        if channel >= Self::CHANNELS {
            return Err(Error::InvalidChannel(channel));
        }
        self.controller
            .switch_select(self.busno, self.address, 1 << channel)
    }

    /// Disable every channel.
    ///
    /// # Errors
    ///
    /// Primitive faults.
    pub fn deselect(&self) -> Result<(), Error<P::Error>> {
        self.controller.switch_select(self.busno, self.address, 0)
    }
}
