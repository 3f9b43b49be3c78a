// Licensed under the Apache-2.0 license

//! Driver for the TCA6424A 24-bit I2C I/O expander.
//!
//! On QC2-style hardware this chip switches the directions of TTL buffers:
//! bit 0 of the word drives TTL0 of a card and bit 23 drives TTL23.

use crate::i2c::{BusNo, DeviceAddress, DeviceConfig, Error, I2cController, I2cPrimitives};

/// Output port 0 with the auto-increment flag set
pub const OUTPUT_PORT_0: u8 = 0x84;
/// Configuration port 0 with the auto-increment flag set
pub const CONFIG_PORT_0: u8 = 0x8c;

/// Three port bytes of a 24-bit word, port 0 (bits 0-7) first.
#[must_use]
pub fn port_bytes(value: u32) -> [u8; 3] {
    let [port0, port1, port2, _] = value.to_le_bytes();
    [port0, port1, port2]
}

pub struct Tca6424a<'a, P: I2cPrimitives> {
    controller: &'a I2cController<P>,
    busno: BusNo,
    address: DeviceAddress,
}

impl<'a, P: I2cPrimitives> Tca6424a<'a, P> {
    pub const DEFAULT_ADDRESS: u8 = 0x44;

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

    fn write24(&self, register: u8, value: u32) -> Result<(), Error<P::Error>> {
        self.controller
            .write_many(self.busno, self.address, register, &port_bytes(value), true)
    }

    /// Drive all 24 pins to the levels of `outputs`.
    ///
    /// All pins are first configured as outputs, then the levels are written.
    /// A failure in between leaves the pins configured but not set; retry the
    /// whole call. Bits above 23 are ignored.
    ///
    /// # Errors
    ///
    /// NACK failures and primitive faults of either write.
    pub fn set_outputs(&self, outputs: u32) -> Result<(), Error<P::Error>> {
        log::debug!("TCA6424A {} on {}: outputs {outputs:#08x}", self.address, self.busno);
        self.write24(CONFIG_PORT_0, 0)?;
        self.write24(OUTPUT_PORT_0, outputs)
    }
}
