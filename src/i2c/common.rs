// Licensed under the Apache-2.0 license

//! Common types for the I2C transaction engine and the chip drivers.
//!
//! This module provides the bus and address newtypes, the transaction phase
//! used in error reporting, and the device configuration shared by all drivers.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of an I2C bus on the control context.
///
/// Several devices may share one bus; transactions on the same bus never
/// interleave.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct BusNo(pub u8);

impl From<u8> for BusNo {
    fn from(busno: u8) -> Self {
        Self(busno)
    }
}

impl fmt::Display for BusNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i2c{}", self.0)
    }
}

/// Data direction carried in the R/W bit of the address byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// 8-bit I2C device address.
///
/// The 7-bit address lives in bits 7..1 and bit 0 is always clear. Bit 0 is
/// set only on the wire, when the address byte is combined with
/// [`Direction::Read`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(from = "u8", into = "u8"))]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    /// Address from its 8-bit form. The R/W bit is masked off.
    #[must_use]
    pub const fn new(address: u8) -> Self {
        Self(address & !1)
    }

    /// Address from its 7-bit form (`0x00..=0x7f`).
    #[must_use]
    pub const fn from_seven_bit(address: u8) -> Self {
        Self((address & 0x7f) << 1)
    }

    /// 7-bit form, as used by switch select and embedded-hal.
    #[must_use]
    pub const fn seven_bit(self) -> u8 {
        self.0 >> 1
    }

    /// Address byte for the given direction.
    #[must_use]
    pub const fn with_direction(self, direction: Direction) -> u8 {
        self.0 | direction as u8
    }

    /// Address byte with the write bit.
    #[must_use]
    pub const fn write(self) -> u8 {
        self.with_direction(Direction::Write)
    }

    /// Address byte with the read bit.
    #[must_use]
    pub const fn read(self) -> u8 {
        self.with_direction(Direction::Read)
    }
}

impl From<u8> for DeviceAddress {
    fn from(address: u8) -> Self {
        Self::new(address)
    }
}

impl From<DeviceAddress> for u8 {
    fn from(address: DeviceAddress) -> Self {
        address.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Transaction phase that was not acknowledged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Device address in write direction
    BusAddress,
    /// Register/page sub-address following the device address
    DataAddress,
    /// Payload byte
    WriteData,
    /// Device address in read direction
    ReadAddress,
}

impl Phase {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Phase::BusAddress => "failed to ack bus address",
            Phase::DataAddress => "failed to ack data address",
            Phase::WriteData => "failed to ack write data",
            Phase::ReadAddress => "failed to ack bus read address",
        }
    }

    /// Whether the missing acknowledge belongs to an address byte.
    #[must_use]
    pub const fn is_address(self) -> bool {
        matches!(self, Phase::BusAddress | Phase::ReadAddress)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Bus number and address of one chip.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    pub busno: BusNo,
    pub address: DeviceAddress,
}

impl DeviceConfig {
    /// Start a builder seeded with a chip's default address on bus 0.
    #[must_use]
    pub fn builder(default_address: u8) -> DeviceConfigBuilder {
        DeviceConfigBuilder::new(default_address)
    }
}

/// Builder for [`DeviceConfig`].
///
/// Drivers seed it with their chip's default address; board code overrides
/// the bus and, for strapped parts, the address.
pub struct DeviceConfigBuilder {
    busno: BusNo,
    address: DeviceAddress,
}

/// Bus 0, general-call address. Set the chip address before building.
impl Default for DeviceConfigBuilder {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeviceConfigBuilder {
    #[must_use]
    pub fn new(default_address: u8) -> Self {
        Self {
            busno: BusNo(0),
            address: DeviceAddress::new(default_address),
        }
    }
    /// Bus number, defaults to 0.
    #[must_use]
    pub fn busno(mut self, busno: u8) -> Self {
        self.busno = BusNo(busno);
        self
    }
    /// 8-bit address; the R/W bit is masked off.
    #[must_use]
    pub fn address(mut self, address: u8) -> Self {
        self.address = DeviceAddress::new(address);
        self
    }
    #[must_use]
    pub fn build(self) -> DeviceConfig {
        DeviceConfig {
            busno: self.busno,
            address: self.address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_forms() {
        let addr = DeviceAddress::new(0xe9);
        assert_eq!(u8::from(addr), 0xe8);
        assert_eq!(addr.seven_bit(), 0x74);
        assert_eq!(addr.write(), 0xe8);
        assert_eq!(addr.read(), 0xe9);
        assert_eq!(DeviceAddress::from_seven_bit(0x74), addr);
    }

    #[test]
    fn test_phase_descriptions() {
        assert_eq!(Phase::BusAddress.to_string(), "failed to ack bus address");
        assert_eq!(Phase::WriteData.to_string(), "failed to ack write data");
        assert_eq!(Phase::DataAddress.to_string(), "failed to ack data address");
        assert_eq!(
            Phase::ReadAddress.to_string(),
            "failed to ack bus read address"
        );
        assert!(Phase::ReadAddress.is_address());
        assert!(!Phase::DataAddress.is_address());
    }

    #[test]
    fn test_config_builder() {
        let config = DeviceConfig::builder(0x44).busno(2).build();
        assert_eq!(config.busno, BusNo(2));
        assert_eq!(config.address, DeviceAddress::new(0x44));

        let config = DeviceConfig::builder(0x44).address(0x46).build();
        assert_eq!(config.busno, BusNo(0));
        assert_eq!(config.address.write(), 0x46);

        let config = DeviceConfigBuilder::default().busno(1).address(0x4d).build();
        assert_eq!(config.busno, BusNo(1));
        assert_eq!(config.address, DeviceAddress::new(0x4c));
        assert_eq!(
            DeviceConfigBuilder::default().build().address,
            DeviceAddress::new(0)
        );
    }
}
