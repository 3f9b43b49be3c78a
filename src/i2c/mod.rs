// Licensed under the Apache-2.0 license

//! Non-realtime I2C master.
//!
//! This module provides the primitive bus interface consumed by the engine,
//! the transaction engine itself, an embedded-hal adapter, and a simulated bus
//! for host-side testing. Designed for `no_std` control contexts.

pub mod common;
pub mod error;
pub mod hal_bus;
pub mod i2c_controller;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod traits;
mod transaction;

pub use common::{BusNo, DeviceAddress, DeviceConfig, DeviceConfigBuilder, Direction, Phase};
pub use error::Error;
pub use hal_bus::I2cBus;
pub use i2c_controller::I2cController;
pub use traits::I2cPrimitives;
