// Licensed under the Apache-2.0 license

//! Chip drivers built on the transaction engine.
//!
//! Each driver is an independent protocol over [`I2cController`](crate::i2c::I2cController):
//! it holds a shared reference to the controller plus the bus number and
//! address of its chip, fixed at construction. Construction performs no I/O.

pub mod i2c_switch;
pub mod pcf8574a;
pub mod tca6424a;

pub use i2c_switch::I2cSwitch;
pub use pcf8574a::Pcf8574a;
pub use tca6424a::Tca6424a;
