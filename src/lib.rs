// Licensed under the Apache-2.0 license

//! I2C master transaction engine and chip drivers for a real-time control
//! context.
//!
//! The [`i2c`] module turns start/restart/stop and single-byte transfers into
//! bracketed multi-byte transactions; the [`devices`] module builds chip
//! protocols (bus switch, TCA6424A, PCF8574A) on top of it.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::indexing_slicing))]
#![cfg_attr(not(test), warn(clippy::expect_used))]
#![cfg_attr(not(test), no_std)]
pub mod devices;
pub mod i2c;
