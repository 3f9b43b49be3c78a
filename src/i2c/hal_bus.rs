// Licensed under the Apache-2.0 license

//! embedded-hal view of one bus of an [`I2cController`].
//!
//! Lets drivers written against `embedded_hal::i2c::I2c` share the engine and
//! its guaranteed-stop semantics with the native chip drivers.

use crate::i2c::common::{BusNo, DeviceAddress, Phase};
use crate::i2c::error::Error;
use crate::i2c::i2c_controller::I2cController;
use crate::i2c::traits::I2cPrimitives;
use embedded_hal::i2c::{Operation, SevenBitAddress};

/// One bus of a controller
pub struct I2cBus<'a, P: I2cPrimitives> {
    controller: &'a I2cController<P>,
    busno: BusNo,
}

impl<'a, P: I2cPrimitives> I2cBus<'a, P> {
    #[must_use]
    pub fn new(controller: &'a I2cController<P>, busno: BusNo) -> Self {
        Self { controller, busno }
    }
}

impl<P: I2cPrimitives> embedded_hal::i2c::ErrorType for I2cBus<'_, P> {
    type Error = Error<P::Error>;
}

impl<P: I2cPrimitives> embedded_hal::i2c::I2c for I2cBus<'_, P> {
    /// Runs `operations` as one transaction.
    ///
    /// Adjacent operations of the same kind share one address phase; a change
    /// of direction issues a repeated start and a new address byte. The last
    /// byte of each read run is NACKed.
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let address = DeviceAddress::from_seven_bit(address);
        self.controller.transaction(self.busno, |txn| {
            let mut previous_read = None;
            for i in 0..operations.len() {
                // empty reads clock nothing, so they do not extend a read run
                let run_continues = operations
                    .get(i + 1..)
                    .unwrap_or_default()
                    .iter()
                    .take_while(|next| matches!(next, Operation::Read(_)))
                    .any(|next| matches!(next, Operation::Read(buffer) if !buffer.is_empty()));
                let Some(operation) = operations.get_mut(i) else {
                    break;
                };
                match operation {
                    Operation::Write(bytes) => {
                        if previous_read != Some(false) {
                            if previous_read.is_some() {
                                txn.restart()?;
                            }
                            txn.address_write(address)?;
                        }
                        for byte in bytes.iter() {
                            txn.write_acked(*byte, Phase::WriteData)?;
                        }
                        previous_read = Some(false);
                    }
                    Operation::Read(buffer) => {
                        if previous_read != Some(true) {
                            if previous_read.is_some() {
                                txn.restart()?;
                            }
                            txn.address_read(address)?;
                        }
                        let last = buffer.len().saturating_sub(1);
                        for (j, slot) in buffer.iter_mut().enumerate() {
                            *slot = txn.read(j < last || run_continues)?;
                        }
                        previous_read = Some(true);
                    }
                }
            }
            Ok(())
        })
    }
}
