// Licensed under the Apache-2.0 license

//! Error type of the transaction engine and the chip drivers.

use crate::i2c::common::Phase;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// I2C transaction failure.
///
/// `E` is the fault type of the [`I2cPrimitives`](crate::i2c::I2cPrimitives)
/// implementation. Whatever the variant, the engine has already issued the
/// stop condition when this error reaches the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error<E> {
    /// A device did not acknowledge the given phase
    #[error("I2C transaction failed: {0}")]
    Nack(Phase),
    /// The primitive layer reported a fault
    #[error("I2C bus fault: {0:?}")]
    Bus(E),
    /// Another transaction is still open on this controller
    #[error("I2C transaction already in progress")]
    Busy,
    /// Switch channel outside 0-7
    #[error("I2C switch channel {0} out of range")]
    InvalidChannel(u8),
}

impl<E> Error<E> {
    /// Phase that was not acknowledged, if this is a NACK failure.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Nack(phase) => Some(*phase),
            _ => None,
        }
    }
}

impl<E: embedded_hal::i2c::Error> embedded_hal::i2c::Error for Error<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Nack(phase) if phase.is_address() => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Error::Nack(_) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Error::Bus(e) => e.kind(),
            Error::Busy | Error::InvalidChannel(_) => ErrorKind::Other,
        }
    }
}
