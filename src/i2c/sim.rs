// Licensed under the Apache-2.0 license

//! Simulated I2C bus for host-side testing.
//!
//! [`SimBus`] implements [`I2cPrimitives`] in memory. It models the target side
//! of the protocol closely enough to exercise the engine and the drivers:
//!
//! - register-file targets (EEPROM/expander style: the first byte after the
//!   address selects a register, further bytes auto-increment)
//! - quasi-bidirectional port targets (PCF8574 style)
//! - NACK from absent addresses
//! - injected NACKs and primitive faults
//!
//! Every primitive that completes is appended to a bounded event log.

use crate::i2c::common::{BusNo, DeviceAddress};
use crate::i2c::traits::I2cPrimitives;
use embedded_hal::i2c::ErrorKind;
use heapless::{LinearMap, Vec};

/// Maximum number of targets attached to one simulator
pub const MAX_TARGETS: usize = 8;
/// Maximum number of distinct bus numbers in use at once
pub const MAX_BUSES: usize = 8;
/// Event log capacity
pub const LOG_CAPACITY: usize = 1024;

/// Fault reported by the simulator
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// Fault injected with [`SimBus::fail_on`]
    Injected,
    /// Byte transfer or restart outside a start..stop bracket
    NoTransaction,
    /// More than [`MAX_BUSES`] bus numbers in use
    TooManyBuses,
}

impl embedded_hal::i2c::Error for SimError {
    fn kind(&self) -> ErrorKind {
        match self {
            SimError::Injected => ErrorKind::Bus,
            SimError::NoTransaction | SimError::TooManyBuses => ErrorKind::Other,
        }
    }
}

/// Primitive operation kinds, for fault injection and log queries
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimOp {
    Start,
    Restart,
    Stop,
    Write,
    Read,
    SwitchSelect,
}

/// One completed primitive
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    Start(BusNo),
    Restart(BusNo),
    Stop(BusNo),
    Write { busno: BusNo, byte: u8, ack: bool },
    Read { busno: BusNo, byte: u8, ack: bool },
    SwitchSelect { busno: BusNo, address: u8, mask: u8 },
}

impl SimEvent {
    #[must_use]
    pub fn op(&self) -> SimOp {
        match self {
            SimEvent::Start(_) => SimOp::Start,
            SimEvent::Restart(_) => SimOp::Restart,
            SimEvent::Stop(_) => SimOp::Stop,
            SimEvent::Write { .. } => SimOp::Write,
            SimEvent::Read { .. } => SimOp::Read,
            SimEvent::SwitchSelect { .. } => SimOp::SwitchSelect,
        }
    }
}

#[derive(Clone, Debug)]
enum Behavior {
    RegisterFile { registers: [u8; 256], pointer: u8 },
    QuasiBidirectional { latch: u8, inputs: u8 },
}

/// A simulated device on one bus
#[derive(Clone, Debug)]
pub struct SimTarget {
    busno: BusNo,
    address: DeviceAddress,
    behavior: Behavior,
}

impl SimTarget {
    /// Device with 256 byte-wide registers, all zero, pointer at 0.
    #[must_use]
    pub fn register_file(busno: BusNo, address: DeviceAddress) -> Self {
        Self {
            busno,
            address,
            behavior: Behavior::RegisterFile {
                registers: [0; 256],
                pointer: 0,
            },
        }
    }

    /// Quasi-bidirectional port in its power-on state: latch and inputs high.
    #[must_use]
    pub fn quasi_bidirectional(busno: BusNo, address: DeviceAddress) -> Self {
        Self {
            busno,
            address,
            behavior: Behavior::QuasiBidirectional {
                latch: 0xff,
                inputs: 0xff,
            },
        }
    }

    /// Register content; zero for port targets.
    #[must_use]
    pub fn register(&self, register: u8) -> u8 {
        match &self.behavior {
            Behavior::RegisterFile { registers, .. } => {
                registers.get(usize::from(register)).copied().unwrap_or(0)
            }
            Behavior::QuasiBidirectional { .. } => 0,
        }
    }

    /// Registers starting at `register`, wrapping at 0xff.
    pub fn registers(&self, register: u8, out: &mut [u8]) {
        let mut reg = register;
        for slot in out.iter_mut() {
            *slot = self.register(reg);
            reg = reg.wrapping_add(1);
        }
    }

    pub fn set_register(&mut self, register: u8, value: u8) {
        if let Behavior::RegisterFile { registers, .. } = &mut self.behavior {
            if let Some(slot) = registers.get_mut(usize::from(register)) {
                *slot = value;
            }
        }
    }

    /// Output latch of a port target; `None` for register files.
    #[must_use]
    pub fn latch(&self) -> Option<u8> {
        match self.behavior {
            Behavior::QuasiBidirectional { latch, .. } => Some(latch),
            Behavior::RegisterFile { .. } => None,
        }
    }

    /// Levels applied externally to the pins of a port target.
    ///
    /// A pin reads high only when both the latch bit and the input are high:
    /// a strongly driven low latch wins over any external level.
    pub fn set_inputs(&mut self, levels: u8) {
        if let Behavior::QuasiBidirectional { inputs, .. } = &mut self.behavior {
            *inputs = levels;
        }
    }

    fn accept(&mut self, byte: u8, first: bool) {
        match &mut self.behavior {
            Behavior::RegisterFile { registers, pointer } => {
                if first {
                    *pointer = byte;
                } else {
                    if let Some(slot) = registers.get_mut(usize::from(*pointer)) {
                        *slot = byte;
                    }
                    *pointer = pointer.wrapping_add(1);
                }
            }
            Behavior::QuasiBidirectional { latch, .. } => *latch = byte,
        }
    }

    fn supply(&mut self) -> u8 {
        match &mut self.behavior {
            Behavior::RegisterFile { registers, pointer } => {
                let byte = registers.get(usize::from(*pointer)).copied().unwrap_or(0xff);
                *pointer = pointer.wrapping_add(1);
                byte
            }
            Behavior::QuasiBidirectional { latch, inputs } => *latch & *inputs,
        }
    }
}

/// Index of an attached target
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TargetId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Cursor {
    Idle,
    /// Next write is an address byte
    Addressing,
    Writing { target: usize, first: bool },
    Reading { target: usize },
    /// Address was not acknowledged; the bus floats
    Unaddressed,
}

/// In-memory implementation of the primitive bus interface
#[derive(Debug, Default)]
pub struct SimBus {
    targets: Vec<SimTarget, MAX_TARGETS>,
    cursors: LinearMap<BusNo, Cursor, MAX_BUSES>,
    log: Vec<SimEvent, LOG_CAPACITY>,
    overflowed: bool,
    writes: usize,
    nack_at: Option<usize>,
    fault: Option<SimOp>,
}

impl SimBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a target. Gives the target back when the simulator is full.
    pub fn attach(&mut self, target: SimTarget) -> Result<TargetId, SimTarget> {
        let id = TargetId(self.targets.len());
        self.targets.push(target)?;
        Ok(id)
    }

    #[must_use]
    pub fn target(&self, id: TargetId) -> Option<&SimTarget> {
        self.targets.get(id.0)
    }

    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut SimTarget> {
        self.targets.get_mut(id.0)
    }

    /// NACK the `index`-th write primitive (0-based) since the last
    /// [`clear_log`](Self::clear_log), regardless of the addressed target.
    pub fn nack_write(&mut self, index: usize) {
        self.nack_at = Some(index);
    }

    /// Make the next primitive of kind `op` fail with [`SimError::Injected`].
    pub fn fail_on(&mut self, op: SimOp) {
        self.fault = Some(op);
    }

    #[must_use]
    pub fn events(&self) -> &[SimEvent] {
        &self.log
    }

    /// Number of logged events of kind `op`.
    #[must_use]
    pub fn count(&self, op: SimOp) -> usize {
        self.log.iter().filter(|event| event.op() == op).count()
    }

    /// Whether events were dropped because the log was full.
    #[must_use]
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Clear the event log and the write counter used by
    /// [`nack_write`](Self::nack_write).
    pub fn clear_log(&mut self) {
        self.log.clear();
        self.overflowed = false;
        self.writes = 0;
    }

    /// Whether no transaction is open on `busno`.
    #[must_use]
    pub fn is_idle(&self, busno: BusNo) -> bool {
        matches!(self.cursor(busno), Cursor::Idle)
    }

    fn cursor(&self, busno: BusNo) -> Cursor {
        self.cursors.get(&busno).copied().unwrap_or(Cursor::Idle)
    }

    fn set_cursor(&mut self, busno: BusNo, cursor: Cursor) -> Result<(), SimError> {
        self.cursors
            .insert(busno, cursor)
            .map(|_| ())
            .map_err(|_| SimError::TooManyBuses)
    }

    fn record(&mut self, event: SimEvent) {
        if self.log.push(event).is_err() {
            self.overflowed = true;
        }
    }

    fn check_fault(&mut self, op: SimOp) -> Result<(), SimError> {
        if self.fault == Some(op) {
            self.fault = None;
            return Err(SimError::Injected);
        }
        Ok(())
    }

    fn open(&self, busno: BusNo) -> Result<Cursor, SimError> {
        match self.cursor(busno) {
            Cursor::Idle => Err(SimError::NoTransaction),
            cursor => Ok(cursor),
        }
    }

    fn find_target(&self, busno: BusNo, byte: u8) -> Option<usize> {
        let address = DeviceAddress::new(byte);
        self.targets
            .iter()
            .position(|target| target.busno == busno && target.address == address)
    }
}

impl I2cPrimitives for SimBus {
    type Error = SimError;

    fn start(&mut self, busno: BusNo) -> Result<(), SimError> {
        self.check_fault(SimOp::Start)?;
        self.set_cursor(busno, Cursor::Addressing)?;
        self.record(SimEvent::Start(busno));
        Ok(())
    }

    fn restart(&mut self, busno: BusNo) -> Result<(), SimError> {
        self.check_fault(SimOp::Restart)?;
        self.open(busno)?;
        self.set_cursor(busno, Cursor::Addressing)?;
        self.record(SimEvent::Restart(busno));
        Ok(())
    }

    fn stop(&mut self, busno: BusNo) -> Result<(), SimError> {
        self.check_fault(SimOp::Stop)?;
        if self.cursors.contains_key(&busno) {
            self.set_cursor(busno, Cursor::Idle)?;
        }
        self.record(SimEvent::Stop(busno));
        Ok(())
    }

    fn write(&mut self, busno: BusNo, byte: u8) -> Result<bool, SimError> {
        self.check_fault(SimOp::Write)?;
        let cursor = self.open(busno)?;
        let index = self.writes;
        self.writes += 1;
        let injected_nack = self.nack_at == Some(index);

        let (ack, next) = match cursor {
            Cursor::Addressing => match self.find_target(busno, byte) {
                Some(target) if !injected_nack => {
                    if byte & 1 == 1 {
                        (true, Cursor::Reading { target })
                    } else {
                        (true, Cursor::Writing { target, first: true })
                    }
                }
                _ => (false, Cursor::Unaddressed),
            },
            Cursor::Writing { target, first } if !injected_nack => {
                if let Some(device) = self.targets.get_mut(target) {
                    device.accept(byte, first);
                }
                (true, Cursor::Writing { target, first: false })
            }
            other => (false, other),
        };

        self.set_cursor(busno, next)?;
        self.record(SimEvent::Write { busno, byte, ack });
        Ok(ack)
    }

    fn read(&mut self, busno: BusNo, ack: bool) -> Result<u8, SimError> {
        self.check_fault(SimOp::Read)?;
        let byte = match self.open(busno)? {
            Cursor::Reading { target } => self
                .targets
                .get_mut(target)
                .map_or(0xff, SimTarget::supply),
            _ => 0xff,
        };
        self.record(SimEvent::Read { busno, byte, ack });
        Ok(byte)
    }

    fn switch_select(&mut self, busno: BusNo, address: u8, mask: u8) -> Result<(), SimError> {
        self.check_fault(SimOp::SwitchSelect)?;
        self.record(SimEvent::SwitchSelect {
            busno,
            address,
            mask,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUS: BusNo = BusNo(1);

    #[test]
    fn test_register_file_pointer() {
        let mut sim = SimBus::new();
        let id = sim
            .attach(SimTarget::register_file(BUS, DeviceAddress::new(0xa0)))
            .unwrap();

        sim.start(BUS).unwrap();
        assert!(sim.write(BUS, 0xa0).unwrap());
        assert!(sim.write(BUS, 0x10).unwrap());
        assert!(sim.write(BUS, 0xaa).unwrap());
        assert!(sim.write(BUS, 0xbb).unwrap());
        sim.stop(BUS).unwrap();

        let target = sim.target(id).unwrap();
        assert_eq!(target.register(0x10), 0xaa);
        assert_eq!(target.register(0x11), 0xbb);

        sim.start(BUS).unwrap();
        assert!(sim.write(BUS, 0xa0).unwrap());
        assert!(sim.write(BUS, 0x11).unwrap());
        sim.restart(BUS).unwrap();
        assert!(sim.write(BUS, 0xa1).unwrap());
        assert_eq!(sim.read(BUS, false).unwrap(), 0xbb);
        sim.stop(BUS).unwrap();
        assert!(sim.is_idle(BUS));
    }

    #[test]
    fn test_absent_address_nacks() {
        let mut sim = SimBus::new();
        sim.attach(SimTarget::register_file(BusNo(0), DeviceAddress::new(0xa0)))
            .unwrap();

        sim.start(BUS).unwrap();
        assert!(!sim.write(BUS, 0xa0).unwrap());
        assert!(!sim.write(BUS, 0x00).unwrap());
        assert_eq!(sim.read(BUS, false).unwrap(), 0xff);
        sim.stop(BUS).unwrap();
    }

    #[test]
    fn test_quasi_bidirectional_pins() {
        let mut sim = SimBus::new();
        let id = sim
            .attach(SimTarget::quasi_bidirectional(BUS, DeviceAddress::new(0x7c)))
            .unwrap();
        sim.target_mut(id).unwrap().set_inputs(0b1010_1010);

        sim.start(BUS).unwrap();
        assert!(sim.write(BUS, 0x7c).unwrap());
        assert!(sim.write(BUS, 0b1111_0000).unwrap());
        sim.stop(BUS).unwrap();
        assert_eq!(sim.target(id).unwrap().latch(), Some(0b1111_0000));

        sim.start(BUS).unwrap();
        assert!(sim.write(BUS, 0x7d).unwrap());
        assert_eq!(sim.read(BUS, false).unwrap(), 0b1010_0000);
        sim.stop(BUS).unwrap();
    }

    #[test]
    fn test_transfer_outside_transaction() {
        let mut sim = SimBus::new();
        assert_eq!(sim.write(BUS, 0xa0), Err(SimError::NoTransaction));
        assert_eq!(sim.read(BUS, true), Err(SimError::NoTransaction));
        assert_eq!(sim.restart(BUS), Err(SimError::NoTransaction));
        assert_eq!(sim.stop(BUS), Ok(()));
    }

    #[test]
    fn test_injection_and_log() {
        let mut sim = SimBus::new();
        sim.attach(SimTarget::register_file(BUS, DeviceAddress::new(0xa0)))
            .unwrap();
        sim.nack_write(1);
        sim.fail_on(SimOp::Read);

        sim.start(BUS).unwrap();
        assert!(sim.write(BUS, 0xa0).unwrap());
        assert!(!sim.write(BUS, 0x00).unwrap());
        assert!(sim.write(BUS, 0x01).unwrap());
        assert_eq!(sim.read(BUS, false), Err(SimError::Injected));
        sim.stop(BUS).unwrap();

        assert_eq!(sim.count(SimOp::Write), 3);
        assert_eq!(sim.count(SimOp::Read), 0);
        assert_eq!(
            sim.events().get(2),
            Some(&SimEvent::Write {
                busno: BUS,
                byte: 0x00,
                ack: false
            })
        );

        sim.clear_log();
        assert!(sim.events().is_empty());
        assert!(!sim.overflowed());
    }
}
