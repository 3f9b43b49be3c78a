// Licensed under the Apache-2.0 license

use nrt_i2c::devices::{I2cSwitch, Pcf8574a, Tca6424a};
use nrt_i2c::i2c::sim::{SimBus, SimEvent, SimOp, SimTarget};
use nrt_i2c::i2c::{BusNo, DeviceAddress, Error, I2cController, Phase};

const BUS: BusNo = BusNo(0);
const EEPROM: DeviceAddress = DeviceAddress::new(0xa0);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn with_eeprom() -> I2cController<SimBus> {
    let mut sim = SimBus::new();
    sim.attach(SimTarget::register_file(BUS, EEPROM)).unwrap();
    I2cController::new(sim)
}

/// Every start is matched by exactly one stop and the bus ends idle.
fn assert_bracketed(sim: &SimBus, transactions: usize) {
    assert_eq!(sim.count(SimOp::Start), transactions);
    assert_eq!(sim.count(SimOp::Stop), transactions);
    assert!(sim.is_idle(BUS));
    let mut open = false;
    for event in sim.events() {
        match event {
            SimEvent::Start(_) => {
                assert!(!open, "start inside an open transaction");
                open = true;
            }
            SimEvent::Stop(_) => {
                assert!(open, "stop without start");
                open = false;
            }
            _ => {}
        }
    }
    assert!(!open);
}

#[test]
fn absent_address_is_not_an_error_for_poll() {
    init_logging();
    let i2c = I2cController::new(SimBus::new());
    for seven_bit in 0x00..=0x7f {
        assert_eq!(i2c.poll(BUS, DeviceAddress::from_seven_bit(seven_bit)), Ok(false));
    }
    assert_bracketed(&i2c.release(), 128);
}

#[test]
fn absent_address_fails_every_other_operation() {
    init_logging();
    let i2c = I2cController::new(SimBus::new());
    let absent = DeviceAddress::new(0x42);
    let mut buf = [0u8; 4];

    assert_eq!(
        i2c.write_byte(BUS, absent, 0x00, true),
        Err(Error::Nack(Phase::BusAddress))
    );
    assert_eq!(
        i2c.read_byte(BUS, absent),
        Err(Error::Nack(Phase::ReadAddress))
    );
    assert_eq!(
        i2c.write_many(BUS, absent, 0x00, &[1, 2], true),
        Err(Error::Nack(Phase::BusAddress))
    );
    assert_eq!(
        i2c.read_many(BUS, absent, 0x00, &mut buf),
        Err(Error::Nack(Phase::BusAddress))
    );
    assert_bracketed(&i2c.release(), 4);
}

#[test]
fn injected_nack_in_any_phase_stops_once() {
    init_logging();
    // read_many writes: address, sub-address, read address
    let expected = [Phase::BusAddress, Phase::DataAddress, Phase::ReadAddress];
    for (index, phase) in expected.into_iter().enumerate() {
        let mut i2c = with_eeprom();
        i2c.hardware_mut().nack_write(index);
        let mut buf = [0u8; 2];
        assert_eq!(i2c.read_many(BUS, EEPROM, 0x00, &mut buf), Err(Error::Nack(phase)));
        assert_bracketed(&i2c.release(), 1);
    }
}

#[test]
fn injected_fault_in_any_primitive_stops_once() {
    init_logging();
    for op in [SimOp::Write, SimOp::Restart, SimOp::Read] {
        let mut sim = SimBus::new();
        sim.attach(SimTarget::register_file(BUS, EEPROM)).unwrap();
        sim.fail_on(op);
        let i2c = I2cController::new(sim);
        let mut buf = [0u8; 2];
        assert!(matches!(
            i2c.read_many(BUS, EEPROM, 0x00, &mut buf),
            Err(Error::Bus(_))
        ));
        assert_bracketed(&i2c.release(), 1);
    }
}

#[test]
fn write_many_tolerates_only_final_nack() {
    init_logging();
    let data = [0x10, 0x20, 0x30];
    // data bytes are write indices 2, 3 and 4
    for (index, tolerated) in [(2, false), (3, false), (4, true)] {
        for ack_last in [false, true] {
            let mut sim = SimBus::new();
            sim.attach(SimTarget::register_file(BUS, EEPROM)).unwrap();
            sim.nack_write(index);
            let i2c = I2cController::new(sim);
            let result = i2c.write_many(BUS, EEPROM, 0x00, &data, ack_last);
            if tolerated && !ack_last {
                assert_eq!(result, Ok(()));
            } else {
                assert_eq!(result, Err(Error::Nack(Phase::WriteData)));
            }
            assert_bracketed(&i2c.release(), 1);
        }
    }
}

#[test]
fn read_many_acks_all_but_last() {
    init_logging();
    for len in [1usize, 2, 5] {
        let i2c = with_eeprom();
        let mut buf = vec![0u8; len];
        i2c.read_many(BUS, EEPROM, 0x00, &mut buf).unwrap();
        let sim = i2c.release();
        let acks: Vec<bool> = sim
            .events()
            .iter()
            .filter_map(|event| match event {
                SimEvent::Read { ack, .. } => Some(*ack),
                _ => None,
            })
            .collect();
        let mut expected = vec![true; len - 1];
        expected.push(false);
        assert_eq!(acks, expected);
    }
}

#[test]
fn write_many_read_many_round_trip() {
    init_logging();
    for len in [1usize, 2, 8] {
        let i2c = with_eeprom();
        let data: Vec<u8> = (0..len as u8).map(|i| i.wrapping_mul(37) ^ 0xa5).collect();
        i2c.write_many(BUS, EEPROM, 0x40, &data, true).unwrap();
        let mut back = vec![0u8; len];
        i2c.read_many(BUS, EEPROM, 0x40, &mut back).unwrap();
        assert_eq!(back, data);
        assert_bracketed(&i2c.release(), 2);
    }
}

#[test]
fn drivers_share_one_controller() {
    init_logging();
    let mut sim = SimBus::new();
    sim.attach(SimTarget::register_file(BUS, DeviceAddress::new(0x44)))
        .unwrap();
    let port = sim
        .attach(SimTarget::quasi_bidirectional(BUS, DeviceAddress::new(0x7c)))
        .unwrap();
    let i2c = I2cController::new(sim);

    let switch = I2cSwitch::new(&i2c);
    let outputs = Tca6424a::new(&i2c);
    let expander = Pcf8574a::new(&i2c);

    switch.select(3).unwrap();
    outputs.set_outputs(0xabcdef).unwrap();
    expander.drive(0x0f).unwrap();
    assert_eq!(expander.sense(), Ok(0x0f));
    switch.deselect().unwrap();

    let sim = i2c.release();
    assert_eq!(sim.target(port).unwrap().latch(), Some(0x0f));
    assert_eq!(sim.count(SimOp::SwitchSelect), 2);
    assert_bracketed(&sim, 4);
    assert_eq!(
        sim.events().first(),
        Some(&SimEvent::SwitchSelect {
            busno: BUS,
            address: 0x74,
            mask: 0x08
        })
    );
}
