use embassy_futures::block_on;
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use npm_pmic_dd::npm1300::{
    GpioFlags, GpioMode, LedMode, PinCtrl, RegulatorMode, RegulatorSource, WatchdogMode,
};
use npm_pmic_dd::{Npm1300, Npm1300Async, PmicError, RangeError};

const ADDR: u8 = 0x6B;

fn write(bytes: &[u8]) -> I2cTransaction {
    I2cTransaction::write(ADDR, bytes.to_vec())
}

fn read(base: u8, offset: u8, value: u8) -> I2cTransaction {
    I2cTransaction::write_read(ADDR, vec![base, offset], vec![value])
}

#[test]
fn buck_voltage_takes_software_control() {
    let expectations = [
        write(&[0x04, 0x08, 0x08]),
        read(0x04, 0x0F, 0x00),
        write(&[0x04, 0x0F, 0x01]),
        write(&[0x04, 0x0A, 0x17]),
        read(0x04, 0x0F, 0x01),
        write(&[0x04, 0x0F, 0x03]),
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    pmic.set_voltage(RegulatorSource::Buck1, false, 1_800_000, 1_800_000)
        .unwrap();
    pmic.set_voltage(RegulatorSource::Buck2, false, 3_300_000, 3_300_000)
        .unwrap();

    i2c.done();
}

#[test]
fn retention_voltage() {
    let expectations = [write(&[0x04, 0x0B, 0x00])];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    pmic.set_voltage(RegulatorSource::Buck2, true, 1_000_000, 1_050_000)
        .unwrap();
    let ldo = pmic.set_voltage(RegulatorSource::Ldo1, true, 1_000_000, 1_050_000);
    assert!(matches!(ldo, Err(PmicError::InvalidArgument(_))));

    i2c.done();
}

#[test]
fn ldo_voltage_and_readback() {
    let expectations = [write(&[0x08, 0x0D, 0x17]), read(0x08, 0x0C, 0x08)];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    pmic.set_voltage(RegulatorSource::Ldo2, false, 3_000_000, 3_400_000)
        .unwrap();
    assert_eq!(pmic.get_voltage(RegulatorSource::Ldo1).unwrap(), 1_800_000);

    let out_of_window = pmic.set_voltage(RegulatorSource::Ldo1, false, 900_000, 950_000);
    assert!(matches!(
        out_of_window,
        Err(PmicError::Range(RangeError::Invalid))
    ));

    i2c.done();
}

#[test]
fn regulator_modes() {
    let expectations = [
        write(&[0x04, 0x06, 0x01]),
        write(&[0x04, 0x05, 0x01]),
        write(&[0x08, 0x09, 0x01]),
        write(&[0x08, 0x08, 0x00]),
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    pmic.set_mode(RegulatorSource::Buck2, RegulatorMode::BuckPwm)
        .unwrap();
    pmic.set_mode(RegulatorSource::Buck1, RegulatorMode::BuckAuto)
        .unwrap();
    pmic.set_mode(RegulatorSource::Ldo2, RegulatorMode::LdswLdo)
        .unwrap();
    pmic.set_mode(RegulatorSource::Ldo1, RegulatorMode::LdswLoadSwitch)
        .unwrap();

    let mismatch = pmic.set_mode(RegulatorSource::Ldo1, RegulatorMode::BuckPwm);
    assert!(matches!(mismatch, Err(PmicError::NotSupported(_))));

    i2c.done();
}

#[test]
fn pin_control() {
    let expectations = [
        read(0x04, 0x0D, 0x07),
        write(&[0x04, 0x0D, 0x9F]),
        read(0x04, 0x0C, 0xFF),
        write(&[0x04, 0x0C, 0xB9]),
        write(&[0x08, 0x06, 0x0D]),
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    pmic.set_pin_ctrl(RegulatorSource::Buck2, PinCtrl::Retention, 2, true)
        .unwrap();
    pmic.set_pin_ctrl(RegulatorSource::Buck1, PinCtrl::Enable, 0, false)
        .unwrap();
    pmic.set_pin_ctrl(RegulatorSource::Ldo2, PinCtrl::Enable, 4, true)
        .unwrap();

    assert!(matches!(
        pmic.set_pin_ctrl(RegulatorSource::Ldo1, PinCtrl::Pwm, 0, false),
        Err(PmicError::InvalidArgument(_))
    ));
    assert!(matches!(
        pmic.set_pin_ctrl(RegulatorSource::Buck1, PinCtrl::Enable, 5, false),
        Err(PmicError::InvalidArgument(_))
    ));

    i2c.done();
}

#[test]
fn enable_disable() {
    let expectations = [
        write(&[0x04, 0x02, 0x01]),
        write(&[0x08, 0x00, 0x01]),
        write(&[0x04, 0x01, 0x01]),
        write(&[0x08, 0x03, 0x01]),
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    pmic.enable(RegulatorSource::Buck2).unwrap();
    pmic.enable(RegulatorSource::Ldo1).unwrap();
    pmic.disable(RegulatorSource::Buck1).unwrap();
    pmic.disable(RegulatorSource::Ldo2).unwrap();

    i2c.done();
}

#[test]
fn timer_and_watchdog() {
    let expectations = [
        write(&[0x07, 0x08, 0x00, 0x00, 0x3E]),
        write(&[0x07, 0x03, 0x01]),
        write(&[0x07, 0x05, 0x02]),
        write(&[0x07, 0x00, 0x01]),
        write(&[0x07, 0x04, 0x01]),
        write(&[0x07, 0x01, 0x01]),
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    pmic.watchdog_init(1000, WatchdogMode::PowerCycle).unwrap();
    pmic.watchdog_feed().unwrap();
    pmic.watchdog_disable().unwrap();

    assert!(matches!(
        pmic.set_timer(u32::MAX),
        Err(PmicError::InvalidArgument(_))
    ));

    i2c.done();
}

#[test]
fn timer_bus_error_stops_watchdog_init() {
    let expectations =
        [write(&[0x07, 0x08, 0x00, 0x00, 0x3E]).with_error(ErrorKind::Other)];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    let result = pmic.watchdog_init(1000, WatchdogMode::EventOnly);
    assert!(matches!(result, Err(PmicError::I2c(ErrorKind::Other))));

    i2c.done();
}

#[test]
fn gpio_configure_set_get() {
    let expectations = [
        write(&[0x06, 0x03, 0x03]),
        write(&[0x06, 0x17, 0x00]),
        write(&[0x06, 0x0D, 0x00]),
        write(&[0x06, 0x12, 0x01]),
        write(&[0x06, 0x08, 0x00]),
        write(&[0x06, 0x1C, 0x01]),
        write(&[0x06, 0x04, 0x08]),
        read(0x06, 0x1E, 0x10),
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    let flags = GpioFlags {
        pull_down: true,
        debounce: true,
        ..Default::default()
    };
    pmic.configure_gpio(3, GpioMode::InputEventRise, flags)
        .unwrap();
    pmic.set_gpio(4, true).unwrap();
    assert!(pmic.get_gpio(4).unwrap());
    assert!(matches!(
        pmic.set_gpio(5, false),
        Err(PmicError::InvalidArgument(_))
    ));

    i2c.done();
}

#[test]
fn leds() {
    let expectations = [
        write(&[0x0A, 0x02, 0x02]),
        write(&[0x0A, 0x07, 0x01]),
        write(&[0x0A, 0x06, 0x01]),
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300::new(i2c.clone());

    pmic.led_init(2, LedMode::Host).unwrap();
    pmic.led_on(2).unwrap();
    pmic.led_off(1).unwrap();
    assert!(matches!(pmic.led_on(3), Err(PmicError::InvalidArgument(_))));

    i2c.done();
}

#[test]
fn async_buck_voltage_timer_and_leds() {
    let expectations = [
        write(&[0x04, 0x08, 0x08]),
        read(0x04, 0x0F, 0x02),
        write(&[0x04, 0x0F, 0x03]),
        read(0x04, 0x08, 0x08),
        write(&[0x07, 0x08, 0x00, 0x00, 0x3E]),
        write(&[0x07, 0x03, 0x01]),
        write(&[0x0A, 0x07, 0x01]),
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut pmic = Npm1300Async::new(i2c.clone());

    block_on(async {
        pmic.set_voltage(RegulatorSource::Buck1, false, 1_800_000, 1_800_000)
            .await
            .unwrap();
        assert_eq!(
            pmic.get_voltage(RegulatorSource::Buck1).await.unwrap(),
            1_800_000
        );
        pmic.set_timer(1000).await.unwrap();
        pmic.led_on(2).await.unwrap();
    });

    i2c.done();
}
