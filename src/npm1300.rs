//! nPM1300 register map and configuration types

use crate::linear_range::LinearRange;

device_driver::create_device!(device_name: Npm1300LowLevel, manifest: "npm1300.yaml");

/// Default 7-bit I2C address
pub const NPM1300_I2C_ADDRESS: u8 = 0x6B;

/// TIMER.TARGET (base 0x07, offset 0x08), 24-bit big-endian tick count
pub(crate) const TIMER_TARGET: u16 = 0x0708;
pub(crate) const TIMER_PRESCALER_MS: u32 = 16;
pub(crate) const TIMER_MAX_TICKS: u32 = 0xFF_FFFF;

pub const GPIO_PIN_COUNT: u8 = 5;
pub const LED_COUNT: u8 = 3;

/// Output voltage range shared by both bucks and both LDOs
pub(crate) const BUCKLDO_RANGE: LinearRange = LinearRange::new(1_000_000, 100_000, 0, 23);

/// Regulated outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegulatorSource {
    Buck1,
    Buck2,
    Ldo1,
    Ldo2,
}

impl RegulatorSource {
    /// Channel index within the BUCK or LDSW block
    pub(crate) const fn channel(self) -> usize {
        match self {
            Self::Buck1 | Self::Ldo1 => 0,
            Self::Buck2 | Self::Ldo2 => 1,
        }
    }

    pub const fn is_buck(self) -> bool {
        matches!(self, Self::Buck1 | Self::Buck2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegulatorMode {
    /// Buck switches between hysteretic and PWM automatically
    BuckAuto,
    /// Buck forced to PWM
    BuckPwm,
    /// LDSW channel operates as an LDO
    LdswLdo,
    /// LDSW channel operates as a load switch
    LdswLoadSwitch,
}

/// Regulator function a GPIO can control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinCtrl {
    Enable,
    Pwm,
    Retention,
}

impl PinCtrl {
    /// Index into the BUCK pin control registers (0x0C..=0x0E)
    pub(crate) const fn buck_register(self) -> usize {
        match self {
            Self::Enable => 0,
            Self::Retention => 1,
            Self::Pwm => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum GpioMode {
    Input = 0,
    InputLogic1 = 1,
    InputLogic0 = 2,
    InputEventRise = 3,
    InputEventFall = 4,
    OutputIrq = 5,
    OutputReset = 6,
    OutputPowerLossWarn = 7,
    OutputLogic1 = 8,
    OutputLogic0 = 9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioFlags {
    pub open_drain: bool,
    pub pull_up: bool,
    pub pull_down: bool,
    /// 6 mA drive strength instead of 1 mA
    pub drive_6ma: bool,
    pub debounce: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LedMode {
    Error = 0,
    Charging = 1,
    Host = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WatchdogMode {
    /// Expiry strobes the GPIO reset output
    ResetGpio = 1,
    /// Expiry power cycles the PMIC
    PowerCycle = 2,
    /// Expiry raises an event only
    EventOnly = 3,
}
