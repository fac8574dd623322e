//! nPM2100 register map, configuration types and conversion tables

use crate::linear_range::LinearRange;

device_driver::create_device!(device_name: Npm2100LowLevel, manifest: "npm2100.yaml");

/// Default 7-bit I2C address
pub const NPM2100_I2C_ADDRESS: u8 = 0x74;

/// TIMER.TARGET, 24-bit big-endian tick count
pub(crate) const TIMER_TARGET: u8 = 0xB4;
pub(crate) const TIMER_PRESCALER_MS: u32 = 16;
pub(crate) const TIMER_MAX_TICKS: u32 = 0xFF_FFFF;

pub const GPIO_PIN_COUNT: u8 = 2;

pub(crate) const BOOST_RANGE: LinearRange = LinearRange::new(1_800_000, 50_000, 0, 30);
pub(crate) const LDOSW_RANGE: LinearRange = LinearRange::new(800_000, 100_000, 0, 22);

const VBAT_RANGE: LinearRange = LinearRange::new(700_000, 50_000, 0, 46);
const VOUT_RANGE: LinearRange = LinearRange::new(1_700_000, 50_000, 0, 31);
const VDPS_RANGE: LinearRange = LinearRange::new(1_800_000, 50_000, 0, 31);
const DPSLIMIT_RANGE: LinearRange = LinearRange::new(3, 1, 3, 255);

/// Regulated outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegulatorSource {
    Boost,
    /// LDO / load switch
    Ldosw,
}

impl RegulatorSource {
    pub const fn range(self) -> &'static LinearRange {
        match self {
            Self::Boost => &BOOST_RANGE,
            Self::Ldosw => &LDOSW_RANGE,
        }
    }
}

/// Operating mode applied under software control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperMode {
    Auto,
    HighPower,
    LowPower,
    UltraLowPower,
    PassThrough,
    NoHighPower,
    Off,
}

/// Operating mode forced while the control GPIO is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ForcedMode {
    HighPower,
    LowPower,
    UltraLowPower,
    PassThrough,
    NoHighPower,
}

/// Regulator mode: a normal mode plus an optional GPIO-forced mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegulatorMode {
    pub normal: OperMode,
    pub forced: Option<ForcedMode>,
}

impl RegulatorMode {
    pub const fn new(normal: OperMode) -> Self {
        Self {
            normal,
            forced: None,
        }
    }

    pub const fn with_forced(normal: OperMode, forced: ForcedMode) -> Self {
        Self {
            normal,
            forced: Some(forced),
        }
    }
}

impl From<OperMode> for RegulatorMode {
    fn from(normal: OperMode) -> Self {
        Self::new(normal)
    }
}

/// Function of a GPIO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum GpioUsage {
    Gpio = 0,
    IrqLow = 1,
    IrqHigh = 2,
    ResetOut = 3,
    PowerGood = 4,
}

/// Electrical configuration of a GPIO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioConfig {
    pub input: bool,
    pub output: bool,
    pub open_drain: bool,
    pub pull_down: bool,
    pub pull_up: bool,
    /// High drive strength
    pub drive: bool,
    pub debounce: bool,
}

impl GpioConfig {
    pub const fn input() -> Self {
        Self {
            input: true,
            output: false,
            open_drain: false,
            pull_down: false,
            pull_up: false,
            drive: false,
            debounce: false,
        }
    }

    pub const fn output() -> Self {
        Self {
            input: false,
            output: true,
            open_drain: false,
            pull_down: false,
            pull_up: false,
            drive: false,
            debounce: false,
        }
    }

    pub const fn with_pull_up(mut self) -> Self {
        self.pull_up = true;
        self
    }

    pub const fn with_pull_down(mut self) -> Self {
        self.pull_down = true;
        self
    }

    pub const fn with_debounce(mut self) -> Self {
        self.debounce = true;
        self
    }
}

/// Timer function, written to TIMER.CONFIG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TimerMode {
    GeneralPurpose = 0,
    WatchdogReset = 1,
    WatchdogPowerCycle = 2,
    Wakeup = 3,
}

/// Behaviour on watchdog expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogMode {
    /// Expiry raises the timer event only
    EventOnly,
    /// Expiry strobes the reset pin
    ResetPin,
    /// Expiry power cycles the PMIC
    PowerCycle,
}

impl From<WatchdogMode> for TimerMode {
    fn from(mode: WatchdogMode) -> Self {
        match mode {
            WatchdogMode::EventOnly => TimerMode::GeneralPurpose,
            WatchdogMode::ResetPin => TimerMode::WatchdogReset,
            WatchdogMode::PowerCycle => TimerMode::WatchdogPowerCycle,
        }
    }
}

pub const ADC_CHANNEL_COUNT: usize = 4;

/// ADC measurement channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdcChannel {
    Vbat = 0,
    DieTemp = 1,
    Droop = 2,
    Vout = 3,
    /// DPS pulse counter, read without a conversion
    DpsCount = 4,
}

/// Raw-to-physical scaling of one ADC channel: `offset + raw * mul / div`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AdcScaling {
    pub mode: u8,
    pub mul: i32,
    pub div: i32,
    pub offset: i32,
}

impl AdcScaling {
    pub fn convert(&self, raw: u8) -> i32 {
        (self.offset as i64 + raw as i64 * self.mul as i64 / self.div as i64) as i32
    }
}

impl AdcChannel {
    /// Scaling and ADC.CONFIG mode, `None` for channels that aren't conversions
    pub(crate) const fn scaling(self) -> Option<AdcScaling> {
        match self {
            Self::Vbat => Some(AdcScaling {
                mode: 0x00,
                mul: 3_200_000,
                div: 256,
                offset: 0,
            }),
            Self::DieTemp => Some(AdcScaling {
                mode: 0x02,
                mul: -2_120_000,
                div: 1,
                offset: 389_500_000,
            }),
            Self::Droop => Some(AdcScaling {
                mode: 0x03,
                mul: 1_500_000,
                div: 256,
                offset: 1_800_000,
            }),
            Self::Vout => Some(AdcScaling {
                mode: 0x04,
                mul: 1_500_000,
                div: 256,
                offset: 1_800_000,
            }),
            Self::DpsCount => None,
        }
    }
}

/// Samples averaged per conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdcOversampling {
    #[default]
    None = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
    X16 = 4,
}

/// Per-channel ADC configuration held by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcChannelConfig {
    pub oversampling: AdcOversampling,
}

/// Boost threshold attributes, expressed in micro-units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcAttribute {
    VbatMinH,
    VbatMinL,
    VoutDps,
    VoutMin,
    VoutWarn,
    /// DPS pulse count limit, unitless
    DpsLimit,
}

impl AdcAttribute {
    pub const fn range(self) -> &'static LinearRange {
        match self {
            Self::VbatMinH | Self::VbatMinL => &VBAT_RANGE,
            Self::VoutDps => &VDPS_RANGE,
            Self::VoutMin | Self::VoutWarn => &VOUT_RANGE,
            Self::DpsLimit => &DPSLIMIT_RANGE,
        }
    }
}
