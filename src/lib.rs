#![cfg_attr(not(any(test, feature = "std")), no_std)]
//! # nPM2100 / nPM1300 PMIC Driver
//!
//! This crate provides bisync-based drivers for the Nordic nPM2100 (boost
//! PMIC for primary cells) and nPM1300 (buck/LDO PMIC with charger) power
//! management ICs, built upon the `device-driver` crate with declarative
//! register maps in YAML manifests. Both async and blocking operation are
//! available from a single source through the [`bisync`](https://docs.rs/bisync) crate,
//! on top of the `embedded-hal` and `embedded-hal-async` I2C traits.
//!
//! ## Features
//!
//! *   **Declarative Register Maps:** `npm2100.yaml` and `npm1300.yaml`.
//! *   **Unified Async/Blocking Support:** `Npm2100` / `Npm2100Async`, `Npm1300` / `Npm1300Async`.
//! *   **Linear Ranges:** voltage and threshold fields are set in micro-units and
//!     converted with [`linear_range::LinearRange`].
//! *   **Event Handling:** nPM2100 events are enabled, disabled and
//!     collected with read-then-clear semantics ([`events`]).
//! *   **`defmt` and `log` Integration:** Optional support for logging and debugging.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! # use embedded_hal::i2c::ErrorKind;
//! # use embedded_hal_mock::eh1::i2c::Mock;
//! # use npm_pmic_dd::Npm2100;
//! # use npm_pmic_dd::npm2100::RegulatorSource;
//! # use npm_pmic_dd::events::Npm2100Event;
//! # let i2c = Mock::new(&[]);
//! let mut pmic = Npm2100::new(i2c);
//!
//! // 3.0 V on the boost output
//! pmic.set_voltage(RegulatorSource::Boost, 3_000_000, 3_000_000)?;
//!
//! pmic.enable_events(Npm2100Event::SysTimerExpiry.into())?;
//! if pmic.process_events()?.contains(Npm2100Event::SysTimerExpiry) {
//!     // timer fired
//! }
//! # Ok::<(), npm_pmic_dd::PmicError<ErrorKind>>(())
//! ```
//!
//! For async environments use `Npm2100Async` / `Npm1300Async`, every
//! operation then returns a future.
//!
//! ## Warning!
//!
//! ***Caution!*** These chips supply the rails your MCU runs from. Setting a
//! wrong output voltage, entering ship mode or arming the watchdog can cut
//! power to the host. Always consult the datasheet.

#[macro_use]
pub(crate) mod fmt;

pub mod events;
pub mod linear_range;
pub mod npm1300;
pub mod npm2100;

use thiserror::Error;

pub use linear_range::RangeError;

#[derive(Debug, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PmicError<I2cErr> {
    #[error("I2C error")]
    I2c(I2cErr),
    #[error("Range conversion failed: {0}")]
    Range(#[from] RangeError),
    #[error("Feature or specific mode not supported/implemented: {0}")]
    NotSupported(&'static str),
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// I2C transport for the nPM2100 (8-bit register addresses)
pub struct Npm2100Interface<I2cBus> {
    i2c: I2cBus,
    address: u8,
}

impl<I2cBus> Npm2100Interface<I2cBus> {
    pub fn new(i2c: I2cBus, address: u8) -> Self {
        Self { i2c, address }
    }
}

/// I2C transport for the nPM1300 (16-bit base/offset register addresses)
pub struct Npm1300Interface<I2cBus> {
    i2c: I2cBus,
    address: u8,
}

impl<I2cBus> Npm1300Interface<I2cBus> {
    pub fn new(i2c: I2cBus, address: u8) -> Self {
        Self { i2c, address }
    }
}

/// Longest register payload sent in one write transaction
const MAX_WRITE_LEN: usize = 8;

#[path = "."]
mod asynchronous {
    use bisync::asynchronous::*;
    use device_driver::AsyncRegisterInterface as RegisterInterface;
    use embedded_hal_async::i2c::I2c;
    mod driver_npm1300;
    mod driver_npm2100;
    pub use driver_npm1300::*;
    pub use driver_npm2100::*;
}
pub use asynchronous::Npm1300 as Npm1300Async;
pub use asynchronous::Npm2100 as Npm2100Async;

#[path = "."]
mod blocking {
    use bisync::synchronous::*;
    use device_driver::RegisterInterface;
    use embedded_hal::i2c::I2c;
    #[allow(clippy::duplicate_mod)]
    mod driver_npm1300;
    #[allow(clippy::duplicate_mod)]
    mod driver_npm2100;
    pub use driver_npm1300::*;
    pub use driver_npm2100::*;
}
pub use blocking::{Npm1300, Npm2100};
