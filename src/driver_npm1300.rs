use super::{I2c, RegisterInterface, bisync, only_async, only_sync};
use crate::npm1300::{
    BUCKLDO_RANGE, GPIO_PIN_COUNT, GpioFlags, GpioMode, LED_COUNT, LedMode, NPM1300_I2C_ADDRESS,
    Npm1300LowLevel, PinCtrl, RegulatorMode, RegulatorSource, TIMER_MAX_TICKS,
    TIMER_PRESCALER_MS, TIMER_TARGET, WatchdogMode,
};
use crate::{MAX_WRITE_LEN, Npm1300Interface, PmicError};

#[bisync]
impl<I2cBus, E> RegisterInterface for Npm1300Interface<I2cBus>
where
    I2cBus: I2c<Error = E>,
    E: core::fmt::Debug,
{
    type AddressType = u16;
    type Error = PmicError<E>;

    async fn read_register(
        &mut self,
        address: u16,
        _size_bits: u32,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c
            .write_read(self.address, &address.to_be_bytes(), data)
            .await
            .map_err(PmicError::I2c)
    }

    async fn write_register(
        &mut self,
        address: u16,
        _size_bits: u32,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        // Frame: block base, offset, payload
        let mut buf = [0u8; 2 + MAX_WRITE_LEN];
        let frame = buf
            .get_mut(..2 + data.len())
            .ok_or(PmicError::InvalidArgument("register payload too long"))?;
        frame[..2].copy_from_slice(&address.to_be_bytes());
        frame[2..].copy_from_slice(data);

        self.i2c
            .write(self.address, frame)
            .await
            .map_err(PmicError::I2c)
    }
}

pub struct Npm1300<
    I2cImpl: RegisterInterface<AddressType = u16, Error = PmicError<I2cBusErr>>,
    I2cBusErr: core::fmt::Debug = <I2cImpl as RegisterInterface>::Error,
> {
    pub ll: Npm1300LowLevel<I2cImpl>,
    _marker: core::marker::PhantomData<I2cBusErr>,
}

impl<I2cBus, E> Npm1300<Npm1300Interface<I2cBus>, E>
where
    I2cBus: I2c<Error = E>,
    E: core::fmt::Debug,
{
    /// Create a driver talking to the default address (0x6B)
    pub fn new(i2c: I2cBus) -> Self {
        Self::with_address(i2c, NPM1300_I2C_ADDRESS)
    }

    pub fn with_address(i2c: I2cBus, address: u8) -> Self {
        Self {
            ll: Npm1300LowLevel::new(Npm1300Interface::new(i2c, address)),
            _marker: core::marker::PhantomData,
        }
    }
}

pub trait CurrentNpm1300Interface<E>:
    RegisterInterface<AddressType = u16, Error = PmicError<E>>
{
}

impl<T, E> CurrentNpm1300Interface<E> for T
where
    T: RegisterInterface<AddressType = u16, Error = PmicError<E>>,
    E: core::fmt::Debug,
{
}

include!("bisync_helpers.rs");

impl<I2cImpl, I2cBusErr> Npm1300<I2cImpl, I2cBusErr>
where
    I2cImpl: CurrentNpm1300Interface<I2cBusErr>,
    I2cBusErr: core::fmt::Debug,
{
    /// Load a new timer period (16 ms resolution)
    #[bisync]
    pub async fn set_timer(&mut self, time_ms: u32) -> Result<(), PmicError<I2cBusErr>> {
        let ticks = time_ms / TIMER_PRESCALER_MS;
        if ticks > TIMER_MAX_TICKS {
            return Err(PmicError::InvalidArgument("timer period too long"));
        }

        let target = ticks.to_be_bytes();
        self.ll
            .interface()
            .write_register(TIMER_TARGET, 24, &target[1..])
            .await?;

        let mut op = self.ll.timer_load();
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    /// Set the normal (or, for bucks, retention) output voltage to the
    /// highest step within `[min_uv, max_uv]`.
    ///
    /// Setting the normal voltage of a buck also moves it to software control.
    #[bisync]
    pub async fn set_voltage(
        &mut self,
        source: RegulatorSource,
        retention: bool,
        min_uv: i32,
        max_uv: i32,
    ) -> Result<(), PmicError<I2cBusErr>> {
        let idx = BUCKLDO_RANGE.get_win_index(min_uv, max_uv)? as u8;
        let chan = source.channel();

        if !source.is_buck() {
            if retention {
                return Err(PmicError::InvalidArgument("LDO has no retention voltage"));
            }
            let mut op = self.ll.ldsw_voutsel(chan);
            return write_internal(&mut op, |r| r.set_vout(idx)).await;
        }

        if retention {
            let mut op = self.ll.buck_vout_ret(chan);
            return write_internal(&mut op, |r| r.set_vout(idx)).await;
        }

        let mut op = self.ll.buck_vout_norm(chan);
        write_internal(&mut op, |r| r.set_vout(idx)).await?;
        let mut op = self.ll.buck_sw_ctrl();
        modify_internal(&mut op, |r| r.set_select(r.select() | (1 << chan))).await
    }

    /// Programmed normal output voltage in microvolts
    #[bisync]
    pub async fn get_voltage(
        &mut self,
        source: RegulatorSource,
    ) -> Result<i32, PmicError<I2cBusErr>> {
        let chan = source.channel();
        let idx = if source.is_buck() {
            read_internal(&mut self.ll.buck_vout_norm(chan)).await?.vout()
        } else {
            read_internal(&mut self.ll.ldsw_voutsel(chan)).await?.vout()
        };
        Ok(BUCKLDO_RANGE.get_value(idx as u16)?)
    }

    #[bisync]
    pub async fn set_mode(
        &mut self,
        source: RegulatorSource,
        mode: RegulatorMode,
    ) -> Result<(), PmicError<I2cBusErr>> {
        let chan = source.channel();
        match (source.is_buck(), mode) {
            (true, RegulatorMode::BuckPwm) => {
                write_internal(&mut self.ll.buck_pwm_set(chan), |r| r.set_task(true)).await
            }
            (true, RegulatorMode::BuckAuto) => {
                write_internal(&mut self.ll.buck_pwm_clr(chan), |r| r.set_task(true)).await
            }
            (false, RegulatorMode::LdswLdo) => {
                write_internal(&mut self.ll.ldsw_ldosel(chan), |r| r.set_ldo(true)).await
            }
            (false, RegulatorMode::LdswLoadSwitch) => {
                write_internal(&mut self.ll.ldsw_ldosel(chan), |r| r.set_ldo(false)).await
            }
            _ => Err(PmicError::NotSupported("mode not available on this regulator")),
        }
    }

    /// Hand a regulator function over to a GPIO.
    ///
    /// LDOs only support GPIO enable control.
    #[bisync]
    pub async fn set_pin_ctrl(
        &mut self,
        source: RegulatorSource,
        pinctrl: PinCtrl,
        pin: u8,
        inverted: bool,
    ) -> Result<(), PmicError<I2cBusErr>> {
        if pin >= GPIO_PIN_COUNT {
            return Err(PmicError::InvalidArgument("GPIO pin"));
        }
        let sel = pin + 1;

        match source {
            RegulatorSource::Buck1 => {
                let mut op = self.ll.buck_pin_ctrl(pinctrl.buck_register());
                modify_internal(&mut op, |r| {
                    r.set_first_pin(sel);
                    r.set_first_inverted(inverted);
                })
                .await
            }
            RegulatorSource::Buck2 => {
                let mut op = self.ll.buck_pin_ctrl(pinctrl.buck_register());
                modify_internal(&mut op, |r| {
                    r.set_second_pin(sel);
                    r.set_second_inverted(inverted);
                })
                .await
            }
            RegulatorSource::Ldo1 | RegulatorSource::Ldo2 => {
                if pinctrl != PinCtrl::Enable {
                    return Err(PmicError::InvalidArgument("LDO pin control"));
                }
                let mut op = self.ll.ldsw_gpisel(source.channel());
                write_internal(&mut op, |r| {
                    r.set_pin(sel);
                    r.set_inverted(inverted);
                })
                .await
            }
        }
    }

    #[bisync]
    pub async fn enable(&mut self, source: RegulatorSource) -> Result<(), PmicError<I2cBusErr>> {
        let chan = source.channel();
        if source.is_buck() {
            write_internal(&mut self.ll.buck_en_set(chan), |r| r.set_task(true)).await
        } else {
            write_internal(&mut self.ll.ldsw_en_set(chan), |r| r.set_task(true)).await
        }
    }

    #[bisync]
    pub async fn disable(&mut self, source: RegulatorSource) -> Result<(), PmicError<I2cBusErr>> {
        let chan = source.channel();
        if source.is_buck() {
            write_internal(&mut self.ll.buck_en_clr(chan), |r| r.set_task(true)).await
        } else {
            write_internal(&mut self.ll.ldsw_en_clr(chan), |r| r.set_task(true)).await
        }
    }

    /// Configure a GPIO: mode first, then each electrical option
    #[bisync]
    pub async fn configure_gpio(
        &mut self,
        pin: u8,
        mode: GpioMode,
        flags: GpioFlags,
    ) -> Result<(), PmicError<I2cBusErr>> {
        if pin >= GPIO_PIN_COUNT {
            return Err(PmicError::InvalidArgument("GPIO pin"));
        }
        let idx = pin as usize;

        write_internal(&mut self.ll.gpio_mode(idx), |r| r.set_mode(mode as u8)).await?;
        write_internal(&mut self.ll.gpio_opendrain(idx), |r| {
            r.set_enable(flags.open_drain)
        })
        .await?;
        write_internal(&mut self.ll.gpio_pullup(idx), |r| r.set_enable(flags.pull_up)).await?;
        write_internal(&mut self.ll.gpio_pulldown(idx), |r| {
            r.set_enable(flags.pull_down)
        })
        .await?;
        write_internal(&mut self.ll.gpio_drive(idx), |r| r.set_high(flags.drive_6ma)).await?;
        write_internal(&mut self.ll.gpio_debounce(idx), |r| {
            r.set_enable(flags.debounce)
        })
        .await
    }

    /// Drive a GPIO as a logic output
    #[bisync]
    pub async fn set_gpio(&mut self, pin: u8, high: bool) -> Result<(), PmicError<I2cBusErr>> {
        if pin >= GPIO_PIN_COUNT {
            return Err(PmicError::InvalidArgument("GPIO pin"));
        }
        let mode = if high {
            GpioMode::OutputLogic1
        } else {
            GpioMode::OutputLogic0
        };
        let mut op = self.ll.gpio_mode(pin as usize);
        write_internal(&mut op, |r| r.set_mode(mode as u8)).await
    }

    #[bisync]
    pub async fn get_gpio(&mut self, pin: u8) -> Result<bool, PmicError<I2cBusErr>> {
        if pin >= GPIO_PIN_COUNT {
            return Err(PmicError::InvalidArgument("GPIO pin"));
        }
        let mut op = self.ll.gpio_status();
        let levels = read_internal(&mut op).await?.levels();
        Ok(levels & (1 << pin) != 0)
    }

    #[bisync]
    pub async fn led_init(&mut self, led: u8, mode: LedMode) -> Result<(), PmicError<I2cBusErr>> {
        if led >= LED_COUNT {
            return Err(PmicError::InvalidArgument("LED"));
        }
        let mut op = self.ll.led_mode(led as usize);
        write_internal(&mut op, |r| r.set_mode(mode as u8)).await
    }

    /// Switch on a LED configured for host control
    #[bisync]
    pub async fn led_on(&mut self, led: u8) -> Result<(), PmicError<I2cBusErr>> {
        if led >= LED_COUNT {
            return Err(PmicError::InvalidArgument("LED"));
        }
        let mut op = self.ll.led_set(led as usize);
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    #[bisync]
    pub async fn led_off(&mut self, led: u8) -> Result<(), PmicError<I2cBusErr>> {
        if led >= LED_COUNT {
            return Err(PmicError::InvalidArgument("LED"));
        }
        let mut op = self.ll.led_clr(led as usize);
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    /// Load the timeout, select the watchdog mode and start the timer
    #[bisync]
    pub async fn watchdog_init(
        &mut self,
        timeout_ms: u32,
        mode: WatchdogMode,
    ) -> Result<(), PmicError<I2cBusErr>> {
        self.set_timer(timeout_ms).await?;
        write_internal(&mut self.ll.timer_mode(), |r| r.set_mode(mode as u8)).await?;
        debug!("watchdog armed, {} ms", timeout_ms);
        write_internal(&mut self.ll.timer_start(), |r| r.set_task(true)).await
    }

    #[bisync]
    pub async fn watchdog_feed(&mut self) -> Result<(), PmicError<I2cBusErr>> {
        write_internal(&mut self.ll.timer_wdog_kick(), |r| r.set_task(true)).await
    }

    #[bisync]
    pub async fn watchdog_disable(&mut self) -> Result<(), PmicError<I2cBusErr>> {
        write_internal(&mut self.ll.timer_stop(), |r| r.set_task(true)).await
    }
}
