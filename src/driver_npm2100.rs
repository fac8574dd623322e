use super::{I2c, RegisterInterface, bisync, only_async, only_sync};
use crate::events::{EventLayout, EventSet, MAX_EVENT_BLOCK_LEN, NPM2100_EVENT_LAYOUT};
use crate::npm2100::{
    ADC_CHANNEL_COUNT, AdcAttribute, AdcChannel, AdcChannelConfig, AdcOversampling, ForcedMode,
    GPIO_PIN_COUNT, GpioConfig, GpioUsage, NPM2100_I2C_ADDRESS, Npm2100LowLevel, OperMode,
    RegulatorMode, RegulatorSource, TIMER_MAX_TICKS, TIMER_PRESCALER_MS, TIMER_TARGET, TimerMode,
    WatchdogMode,
};
use crate::{MAX_WRITE_LEN, Npm2100Interface, PmicError};

#[bisync]
impl<I2cBus, E> RegisterInterface for Npm2100Interface<I2cBus>
where
    I2cBus: I2c<Error = E>,
    E: core::fmt::Debug,
{
    type AddressType = u8;
    type Error = PmicError<E>;

    async fn read_register(
        &mut self,
        address: u8,
        _size_bits: u32,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c
            .write_read(self.address, &[address], data)
            .await
            .map_err(PmicError::I2c)
    }

    async fn write_register(
        &mut self,
        address: u8,
        _size_bits: u32,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        // Frame: register address followed by the payload
        let mut buf = [0u8; 1 + MAX_WRITE_LEN];
        let frame = buf
            .get_mut(..1 + data.len())
            .ok_or(PmicError::InvalidArgument("register payload too long"))?;
        frame[0] = address;
        frame[1..].copy_from_slice(data);

        self.i2c
            .write(self.address, frame)
            .await
            .map_err(PmicError::I2c)
    }
}

pub struct Npm2100<
    I2cImpl: RegisterInterface<AddressType = u8, Error = PmicError<I2cBusErr>>,
    I2cBusErr: core::fmt::Debug = <I2cImpl as RegisterInterface>::Error,
> {
    pub ll: Npm2100LowLevel<I2cImpl>,
    events: &'static EventLayout,
    adc: [AdcChannelConfig; ADC_CHANNEL_COUNT],
    _marker: core::marker::PhantomData<I2cBusErr>,
}

impl<I2cBus, E> Npm2100<Npm2100Interface<I2cBus>, E>
where
    I2cBus: I2c<Error = E>,
    E: core::fmt::Debug,
{
    /// Create a driver talking to the default address (0x74)
    pub fn new(i2c: I2cBus) -> Self {
        Self::with_address(i2c, NPM2100_I2C_ADDRESS)
    }

    pub fn with_address(i2c: I2cBus, address: u8) -> Self {
        Self {
            ll: Npm2100LowLevel::new(Npm2100Interface::new(i2c, address)),
            events: &NPM2100_EVENT_LAYOUT,
            adc: [AdcChannelConfig::default(); ADC_CHANNEL_COUNT],
            _marker: core::marker::PhantomData,
        }
    }
}

pub trait CurrentNpm2100Interface<E>:
    RegisterInterface<AddressType = u8, Error = PmicError<E>>
{
}

impl<T, E> CurrentNpm2100Interface<E> for T
where
    T: RegisterInterface<AddressType = u8, Error = PmicError<E>>,
    E: core::fmt::Debug,
{
}

include!("bisync_helpers.rs");

impl<I2cImpl, I2cBusErr> Npm2100<I2cImpl, I2cBusErr>
where
    I2cImpl: CurrentNpm2100Interface<I2cBusErr>,
    I2cBusErr: core::fmt::Debug,
{
    /// Replace the event register layout, for silicon revisions that
    /// place the event blocks differently.
    ///
    /// Fails with [`PmicError::InvalidArgument`] if a block runs past
    /// register 0xFF, is longer than [`MAX_EVENT_BLOCK_LEN`] or an event
    /// offset falls outside its block.
    pub fn with_event_layout(
        mut self,
        layout: &'static EventLayout,
    ) -> Result<Self, PmicError<I2cBusErr>> {
        if !layout.is_valid() {
            return Err(PmicError::InvalidArgument("event layout"));
        }
        self.events = layout;
        Ok(self)
    }

    pub fn event_layout(&self) -> &'static EventLayout {
        self.events
    }

    #[bisync]
    async fn read_block(
        &mut self,
        address: u8,
        data: &mut [u8],
    ) -> Result<(), PmicError<I2cBusErr>> {
        let size_bits = data.len() as u32 * 8;
        self.ll
            .interface()
            .read_register(address, size_bits, data)
            .await
    }

    #[bisync]
    async fn write_block(&mut self, address: u8, data: &[u8]) -> Result<(), PmicError<I2cBusErr>> {
        let size_bits = data.len() as u32 * 8;
        self.ll
            .interface()
            .write_register(address, size_bits, data)
            .await
    }

    /// Enable interrupts for every event in `events`.
    ///
    /// Each event's stale pending flag is cleared before its interrupt is
    /// enabled. Events are handled in ascending identifier order and the
    /// first bus error aborts the sequence; events handled before the
    /// failure stay enabled.
    #[bisync]
    pub async fn enable_events(&mut self, events: EventSet) -> Result<(), PmicError<I2cBusErr>> {
        let layout = self.events;
        for event in events.iter() {
            let desc = layout.descriptor(event);
            trace!("enable event {}", event as u8);
            self.write_block(layout.events_clr + desc.offset, &[desc.mask])
                .await?;
            self.write_block(layout.inten_set + desc.offset, &[desc.mask])
                .await?;
        }
        Ok(())
    }

    /// Disable interrupts for every event in `events`, then clear their
    /// pending flags. Same ordering and error policy as [`Self::enable_events`].
    #[bisync]
    pub async fn disable_events(&mut self, events: EventSet) -> Result<(), PmicError<I2cBusErr>> {
        let layout = self.events;
        for event in events.iter() {
            let desc = layout.descriptor(event);
            trace!("disable event {}", event as u8);
            self.write_block(layout.inten_clr + desc.offset, &[desc.mask])
                .await?;
            self.write_block(layout.events_clr + desc.offset, &[desc.mask])
                .await?;
        }
        Ok(())
    }

    /// Collect and clear pending events.
    ///
    /// The whole EVENTS_SET block is read in one burst and exactly the bytes
    /// read are written back to EVENTS_CLR. An event latched between the two
    /// transfers is therefore left pending and reported by the next call.
    #[bisync]
    pub async fn process_events(&mut self) -> Result<EventSet, PmicError<I2cBusErr>> {
        let layout = self.events;
        let mut buf = [0u8; MAX_EVENT_BLOCK_LEN];
        let block = &mut buf[..layout.len];
        self.read_block(layout.events_set, block).await?;
        self.write_block(layout.events_clr, block).await?;

        let pending = layout.decode(block);
        if !pending.is_empty() {
            debug!("pending events: {:?}", pending);
        }
        Ok(pending)
    }

    /// Program the timer period and function. The period has 16 ms resolution.
    #[bisync]
    pub async fn set_timer(
        &mut self,
        time_ms: u32,
        mode: TimerMode,
    ) -> Result<(), PmicError<I2cBusErr>> {
        let ticks = time_ms / TIMER_PRESCALER_MS;
        if ticks > TIMER_MAX_TICKS {
            return Err(PmicError::InvalidArgument("timer period too long"));
        }

        let target = ticks.to_be_bytes();
        self.write_block(TIMER_TARGET, &target[1..]).await?;

        let mut op = self.ll.timer_config();
        write_internal(&mut op, |r| r.set_mode(mode as u8)).await
    }

    #[bisync]
    pub async fn start_timer(&mut self) -> Result<(), PmicError<I2cBusErr>> {
        let mut op = self.ll.timer_tasks_start();
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    #[bisync]
    pub async fn stop_timer(&mut self) -> Result<(), PmicError<I2cBusErr>> {
        let mut op = self.ll.timer_tasks_stop();
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    /// Trigger a full PMIC reset
    #[bisync]
    pub async fn reset(&mut self) -> Result<(), PmicError<I2cBusErr>> {
        let mut op = self.ll.reset_tasks_reset();
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    /// Enter hibernate, waking up after `time_ms`
    #[bisync]
    pub async fn hibernate(&mut self, time_ms: u32) -> Result<(), PmicError<I2cBusErr>> {
        self.set_timer(time_ms, TimerMode::Wakeup).await?;
        info!("hibernating for {} ms", time_ms);
        let mut op = self.ll.hibernate_tasks_hiber();
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    /// Set the output voltage to the highest step within `[min_uv, max_uv]`.
    ///
    /// The boost output is also switched from the VSET pin to software control.
    #[bisync]
    pub async fn set_voltage(
        &mut self,
        source: RegulatorSource,
        min_uv: i32,
        max_uv: i32,
    ) -> Result<(), PmicError<I2cBusErr>> {
        let idx = source.range().get_win_index(min_uv, max_uv)? as u8;
        debug!("set voltage index {}", idx);

        match source {
            RegulatorSource::Boost => {
                let mut op = self.ll.boost_vout();
                write_internal(&mut op, |r| r.set_vout(idx)).await?;
                let mut op = self.ll.boost_voutsel();
                write_internal(&mut op, |r| r.set_software(true)).await
            }
            RegulatorSource::Ldosw => {
                let mut op = self.ll.ldosw_vout();
                write_internal(&mut op, |r| r.set_vout(idx)).await
            }
        }
    }

    /// Programmed output voltage in microvolts
    #[bisync]
    pub async fn get_voltage(
        &mut self,
        source: RegulatorSource,
    ) -> Result<i32, PmicError<I2cBusErr>> {
        let idx = match source {
            RegulatorSource::Boost => {
                let mut op = self.ll.boost_vout();
                read_internal(&mut op).await?.vout()
            }
            RegulatorSource::Ldosw => {
                let mut op = self.ll.ldosw_vout();
                read_internal(&mut op).await?.vout()
            }
        };
        Ok(source.range().get_value(idx as u16)?)
    }

    /// Enable an output. The boost is always on, so this only acts on LDOSW.
    #[bisync]
    pub async fn enable(&mut self, source: RegulatorSource) -> Result<(), PmicError<I2cBusErr>> {
        if source != RegulatorSource::Ldosw {
            return Ok(());
        }
        let mut op = self.ll.ldosw_enable();
        write_internal(&mut op, |r| r.set_enable(true)).await
    }

    #[bisync]
    pub async fn disable(&mut self, source: RegulatorSource) -> Result<(), PmicError<I2cBusErr>> {
        if source != RegulatorSource::Ldosw {
            return Ok(());
        }
        let mut op = self.ll.ldosw_enable();
        write_internal(&mut op, |r| r.set_enable(false)).await
    }

    /// Apply a regulator operating mode.
    ///
    /// Boost: the normal mode goes to BOOST.OPER, an optional forced mode to
    /// BOOST.PIN. LDOSW: a plain normal mode selects software control; a
    /// forced mode hands control to the GPIO with the normal mode used while
    /// the pin is inactive.
    #[bisync]
    pub async fn set_mode(
        &mut self,
        source: RegulatorSource,
        mode: RegulatorMode,
    ) -> Result<(), PmicError<I2cBusErr>> {
        match source {
            RegulatorSource::Boost => self.set_boost_mode(mode).await,
            RegulatorSource::Ldosw => self.set_ldosw_mode(mode).await,
        }
    }

    #[bisync]
    async fn set_boost_mode(&mut self, mode: RegulatorMode) -> Result<(), PmicError<I2cBusErr>> {
        let oper = match mode.normal {
            OperMode::Auto => 0,
            OperMode::LowPower => 1,
            OperMode::HighPower => 2,
            OperMode::PassThrough => 3,
            OperMode::NoHighPower => 4,
            OperMode::UltraLowPower | OperMode::Off => {
                return Err(PmicError::NotSupported("boost normal mode"));
            }
        };
        let mut op = self.ll.boost_oper();
        modify_internal(&mut op, |r| r.set_mode(oper)).await?;

        let Some(forced) = mode.forced else {
            return Ok(());
        };
        let force = match forced {
            ForcedMode::HighPower => 0,
            ForcedMode::LowPower => 1,
            ForcedMode::UltraLowPower => 2,
            ForcedMode::PassThrough => 3,
            ForcedMode::NoHighPower => 4,
        };
        let mut op = self.ll.boost_pin();
        write_internal(&mut op, |r| r.set_force(force)).await
    }

    #[bisync]
    async fn set_ldosw_mode(&mut self, mode: RegulatorMode) -> Result<(), PmicError<I2cBusErr>> {
        // (pin inactive, pin active): inactive 0 = off, 1 = ULP; active 0 = HP, 1 = ULP
        let (inactive, active) = match (mode.normal, mode.forced) {
            (normal, None) => {
                let oper = match normal {
                    OperMode::Auto => 0,
                    OperMode::UltraLowPower => 1,
                    OperMode::HighPower => 2,
                    _ => return Err(PmicError::NotSupported("LDOSW normal mode")),
                };
                let mut op = self.ll.ldosw_sel();
                return write_internal(&mut op, |r| r.set_oper(oper)).await;
            }
            (OperMode::Off, Some(ForcedMode::UltraLowPower)) => (0, 1),
            (OperMode::Off, Some(ForcedMode::HighPower)) => (0, 0),
            (OperMode::UltraLowPower, Some(ForcedMode::HighPower)) => (1, 0),
            _ => return Err(PmicError::NotSupported("LDOSW forced mode")),
        };

        let mut op = self.ll.ldosw_pininact();
        write_internal(&mut op, |r| r.set_mode(inactive)).await?;
        let mut op = self.ll.ldosw_pinact();
        write_internal(&mut op, |r| r.set_mode(active)).await?;
        let mut op = self.ll.ldosw_sel();
        write_internal(&mut op, |r| r.set_oper(3)).await
    }

    /// Select the GPIO that forces the regulator into its pin-controlled mode
    #[bisync]
    pub async fn set_pin_ctrl(
        &mut self,
        source: RegulatorSource,
        pin: u8,
        active_low: bool,
    ) -> Result<(), PmicError<I2cBusErr>> {
        if pin >= GPIO_PIN_COUNT {
            return Err(PmicError::InvalidArgument("GPIO pin"));
        }
        match source {
            RegulatorSource::Boost => {
                let mut op = self.ll.boost_gpio();
                write_internal(&mut op, |r| {
                    r.set_pin(pin + 1);
                    r.set_inverted(active_low);
                })
                .await
            }
            RegulatorSource::Ldosw => {
                let mut op = self.ll.ldosw_gpio();
                write_internal(&mut op, |r| {
                    r.set_pin(pin + 1);
                    r.set_inverted(active_low);
                })
                .await
            }
        }
    }

    /// Enter ship mode. Only a wake-up on the SHPHLD pin brings the PMIC back.
    #[bisync]
    pub async fn ship_mode(&mut self) -> Result<(), PmicError<I2cBusErr>> {
        warn!("entering ship mode");
        let mut op = self.ll.ship_task_ship();
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    #[bisync]
    pub async fn configure_gpio(
        &mut self,
        pin: u8,
        usage: GpioUsage,
        config: GpioConfig,
    ) -> Result<(), PmicError<I2cBusErr>> {
        if pin >= GPIO_PIN_COUNT {
            return Err(PmicError::InvalidArgument("GPIO pin"));
        }
        let mut op = self.ll.gpio_usage(pin as usize);
        write_internal(&mut op, |r| r.set_usage(usage as u8)).await?;

        let mut op = self.ll.gpio_config(pin as usize);
        write_internal(&mut op, |r| {
            r.set_input(config.input);
            r.set_output(config.output);
            r.set_open_drain(config.open_drain);
            r.set_pull_down(config.pull_down);
            r.set_pull_up(config.pull_up);
            r.set_drive(config.drive);
            r.set_debounce(config.debounce);
        })
        .await
    }

    #[bisync]
    pub async fn set_gpio(&mut self, pin: u8, high: bool) -> Result<(), PmicError<I2cBusErr>> {
        if pin >= GPIO_PIN_COUNT {
            return Err(PmicError::InvalidArgument("GPIO pin"));
        }
        let mut op = self.ll.gpio_output(pin as usize);
        write_internal(&mut op, |r| r.set_high(high)).await
    }

    #[bisync]
    pub async fn get_gpio(&mut self, pin: u8) -> Result<bool, PmicError<I2cBusErr>> {
        if pin >= GPIO_PIN_COUNT {
            return Err(PmicError::InvalidArgument("GPIO pin"));
        }
        let mut op = self.ll.gpio_read();
        let levels = read_internal(&mut op).await?.levels();
        Ok(levels & (1 << pin) != 0)
    }

    /// Set the averaging used by subsequent readings of `chan`
    pub fn set_adc_oversampling(
        &mut self,
        chan: AdcChannel,
        oversampling: AdcOversampling,
    ) -> Result<(), PmicError<I2cBusErr>> {
        let config = self
            .adc
            .get_mut(chan as usize)
            .ok_or(PmicError::InvalidArgument("ADC channel has no conversion"))?;
        config.oversampling = oversampling;
        Ok(())
    }

    pub fn adc_config(&self, chan: AdcChannel) -> Option<AdcChannelConfig> {
        self.adc.get(chan as usize).copied()
    }

    /// Start a conversion on `chan`. The DPS counter needs no conversion.
    #[bisync]
    pub async fn take_reading(&mut self, chan: AdcChannel) -> Result<(), PmicError<I2cBusErr>> {
        let (Some(scaling), Some(config)) = (chan.scaling(), self.adc_config(chan)) else {
            return Ok(());
        };

        let mut op = self.ll.adc_average();
        write_internal(&mut op, |r| r.set_samples(config.oversampling as u8)).await?;
        let mut op = self.ll.adc_config();
        write_internal(&mut op, |r| r.set_mode(scaling.mode)).await?;
        let mut op = self.ll.adc_tasks_start();
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    /// Last result of `chan`: microvolts, micro-degrees Celsius, or a raw
    /// pulse count for [`AdcChannel::DpsCount`].
    #[bisync]
    pub async fn get_result(&mut self, chan: AdcChannel) -> Result<i32, PmicError<I2cBusErr>> {
        match chan.scaling() {
            Some(scaling) => {
                let mut op = self.ll.adc_results(chan as usize);
                let raw = read_internal(&mut op).await?.value();
                Ok(scaling.convert(raw))
            }
            None => {
                let mut op = self.ll.boost_dpscount();
                Ok(read_internal(&mut op).await?.count() as i32)
            }
        }
    }

    #[bisync]
    pub async fn attr_get(&mut self, attr: AdcAttribute) -> Result<i32, PmicError<I2cBusErr>> {
        let raw = match attr {
            AdcAttribute::VbatMinH => read_internal(&mut self.ll.boost_vbatminh()).await?.value(),
            AdcAttribute::VbatMinL => read_internal(&mut self.ll.boost_vbatminl()).await?.value(),
            AdcAttribute::VoutDps => read_internal(&mut self.ll.boost_voutdps()).await?.value(),
            AdcAttribute::VoutMin => read_internal(&mut self.ll.boost_voutmin()).await?.value(),
            AdcAttribute::VoutWarn => read_internal(&mut self.ll.boost_voutwrn()).await?.value(),
            AdcAttribute::DpsLimit => read_internal(&mut self.ll.boost_dpslimit()).await?.limit(),
        };
        Ok(attr.range().get_value(raw as u16)?)
    }

    /// Program a threshold attribute; the value snaps to the nearest step
    /// and is clamped to the attribute's range.
    #[bisync]
    pub async fn attr_set(
        &mut self,
        attr: AdcAttribute,
        value: i32,
    ) -> Result<(), PmicError<I2cBusErr>> {
        let raw = attr.range().get_index(value) as u8;
        match attr {
            AdcAttribute::VbatMinH => {
                write_internal(&mut self.ll.boost_vbatminh(), |r| r.set_value(raw)).await
            }
            AdcAttribute::VbatMinL => {
                write_internal(&mut self.ll.boost_vbatminl(), |r| r.set_value(raw)).await
            }
            AdcAttribute::VoutDps => {
                write_internal(&mut self.ll.boost_voutdps(), |r| r.set_value(raw)).await
            }
            AdcAttribute::VoutMin => {
                write_internal(&mut self.ll.boost_voutmin(), |r| r.set_value(raw)).await
            }
            AdcAttribute::VoutWarn => {
                write_internal(&mut self.ll.boost_voutwrn(), |r| r.set_value(raw)).await
            }
            AdcAttribute::DpsLimit => {
                write_internal(&mut self.ll.boost_dpslimit(), |r| r.set_limit(raw)).await
            }
        }
    }

    /// Arm the watchdog with the given timeout and expiry behaviour
    #[bisync]
    pub async fn watchdog_init(
        &mut self,
        timeout_ms: u32,
        mode: WatchdogMode,
    ) -> Result<(), PmicError<I2cBusErr>> {
        self.set_timer(timeout_ms, mode.into()).await?;
        self.start_timer().await
    }

    #[bisync]
    pub async fn watchdog_feed(&mut self) -> Result<(), PmicError<I2cBusErr>> {
        let mut op = self.ll.timer_tasks_kick();
        write_internal(&mut op, |r| r.set_task(true)).await
    }

    #[bisync]
    pub async fn watchdog_disable(&mut self) -> Result<(), PmicError<I2cBusErr>> {
        self.stop_timer().await
    }
}
