#![cfg_attr(not(test), no_std)]

use consts::{
    PCDCommand, PCDRegister, COMMAND_POWER_DOWN, STATUS2_CRYPTO1_ON, TX_CONTROL_ANTENNA,
};
use embedded_hal::digital::OutputPin;

pub mod command;
pub mod config;
pub mod consts;
pub mod crc;
pub mod debug;
pub mod error;
pub mod irq;
pub mod mifare;
pub mod picc;
pub mod transport;

pub use command::Exchange;
pub use config::{AntennaGain, Config, ConfigBuilder, PinMode};
pub use error::{ConfigError, Error, Fault};
pub use irq::{IrqSignal, NoIrq};
pub use picc::{AuthMode, RequestMode, TagState, Uid};
pub use transport::{BlockingSpi, NoPin, SpiBusTransport, SpiDeviceTransport, Transport};

/// One reader chip and the card currently talked to.
///
/// The session is the only owner of the bus; every operation takes
/// `&mut self` and runs to completion before the next one starts.
pub struct RC522<T, C = NoPin, I = NoIrq>
where
    T: Transport,
    C: OutputPin,
    I: IrqSignal,
{
    transport: T,
    cs: Option<C>,
    irq: Option<I>,

    antenna_gain: AntennaGain,
    authed: bool,
    state: TagState,

    get_current_time: fn() -> u64,
}

impl<T> RC522<T, NoPin, NoIrq>
where
    T: Transport,
{
    /// `get_current_time` must return a monotonic time in microseconds.
    ///
    /// Nothing is sent to the chip until [`RC522::init`].
    pub fn new(transport: T, config: &Config, get_current_time: fn() -> u64) -> Self {
        Self {
            transport,
            cs: None,
            irq: None,
            antenna_gain: config.antenna_gain,
            authed: false,
            state: TagState::Idle,
            get_current_time,
        }
    }
}

impl<T, C, I> RC522<T, C, I>
where
    T: Transport,
    C: OutputPin,
    I: IrqSignal,
{
    /// Frame every register access with `cs` (driven low while active).
    /// The line is released (high) right away.
    pub fn with_cs<C2: OutputPin>(
        self,
        mut cs: C2,
    ) -> Result<RC522<T, C2, I>, Error<T::Error>> {
        cs.set_high().map_err(|_| Error::Pin)?;
        Ok(RC522 {
            transport: self.transport,
            cs: Some(cs),
            irq: self.irq,
            antenna_gain: self.antenna_gain,
            authed: self.authed,
            state: self.state,
            get_current_time: self.get_current_time,
        })
    }

    /// Enable [`RC522::wait_for_tag`] using the given interrupt signal.
    ///
    /// This is the only switch for irq support; [`Config::pin_irq`] just
    /// tells the caller which line to wire into `irq`.
    pub fn with_irq<I2: IrqSignal>(self, irq: I2) -> RC522<T, C, I2> {
        RC522 {
            transport: self.transport,
            cs: self.cs,
            irq: Some(irq),
            antenna_gain: self.antenna_gain,
            authed: self.authed,
            state: self.state,
            get_current_time: self.get_current_time,
        }
    }

    pub fn release(self) -> T {
        self.transport
    }

    pub fn is_authed(&self) -> bool {
        self.authed
    }

    pub fn state(&self) -> TagState {
        self.state
    }

    pub fn has_irq(&self) -> bool {
        self.irq.is_some()
    }

    pub async fn init(&mut self) -> Result<(), Error<T::Error>> {
        self.reset().await?;
        self.disable_interrupts().await?;

        // timer: TAuto, prescaler 0xD3E (~0.5ms tick), reload 30 (15ms)
        self.write_reg(PCDRegister::TModeReg, 0x8D).await?;
        self.write_reg(PCDRegister::TPrescalerReg, 0x3E).await?;
        self.write_reg(PCDRegister::TReloadRegL, 30).await?;
        self.write_reg(PCDRegister::TReloadRegH, 0).await?;

        // force 100% ASK, CRC preset 0x6363
        self.write_reg(PCDRegister::TxASKReg, 0x40).await?;
        self.write_reg(PCDRegister::ModeReg, 0x3D).await?;

        self.write_reg(PCDRegister::RFCfgReg, self.antenna_gain.register_value())
            .await?;
        self.set_antenna(true).await?;

        Ok(())
    }

    pub async fn reset(&mut self) -> Result<(), Error<T::Error>> {
        self.authed = false;
        self.state = TagState::Idle;
        self.write_reg(PCDRegister::CommandReg, PCDCommand::SoftReset)
            .await?;

        // max 3 tries
        for _ in 0..3 {
            let out = self.read_reg(PCDRegister::CommandReg).await?;
            if out & COMMAND_POWER_DOWN == 0 {
                break;
            }

            self.busy_wait_us(50_000);
        }

        Ok(())
    }

    pub async fn disable_interrupts(&mut self) -> Result<(), Error<T::Error>> {
        self.write_reg(PCDRegister::ComIrqReg, 0x14).await?;
        self.write_reg(PCDRegister::ComIEnReg, 0x80).await?;
        self.write_reg(PCDRegister::DivIEnReg, 0x00).await?;
        self.write_reg(PCDRegister::DivIrqReg, 0x00).await?;

        Ok(())
    }

    pub async fn set_antenna(&mut self, on: bool) -> Result<(), Error<T::Error>> {
        if on {
            let val = self.read_reg(PCDRegister::TxControlReg).await?;
            if val & TX_CONTROL_ANTENNA != TX_CONTROL_ANTENNA {
                self.write_reg(PCDRegister::TxControlReg, val | TX_CONTROL_ANTENNA)
                    .await?;
            }

            Ok(())
        } else {
            self.clear_bits(PCDRegister::TxControlReg, TX_CONTROL_ANTENNA)
                .await
        }
    }

    pub fn antenna_gain(&self) -> AntennaGain {
        self.antenna_gain
    }

    /// Set the receiver gain, `0..=7`. Out of range values are rejected
    /// without touching the bus.
    pub async fn set_antenna_gain(&mut self, gain: u8) -> Result<(), Error<T::Error>> {
        let gain = AntennaGain::try_from(gain)?;
        self.antenna_gain = gain;
        self.write_reg(PCDRegister::RFCfgReg, gain.register_value())
            .await
    }

    pub async fn version(&mut self) -> Result<u8, Error<T::Error>> {
        self.read_reg(PCDRegister::VersionReg).await
    }

    /// Switch Crypto1 off if a sector is still authenticated. Safe to call
    /// any number of times.
    pub async fn cleanup(&mut self) -> Result<(), Error<T::Error>> {
        if self.authed {
            self.stop_crypto().await?;
        }

        Ok(())
    }

    pub async fn stop_crypto(&mut self) -> Result<(), Error<T::Error>> {
        self.clear_bits(PCDRegister::Status2Reg, STATUS2_CRYPTO1_ON)
            .await?;
        self.authed = false;
        if self.state == TagState::Authenticated {
            self.state = TagState::Selected;
        }

        Ok(())
    }

    pub async fn set_bits(&mut self, reg: u8, mask: u8) -> Result<(), Error<T::Error>> {
        let tmp = self.read_reg(reg).await?;
        self.write_reg(reg, tmp | mask).await
    }

    pub async fn clear_bits(&mut self, reg: u8, mask: u8) -> Result<(), Error<T::Error>> {
        let tmp = self.read_reg(reg).await?;
        self.write_reg(reg, tmp & !mask).await
    }

    pub async fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), Error<T::Error>> {
        let mut frame = [(reg << 1) & 0x7E, val];
        self.spi_transfer(&mut frame).await
    }

    pub async fn read_reg(&mut self, reg: u8) -> Result<u8, Error<T::Error>> {
        let mut frame = [((reg << 1) & 0x7E) | 0x80, 0];
        self.spi_transfer(&mut frame).await?;

        Ok(frame[1])
    }

    async fn spi_transfer(&mut self, frame: &mut [u8]) -> Result<(), Error<T::Error>> {
        if let Some(cs) = self.cs.as_mut() {
            cs.set_low().map_err(|_| Error::Pin)?;
        }

        let res = self.transport.transfer(frame).await.map_err(Error::Bus);

        if let Some(cs) = self.cs.as_mut() {
            cs.set_high().map_err(|_| Error::Pin)?;
        }

        res
    }

    fn now(&self) -> u64 {
        (self.get_current_time)()
    }

    fn busy_wait_us(&self, us: u64) {
        let start_time = self.now();
        while self.now().wrapping_sub(start_time) < us {}
    }
}
