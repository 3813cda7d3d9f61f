use core::{fmt::Write, str::FromStr};
use heapless::String;

use crate::error::ConfigError;

/// Receiver gain field of RFCfgReg.
///
/// | value | gain  |
/// |-------|-------|
/// | 0, 2  | 18 dB |
/// | 1, 3  | 23 dB |
/// | 4     | 33 dB |
/// | 5     | 38 dB |
/// | 6     | 43 dB |
/// | 7     | 48 dB |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AntennaGain(u8);

impl AntennaGain {
    pub const MAX: u8 = 7;

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Value as placed into RFCfgReg.
    pub const fn register_value(self) -> u8 {
        self.0 << 4
    }
}

impl Default for AntennaGain {
    fn default() -> Self {
        Self(4)
    }
}

impl TryFrom<i32> for AntennaGain {
    type Error = ConfigError;

    fn try_from(gain: i32) -> Result<Self, Self::Error> {
        if (0..=Self::MAX as i32).contains(&gain) {
            Ok(Self(gain as u8))
        } else {
            Err(ConfigError::GainOutOfRange(gain))
        }
    }
}

impl TryFrom<u8> for AntennaGain {
    type Error = ConfigError;

    fn try_from(gain: u8) -> Result<Self, Self::Error> {
        Self::try_from(gain as i32)
    }
}

/// Pin numbering used by the host GPIO layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinMode {
    /// Physical header numbering.
    #[default]
    Board,
    /// Broadcom SoC numbering.
    Bcm,
}

impl PinMode {
    /// Name of `pin` as understood by the host GPIO layer, e.g. `BOARD22`.
    pub fn pin_name(self, pin: u8) -> String<8> {
        let mut name = String::new();
        let prefix = match self {
            PinMode::Board => "BOARD",
            PinMode::Bcm => "BCM",
        };

        // "BOARD255" is the longest possible name and fits
        _ = write!(name, "{prefix}{pin}");
        name
    }
}

impl FromStr for PinMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOARD" | "BOARD_DEFAULT" => Ok(PinMode::Board),
            "BCM" => Ok(PinMode::Bcm),
            _ => Err(ConfigError::UnsupportedPinMode),
        }
    }
}

/// Hardware wiring of a reader session.
///
/// The driver itself never opens the bus or toggles pins; this only carries
/// the validated values for the code that does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bus: u8,
    pub device: u8,
    pub speed_hz: u32,
    pub pin_mode: PinMode,
    pub pin_rst: u8,
    pub pin_ce: Option<u8>,
    /// Line to hand to [`crate::RC522::with_irq`]; the session never reads it.
    pub pin_irq: Option<u8>,
    pub antenna_gain: AntennaGain,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn pin_name(&self, pin: u8) -> String<8> {
        self.pin_mode.pin_name(pin)
    }

    pub fn has_irq(&self) -> bool {
        self.pin_irq.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    bus: u8,
    device: u8,
    speed_hz: u32,
    pin_mode: PinMode,
    pin_rst: Option<u8>,
    pin_ce: Option<u8>,
    pin_irq: Option<u8>,
    antenna_gain: i32,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            bus: 0,
            device: 0,
            speed_hz: 1_000_000,
            pin_mode: PinMode::Board,
            pin_rst: None,
            pin_ce: None,
            pin_irq: None,
            antenna_gain: AntennaGain::default().value() as i32,
        }
    }
}

impl ConfigBuilder {
    pub fn bus(mut self, bus: u8, device: u8) -> Self {
        self.bus = bus;
        self.device = device;
        self
    }

    pub fn speed_hz(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    pub fn pin_mode(mut self, pin_mode: PinMode) -> Self {
        self.pin_mode = pin_mode;
        self
    }

    pub fn pin_rst(mut self, pin: u8) -> Self {
        self.pin_rst = Some(pin);
        self
    }

    pub fn pin_ce(mut self, pin: u8) -> Self {
        self.pin_ce = Some(pin);
        self
    }

    pub fn pin_irq(mut self, pin: u8) -> Self {
        self.pin_irq = Some(pin);
        self
    }

    pub fn antenna_gain(mut self, gain: i32) -> Self {
        self.antenna_gain = gain;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        // there is no safe default for the reset line, wrong pin can damage hw
        let pin_rst = match self.pin_rst {
            Some(pin) if pin != 0 => pin,
            _ => return Err(ConfigError::MissingResetPin),
        };

        let antenna_gain = AntennaGain::try_from(self.antenna_gain)?;
        if self.pin_irq.is_none() {
            log::info!("No IRQ pin defined, wait_for_tag() not supported");
        }

        Ok(Config {
            bus: self.bus,
            device: self.device,
            speed_hz: self.speed_hz,
            pin_mode: self.pin_mode,
            pin_rst,
            pin_ce: self.pin_ce.filter(|&p| p != 0),
            pin_irq: self.pin_irq,
            antenna_gain,
        })
    }
}
