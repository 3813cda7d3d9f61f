use core::fmt;

/// Outcome of a chip command that did not go as expected.
///
/// These are ordinary conditions while polling for cards (no tag in the
/// field shows up as [`Fault::Irq`] or [`Fault::Timeout`]) and are left to
/// the caller to retry or ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Command poll budget exhausted without a completion bit.
    Timeout,
    /// ErrorReg reported buffer overflow, collision, parity or protocol error.
    Chip(u8),
    /// Chip timer expired before the card answered (E1).
    Irq,
    /// Anti-collision BCC did not match the UID bytes.
    Bcc,
    /// Response had an unexpected byte or bit length.
    Response,
    /// Card answered a MIFARE command with something other than ACK.
    Nack(u8),
    /// MFAuthent finished but Crypto1 was not switched on.
    Auth,
    /// Payload does not fit into the FIFO.
    BufferTooLong,
}

/// Configuration rejected before any bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    MissingResetPin,
    UnsupportedPinMode,
    GainOutOfRange(i32),
}

#[derive(Debug, PartialEq)]
pub enum Error<E> {
    /// Transport failed to exchange a frame.
    Bus(E),
    /// Chip-select line could not be driven.
    Pin,
    Protocol(Fault),
    Config(ConfigError),
    /// Operation needs hardware that was not configured (irq line).
    Unsupported,
}

impl<E> Error<E> {
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Error::Protocol(f) => Some(*f),
            _ => None,
        }
    }
}

impl<E> From<Fault> for Error<E> {
    fn from(f: Fault) -> Self {
        Error::Protocol(f)
    }
}

impl<E> From<ConfigError> for Error<E> {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Timeout => write!(f, "command timed out"),
            Fault::Chip(bits) => write!(f, "chip error register {bits:#04x}"),
            Fault::Irq => write!(f, "no answer before chip timer expired"),
            Fault::Bcc => write!(f, "uid checksum mismatch"),
            Fault::Response => write!(f, "unexpected response length"),
            Fault::Nack(v) => write!(f, "card did not ack ({v:#04x})"),
            Fault::Auth => write!(f, "authentication failed"),
            Fault::BufferTooLong => write!(f, "payload exceeds fifo"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingResetPin => write!(f, "no reset pin defined"),
            ConfigError::UnsupportedPinMode => write!(f, "unsupported pin mode"),
            ConfigError::GainOutOfRange(g) => {
                write!(f, "antenna gain has to be in the range 0..=7, got {g}")
            }
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus error: {e:?}"),
            Error::Pin => write!(f, "chip select error"),
            Error::Protocol(fault) => fault.fmt(f),
            Error::Config(e) => e.fmt(f),
            Error::Unsupported => write!(f, "waiting not supported without irq line"),
        }
    }
}
