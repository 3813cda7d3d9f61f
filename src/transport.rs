use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_async::spi::{Operation, SpiBus, SpiDevice};

/// Full-duplex byte exchange with the chip.
///
/// `transfer` sends `buf` and overwrites it with the bytes clocked in at the
/// same time, so the response always has the request's length.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Error: core::fmt::Debug;

    async fn transfer(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: Transport> Transport for &mut T {
    type Error = T::Error;

    async fn transfer(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).transfer(buf).await
    }
}

/// Async `SpiDevice`; the device asserts its own chip select per transaction.
pub struct SpiDeviceTransport<S>
where
    S: SpiDevice,
{
    spi: S,
}

impl<S> SpiDeviceTransport<S>
where
    S: SpiDevice,
{
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    pub fn release(self) -> S {
        self.spi
    }
}

impl<S> Transport for SpiDeviceTransport<S>
where
    S: SpiDevice,
{
    type Error = S::Error;

    async fn transfer(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi
            .transaction(&mut [Operation::TransferInPlace(buf)])
            .await
    }
}

/// Raw async `SpiBus`, to be paired with `RC522::with_cs` when the chip
/// select line is driven separately.
pub struct SpiBusTransport<S>
where
    S: SpiBus,
{
    spi: S,
}

impl<S> SpiBusTransport<S>
where
    S: SpiBus,
{
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    pub fn release(self) -> S {
        self.spi
    }
}

impl<S> Transport for SpiBusTransport<S>
where
    S: SpiBus,
{
    type Error = S::Error;

    async fn transfer(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.transfer_in_place(buf).await?;
        // cs must not be released while bytes are still shifting out
        self.spi.flush().await
    }
}

/// Blocking `embedded_hal::spi::SpiDevice` (linux spidev, rppal, ...).
pub struct BlockingSpi<S>
where
    S: embedded_hal::spi::SpiDevice,
{
    spi: S,
}

impl<S> BlockingSpi<S>
where
    S: embedded_hal::spi::SpiDevice,
{
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    pub fn release(self) -> S {
        self.spi
    }
}

impl<S> Transport for BlockingSpi<S>
where
    S: embedded_hal::spi::SpiDevice,
{
    type Error = S::Error;

    async fn transfer(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.transfer_in_place(buf)
    }
}

/// Stand-in chip select for sessions that rely on the transport framing.
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
