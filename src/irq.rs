use embedded_hal::digital::OutputPin;

use crate::{
    consts::{ComIrq, PCDCommand, PCDRegister, PICCCommand, IRQ_WAIT_SLICE_US},
    Error, Transport, RC522,
};

/// Single slot event fed by the chip IRQ line.
///
/// Whoever owns the line sets the signal on the falling edge; the driver
/// only clears it and waits on it with a timeout.
#[allow(async_fn_in_trait)]
pub trait IrqSignal {
    fn clear(&mut self);

    /// Wait up to `timeout_us`. Returns `true` if the signal fired.
    async fn wait(&mut self, timeout_us: u64) -> bool;
}

impl<S: IrqSignal> IrqSignal for &mut S {
    fn clear(&mut self) {
        (**self).clear()
    }

    async fn wait(&mut self, timeout_us: u64) -> bool {
        (**self).wait(timeout_us).await
    }
}

/// Marker for sessions without an IRQ line; cannot be constructed.
pub enum NoIrq {}

impl IrqSignal for NoIrq {
    fn clear(&mut self) {
        match *self {}
    }

    async fn wait(&mut self, _timeout_us: u64) -> bool {
        match *self {}
    }
}

impl<T, C, I> RC522<T, C, I>
where
    T: Transport,
    C: OutputPin,
    I: IrqSignal,
{
    /// Block until the IRQ line reports a card or `timeout_us` passes
    /// (`0` waits forever). Returns `true` if a card was signalled.
    ///
    /// The chip only raises the line after a request, so detection is
    /// re-armed every [`IRQ_WAIT_SLICE_US`]. The chip is re-initialized on
    /// return either way.
    pub async fn wait_for_tag(&mut self, timeout_us: u64) -> Result<bool, Error<T::Error>> {
        if self.irq.is_none() {
            return Err(Error::Unsupported);
        }

        log::debug!("wait_for_tag(timeout={timeout_us}us)");
        self.init().await?;
        self.clear_irq();
        self.enable_rx_irq().await?;

        let start_time = self.now();
        let mut fired = false;
        while timeout_us == 0 || self.now().wrapping_sub(start_time) < timeout_us {
            self.init().await?;
            self.enable_rx_irq().await?;

            // start a REQA so a card entering the field pulls the line
            self.write_reg(PCDRegister::FIFODataReg, PICCCommand::PICC_CMD_REQA)
                .await?;
            self.write_reg(PCDRegister::CommandReg, PCDCommand::Transceive)
                .await?;
            self.write_reg(PCDRegister::BitFramingReg, 0x87).await?;

            if let Some(irq) = self.irq.as_mut() {
                fired = irq.wait(IRQ_WAIT_SLICE_US).await;
            }

            if fired {
                break;
            }
        }

        self.clear_irq();
        self.init().await?;
        Ok(fired)
    }

    fn clear_irq(&mut self) {
        if let Some(irq) = self.irq.as_mut() {
            irq.clear();
        }
    }

    async fn enable_rx_irq(&mut self) -> Result<(), Error<T::Error>> {
        self.write_reg(PCDRegister::ComIrqReg, 0x00).await?;
        // IRQ pin active low, RxIEn
        self.write_reg(PCDRegister::ComIEnReg, ComIrq::Set1 | ComIrq::Rx)
            .await
    }
}

#[cfg(feature = "embassy-time")]
pub use embassy::{IrqPin, SignalIrq};

#[cfg(feature = "embassy-time")]
mod embassy {
    use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};
    use embassy_time::{with_timeout, Duration};
    use embedded_hal_async::digital::Wait;

    use super::IrqSignal;

    /// IRQ line read directly through an async edge-capable input.
    pub struct IrqPin<P: Wait> {
        pin: P,
    }

    impl<P: Wait> IrqPin<P> {
        pub fn new(pin: P) -> Self {
            Self { pin }
        }
    }

    impl<P: Wait> IrqSignal for IrqPin<P> {
        // every wait starts on a fresh edge
        fn clear(&mut self) {}

        async fn wait(&mut self, timeout_us: u64) -> bool {
            match with_timeout(
                Duration::from_micros(timeout_us),
                self.pin.wait_for_falling_edge(),
            )
            .await
            {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    log::warn!("irq pin error: {e:?}");
                    false
                }
                Err(_) => false,
            }
        }
    }

    /// IRQ delivered by an interrupt handler through an embassy [`Signal`].
    pub struct SignalIrq<'a, M: RawMutex> {
        signal: &'a Signal<M, ()>,
    }

    impl<'a, M: RawMutex> SignalIrq<'a, M> {
        pub fn new(signal: &'a Signal<M, ()>) -> Self {
            Self { signal }
        }
    }

    impl<M: RawMutex> IrqSignal for SignalIrq<'_, M> {
        fn clear(&mut self) {
            self.signal.reset();
        }

        async fn wait(&mut self, timeout_us: u64) -> bool {
            with_timeout(Duration::from_micros(timeout_us), self.signal.wait())
                .await
                .is_ok()
        }
    }

}
