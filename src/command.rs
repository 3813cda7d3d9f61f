use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::{
    consts::{
        ComIrq, PCDCommand, PCDRegister, BIT_FRAMING_START_SEND, ERROR_REG_MASK, FIFO_FLUSH,
        FIFO_SIZE, MAX_COMMAND_POLL_ITERS, MAX_RESPONSE_LEN,
    },
    Error, Fault, IrqSignal, Transport, RC522,
};

/// Result of one chip command: the fault (if any), the bytes drained from
/// the FIFO and the number of valid response bits.
///
/// A faulted exchange may still carry data (the chip timer case), callers
/// that only want clean responses use [`Exchange::ok`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Exchange {
    pub fault: Option<Fault>,
    pub data: Vec<u8, MAX_RESPONSE_LEN>,
    pub bits: usize,
}

impl Exchange {
    pub fn is_err(&self) -> bool {
        self.fault.is_some()
    }

    pub fn ok(self) -> Result<Self, Fault> {
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(self),
        }
    }

    fn failed(fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..Default::default()
        }
    }
}

/// (enable mask, wait-for bits) for a chip command.
fn irq_masks(cmd: u8) -> (u8, u8) {
    match cmd {
        PCDCommand::MFAuthent => (ComIrq::Idle | ComIrq::Err, ComIrq::Idle),
        PCDCommand::Transceive => (0x77, ComIrq::Rx | ComIrq::Idle),
        _ => (0x00, 0x00),
    }
}

impl<T, C, I> RC522<T, C, I>
where
    T: Transport,
    C: OutputPin,
    I: IrqSignal,
{
    /// Load `data` into the FIFO, run `cmd` and collect the answer.
    ///
    /// Only bus failures are returned as `Err`; everything the chip reports
    /// ends up in [`Exchange::fault`].
    pub async fn card_write(&mut self, cmd: u8, data: &[u8]) -> Result<Exchange, Error<T::Error>> {
        if data.len() > FIFO_SIZE {
            return Err(Fault::BufferTooLong.into());
        }

        let (irq_en, wait_irq) = irq_masks(cmd);

        self.write_reg(PCDRegister::ComIEnReg, irq_en | ComIrq::Set1)
            .await?;
        self.clear_bits(PCDRegister::ComIrqReg, ComIrq::Set1).await?;
        self.set_bits(PCDRegister::FIFOLevelReg, FIFO_FLUSH).await?;
        self.write_reg(PCDRegister::CommandReg, PCDCommand::Idle)
            .await?;

        for &byte in data {
            self.write_reg(PCDRegister::FIFODataReg, byte).await?;
        }

        self.write_reg(PCDRegister::CommandReg, cmd).await?;
        if cmd == PCDCommand::Transceive {
            self.set_bits(PCDRegister::BitFramingReg, BIT_FRAMING_START_SEND)
                .await?;
        }

        let mut irq = None;
        for _ in 0..MAX_COMMAND_POLL_ITERS {
            let n = self.read_reg(PCDRegister::ComIrqReg).await?;
            if n & (ComIrq::Timer | wait_irq) != 0 {
                irq = Some(n);
                break;
            }
        }

        self.clear_bits(PCDRegister::BitFramingReg, BIT_FRAMING_START_SEND)
            .await?;

        let Some(irq) = irq else {
            log::trace!("command {cmd:#04x} not finished after {MAX_COMMAND_POLL_ITERS} polls");
            return Ok(Exchange::failed(Fault::Timeout));
        };

        let error_reg = self.read_reg(PCDRegister::ErrorReg).await?;
        if error_reg & ERROR_REG_MASK != 0 {
            log::warn!("Error E2 ({error_reg:#04x})");
            return Ok(Exchange::failed(Fault::Chip(error_reg & ERROR_REG_MASK)));
        }

        let mut exchange = Exchange::default();
        if irq & irq_en & ComIrq::Timer != 0 {
            // no answer before the chip timer ran out, whatever is in the
            // fifo is still drained below
            log::warn!("Error E1");
            exchange.fault = Some(Fault::Irq);
        }

        if cmd == PCDCommand::Transceive {
            let level = self.read_reg(PCDRegister::FIFOLevelReg).await? as usize;
            let last_bits = (self.read_reg(PCDRegister::ControlReg).await? & 0x07) as usize;

            exchange.bits = if last_bits != 0 {
                level.saturating_sub(1) * 8 + last_bits
            } else {
                level * 8
            };

            let count = level.clamp(1, MAX_RESPONSE_LEN);
            for _ in 0..count {
                let byte = self.read_reg(PCDRegister::FIFODataReg).await?;
                // count is clamped to the capacity
                _ = exchange.data.push(byte);
            }
        }

        Ok(exchange)
    }
}
