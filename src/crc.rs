use embedded_hal::digital::OutputPin;

use crate::{
    consts::{
        PCDCommand, PCDRegister, DIV_IRQ_CRC, FIFO_FLUSH, FIFO_SIZE, MAX_CRC_POLL_ITERS,
    },
    Error, Fault, IrqSignal, Transport, RC522,
};

impl<T, C, I> RC522<T, C, I>
where
    T: Transport,
    C: OutputPin,
    I: IrqSignal,
{
    /// CRC_A of `data` computed by the chip coprocessor, low byte first.
    ///
    /// The result registers are read even if CRCIRq never showed up within
    /// [`MAX_CRC_POLL_ITERS`] polls.
    pub async fn compute_crc(&mut self, data: &[u8]) -> Result<[u8; 2], Error<T::Error>> {
        if data.len() > FIFO_SIZE {
            return Err(Fault::BufferTooLong.into());
        }

        self.clear_bits(PCDRegister::DivIrqReg, DIV_IRQ_CRC).await?;
        self.set_bits(PCDRegister::FIFOLevelReg, FIFO_FLUSH).await?;

        for &byte in data {
            self.write_reg(PCDRegister::FIFODataReg, byte).await?;
        }

        self.write_reg(PCDRegister::CommandReg, PCDCommand::CalcCRC)
            .await?;

        let mut done = false;
        for _ in 0..MAX_CRC_POLL_ITERS {
            let n = self.read_reg(PCDRegister::DivIrqReg).await?;
            if n & DIV_IRQ_CRC != 0 {
                done = true;
                break;
            }
        }

        if !done {
            log::trace!("crc not signalled after {MAX_CRC_POLL_ITERS} polls");
        }

        let low = self.read_reg(PCDRegister::CRCResultRegL).await?;
        let high = self.read_reg(PCDRegister::CRCResultRegH).await?;
        Ok([low, high])
    }

    /// Append the chip CRC of `frame[..len]` at `frame[len..len + 2]`.
    pub(crate) async fn append_crc(
        &mut self,
        frame: &mut [u8],
        len: usize,
    ) -> Result<(), Error<T::Error>> {
        let crc = self.compute_crc(&frame[..len]).await?;
        frame[len..len + 2].copy_from_slice(&crc);

        Ok(())
    }
}
