use embedded_hal::digital::OutputPin;

use crate::{
    consts::{PICCCommand, BLOCK_LEN},
    Error, Fault, IrqSignal, Transport, RC522,
};

/// MIFARE Classic value block operations. All of them need the sector to be
/// authenticated first.
impl<T, C, I> RC522<T, C, I>
where
    T: Transport,
    C: OutputPin,
    I: IrqSignal,
{
    /// Copy the internal data register into `block`.
    pub async fn transfer(&mut self, block: u8) -> Result<(), Error<T::Error>> {
        self.mifare_transceive(&[PICCCommand::PICC_CMD_MF_TRANSFER, block], false)
            .await
    }

    pub async fn increment(&mut self, block: u8, delta: u32) -> Result<(), Error<T::Error>> {
        self.two_step(PICCCommand::PICC_CMD_MF_INCREMENT, block, delta)
            .await
    }

    pub async fn decrement(&mut self, block: u8, delta: u32) -> Result<(), Error<T::Error>> {
        self.two_step(PICCCommand::PICC_CMD_MF_DECREMENT, block, delta)
            .await
    }

    pub async fn restore(&mut self, block: u8) -> Result<(), Error<T::Error>> {
        self.two_step(PICCCommand::PICC_CMD_MF_RESTORE, block, 0)
            .await
    }

    /// The card does not answer the operand frame, so silence is success there.
    async fn two_step(&mut self, cmd: u8, block: u8, data: u32) -> Result<(), Error<T::Error>> {
        self.mifare_transceive(&[cmd, block], false).await?;
        self.mifare_transceive(&data.to_le_bytes(), true).await
    }

    pub async fn get_value(&mut self, block: u8) -> Result<u32, Error<T::Error>> {
        let buff = self.read(block).await?;
        if !is_value_block(&buff) {
            return Err(Fault::Response.into());
        }

        Ok(u32::from_le_bytes([buff[0], buff[1], buff[2], buff[3]]))
    }

    pub async fn set_value(&mut self, block: u8, value: u32) -> Result<(), Error<T::Error>> {
        self.write(block, &value_block(value, block)).await
    }
}

/// Value block layout: value, !value, value, addr, !addr, addr, !addr.
pub fn value_block(value: u32, addr: u8) -> [u8; BLOCK_LEN] {
    let mut buff = [0; BLOCK_LEN];
    let v = value.to_le_bytes();

    buff[0..4].copy_from_slice(&v);
    for i in 0..4 {
        buff[4 + i] = !v[i];
    }
    buff[8..12].copy_from_slice(&v);

    buff[12] = addr;
    buff[13] = !addr;
    buff[14] = addr;
    buff[15] = !addr;
    buff
}

fn is_value_block(buff: &[u8; BLOCK_LEN]) -> bool {
    (0..4).all(|i| buff[i] == !buff[4 + i] && buff[i] == buff[8 + i])
        && buff[12] == !buff[13]
        && buff[12] == buff[14]
        && buff[13] == buff[15]
}

/// Access bytes 6..9 of a sector trailer for the access conditions `g0..g3`
/// (each `0..=7`, C1C2C3 of blocks 0-2 and the trailer).
pub fn access_bits(g0: u8, g1: u8, g2: u8, g3: u8) -> [u8; 3] {
    let c1 = ((g3 & 4) << 1) | (g2 & 4) | ((g1 & 4) >> 1) | ((g0 & 4) >> 2);
    let c2 = ((g3 & 2) << 2) | ((g2 & 2) << 1) | (g1 & 2) | ((g0 & 2) >> 1);
    let c3 = ((g3 & 1) << 3) | ((g2 & 1) << 2) | ((g1 & 1) << 1) | (g0 & 1);

    [
        ((!c2 & 0xF) << 4) | (!c1 & 0xF),
        (c1 << 4) | (!c3 & 0xF),
        (c3 << 4) | c2,
    ]
}
