use embedded_hal::digital::OutputPin;

use crate::{
    consts::{PCDCommand, PCDRegister, PICCCommand, BLOCK_LEN, MF_ACK, STATUS2_CRYPTO1_ON},
    Error, Exchange, Fault, IrqSignal, Transport, RC522,
};

/// Where the reader believes the card in the field is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    Idle,
    Requested,
    UidPartial,
    Selected,
    Authenticated,
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// REQA, only cards that are not halted answer.
    #[default]
    Idle,
    /// WUPA, halted cards answer too.
    All,
}

impl RequestMode {
    fn cmd(self) -> u8 {
        match self {
            RequestMode::Idle => PICCCommand::PICC_CMD_REQA,
            RequestMode::All => PICCCommand::PICC_CMD_WUPA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    KeyA,
    KeyB,
}

impl AuthMode {
    fn cmd(self) -> u8 {
        match self {
            AuthMode::KeyA => PICCCommand::PICC_CMD_MF_AUTH_KEY_A,
            AuthMode::KeyB => PICCCommand::PICC_CMD_MF_AUTH_KEY_B,
        }
    }
}

/// Card identifier without cascade tags and check bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uid {
    Single([u8; 4]),
    Double([u8; 7]),
}

impl Uid {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Uid::Single(b) => b.as_slice(),
            Uid::Double(b) => b.as_slice(),
        }
    }

    /// Big-endian integer form, e.g. `[0x12, 0x34, 0x56, 0x78]` is `0x12345678`.
    pub fn as_number(&self) -> u64 {
        self.as_bytes()
            .iter()
            .fold(0u64, |uid, &n| (uid << 8) | n as u64)
    }

    /// Last four bytes, as expected by MFAuthent (all of a single size UID).
    pub fn auth_bytes(&self) -> [u8; 4] {
        let b = self.as_bytes();
        let n = b.len();
        [b[n - 4], b[n - 3], b[n - 2], b[n - 1]]
    }
}

fn bcc_ok(frame: &[u8]) -> bool {
    frame[..4].iter().fold(0, |acc, b| acc ^ b) == frame[4]
}

/// A MIFARE ACK is a single 4 bit frame with 0xA in the low nibble.
pub(crate) fn check_ack(exchange: &Exchange) -> Result<(), Fault> {
    let first = exchange.data.first().copied().unwrap_or(0);
    if exchange.bits != 4 || first & 0x0F != MF_ACK {
        return Err(exchange.fault.unwrap_or(Fault::Nack(first)));
    }

    match exchange.fault {
        Some(fault) => Err(fault),
        None => Ok(()),
    }
}

impl<T, C, I> RC522<T, C, I>
where
    T: Transport,
    C: OutputPin,
    I: IrqSignal,
{
    /// Detect a card and return its UID (4 or 7 bytes).
    ///
    /// No card in the field is an `Err` like any other; the caller decides
    /// whether that is worth reporting.
    pub async fn read_id(&mut self) -> Result<Uid, Error<T::Error>> {
        self.request(RequestMode::Idle).await?;
        let uid = self.anticoll().await?;

        if uid[0] != PICCCommand::PICC_CMD_CT {
            return Ok(Uid::Single([uid[0], uid[1], uid[2], uid[3]]));
        }

        self.select_tag(&uid).await?;
        let uid2 = self.anticoll2().await?;
        self.disable_interrupts().await?;

        Ok(Uid::Double([
            uid[1], uid[2], uid[3], uid2[0], uid2[1], uid2[2], uid2[3],
        ]))
    }

    /// Send REQA/WUPA and return the ATQA.
    pub async fn request(&mut self, mode: RequestMode) -> Result<[u8; 2], Error<T::Error>> {
        self.write_reg(PCDRegister::BitFramingReg, 0x07).await?;

        let res = self
            .card_write(PCDCommand::Transceive, &[mode.cmd()])
            .await?;
        let res = match res.ok() {
            Ok(res) if res.bits == 16 && res.data.len() >= 2 => res,
            Ok(_) => {
                self.state = TagState::Idle;
                return Err(Fault::Response.into());
            }
            Err(fault) => {
                self.state = TagState::Idle;
                return Err(fault.into());
            }
        };

        self.state = TagState::Requested;
        Ok([res.data[0], res.data[1]])
    }

    /// Cascade level 1 anti-collision, returns 4 UID bytes and BCC.
    pub async fn anticoll(&mut self) -> Result<[u8; 5], Error<T::Error>> {
        self.anticoll_level(PICCCommand::PICC_CMD_SEL_CL1).await
    }

    /// Cascade level 2 anti-collision, needed when level 1 started with the
    /// cascade tag.
    pub async fn anticoll2(&mut self) -> Result<[u8; 5], Error<T::Error>> {
        self.anticoll_level(PICCCommand::PICC_CMD_SEL_CL2).await
    }

    async fn anticoll_level(&mut self, sel: u8) -> Result<[u8; 5], Error<T::Error>> {
        self.write_reg(PCDRegister::BitFramingReg, 0x00).await?;

        let res = self
            .card_write(PCDCommand::Transceive, &[sel, PICCCommand::NVB_ANTICOLL])
            .await?
            .ok()?;

        if res.data.len() != 5 {
            return Err(Fault::Response.into());
        }

        if !bcc_ok(&res.data) {
            log::debug!("bcc mismatch in {:02x?}", res.data.as_slice());
            return Err(Fault::Bcc.into());
        }

        self.state = TagState::UidPartial;
        let mut uid = [0; 5];
        uid.copy_from_slice(&res.data);
        Ok(uid)
    }

    /// SELECT (cascade level 1) the card with the given UID and BCC.
    pub async fn select_tag(&mut self, uid: &[u8; 5]) -> Result<(), Error<T::Error>> {
        let mut buff = [0; 9];
        buff[0] = PICCCommand::PICC_CMD_SEL_CL1;
        buff[1] = PICCCommand::NVB_SELECT;
        buff[2..7].copy_from_slice(uid);
        self.append_crc(&mut buff, 7).await?;

        let res = self
            .card_write(PCDCommand::Transceive, &buff)
            .await?
            .ok()?;

        // SAK + CRC
        if res.bits != 24 {
            return Err(Fault::Response.into());
        }

        self.state = TagState::Selected;
        Ok(())
    }

    /// Authenticate `block` with a 6 byte key. The card has to be selected.
    pub async fn card_auth(
        &mut self,
        mode: AuthMode,
        block: u8,
        key: &[u8; 6],
        uid: &[u8; 4],
    ) -> Result<(), Error<T::Error>> {
        let mut buff = [0; 12];
        buff[0] = mode.cmd();
        buff[1] = block;
        buff[2..8].copy_from_slice(key);
        buff[8..12].copy_from_slice(uid);

        let res = self.card_write(PCDCommand::MFAuthent, &buff).await?;
        let status2 = self.read_reg(PCDRegister::Status2Reg).await?;

        res.ok()?;
        if status2 & STATUS2_CRYPTO1_ON == 0 {
            return Err(Fault::Auth.into());
        }

        self.authed = true;
        self.state = TagState::Authenticated;
        Ok(())
    }

    /// Read a 16 byte block. Needs a prior [`RC522::card_auth`] for its sector.
    pub async fn read(&mut self, block: u8) -> Result<[u8; BLOCK_LEN], Error<T::Error>> {
        let mut buff = [PICCCommand::PICC_CMD_MF_READ, block, 0, 0];
        self.append_crc(&mut buff, 2).await?;

        let res = self
            .card_write(PCDCommand::Transceive, &buff)
            .await?
            .ok()?;
        if res.data.len() != BLOCK_LEN {
            return Err(Fault::Response.into());
        }

        let mut out = [0; BLOCK_LEN];
        out.copy_from_slice(&res.data);
        Ok(out)
    }

    /// Write a 16 byte block. The data is only sent once the card acked the
    /// write command.
    pub async fn write(
        &mut self,
        block: u8,
        data: &[u8; BLOCK_LEN],
    ) -> Result<(), Error<T::Error>> {
        self.mifare_transceive(&[PICCCommand::PICC_CMD_MF_WRITE, block], false)
            .await?;
        self.mifare_transceive(data, false).await
    }

    /// Put the card into HALT. Any answer is ignored.
    pub async fn halt(&mut self) -> Result<(), Error<T::Error>> {
        let mut buff = [PICCCommand::PICC_CMD_HLTA, 0, 0, 0];
        self.append_crc(&mut buff, 2).await?;
        self.clear_bits(PCDRegister::Status2Reg, STATUS2_CRYPTO1_ON)
            .await?;

        let res = self.card_write(PCDCommand::Transceive, &buff).await?;
        log::trace!("halt answered with {res:?}");

        self.authed = false;
        self.state = TagState::Halted;
        Ok(())
    }

    /// Send `data` + CRC and expect a MIFARE ACK. With `accept_timeout` a
    /// card that stays silent counts as success.
    pub(crate) async fn mifare_transceive(
        &mut self,
        data: &[u8],
        accept_timeout: bool,
    ) -> Result<(), Error<T::Error>> {
        let mut buff = [0; BLOCK_LEN + 2];
        if data.len() > BLOCK_LEN {
            return Err(Fault::BufferTooLong.into());
        }

        let len = data.len();
        buff[..len].copy_from_slice(data);
        self.append_crc(&mut buff, len).await?;

        let res = self
            .card_write(PCDCommand::Transceive, &buff[..len + 2])
            .await?;
        if accept_timeout && matches!(res.fault, Some(Fault::Irq | Fault::Timeout)) {
            return Ok(());
        }

        check_ack(&res)?;

        Ok(())
    }
}
