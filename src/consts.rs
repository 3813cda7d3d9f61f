#![allow(non_upper_case_globals)]

/// Command register polls before `card_write` gives up.
pub const MAX_COMMAND_POLL_ITERS: u16 = 2000;

/// DivIrqReg polls before `compute_crc` reads the result anyway.
pub const MAX_CRC_POLL_ITERS: u16 = 255;

/// Size of the chip FIFO.
pub const FIFO_SIZE: usize = 64;

/// Max bytes drained from the FIFO after a transceive.
pub const MAX_RESPONSE_LEN: usize = 16;

/// Length of a MIFARE data block.
pub const BLOCK_LEN: usize = 16;

/// How long `wait_for_tag` waits on the irq signal before re-arming (us).
pub const IRQ_WAIT_SLICE_US: u64 = 100_000;

pub struct PCDRegister;
impl PCDRegister {
    pub const CommandReg: u8 = 0x01;
    pub const ComIEnReg: u8 = 0x02;
    pub const DivIEnReg: u8 = 0x03;
    pub const ComIrqReg: u8 = 0x04;
    pub const DivIrqReg: u8 = 0x05;
    pub const ErrorReg: u8 = 0x06;
    pub const Status1Reg: u8 = 0x07;
    pub const Status2Reg: u8 = 0x08;
    pub const FIFODataReg: u8 = 0x09;
    pub const FIFOLevelReg: u8 = 0x0A;
    pub const WaterLevelReg: u8 = 0x0B;
    pub const ControlReg: u8 = 0x0C;
    pub const BitFramingReg: u8 = 0x0D;
    pub const CollReg: u8 = 0x0E;

    pub const ModeReg: u8 = 0x11;
    pub const TxModeReg: u8 = 0x12;
    pub const RxModeReg: u8 = 0x13;
    pub const TxControlReg: u8 = 0x14;
    pub const TxASKReg: u8 = 0x15;

    pub const CRCResultRegH: u8 = 0x21;
    pub const CRCResultRegL: u8 = 0x22;
    pub const ModWidthReg: u8 = 0x24;
    pub const RFCfgReg: u8 = 0x26;
    pub const TModeReg: u8 = 0x2A;
    pub const TPrescalerReg: u8 = 0x2B;
    pub const TReloadRegH: u8 = 0x2C;
    pub const TReloadRegL: u8 = 0x2D;

    pub const VersionReg: u8 = 0x37;
}

pub struct PCDCommand;
impl PCDCommand {
    pub const Idle: u8 = 0x00;
    pub const CalcCRC: u8 = 0x03;
    pub const Transmit: u8 = 0x04;
    pub const Receive: u8 = 0x08;
    pub const Transceive: u8 = 0x0C;
    pub const MFAuthent: u8 = 0x0E;
    pub const SoftReset: u8 = 0x0F;
}

/// Bits of ComIrqReg / ComIEnReg.
pub struct ComIrq;
impl ComIrq {
    pub const Set1: u8 = 0x80;
    pub const Tx: u8 = 0x40;
    pub const Rx: u8 = 0x20;
    pub const Idle: u8 = 0x10;
    pub const HiAlert: u8 = 0x08;
    pub const LoAlert: u8 = 0x04;
    pub const Err: u8 = 0x02;
    pub const Timer: u8 = 0x01;
}

/// ErrorReg bits that fail a command: BufferOvfl, CollErr, ParityErr, ProtocolErr.
pub const ERROR_REG_MASK: u8 = 0x1B;
/// DivIrqReg CRCIRq.
pub const DIV_IRQ_CRC: u8 = 0x04;
/// Status2Reg MFCrypto1On.
pub const STATUS2_CRYPTO1_ON: u8 = 0x08;
/// FIFOLevelReg FlushBuffer.
pub const FIFO_FLUSH: u8 = 0x80;
/// BitFramingReg StartSend.
pub const BIT_FRAMING_START_SEND: u8 = 0x80;
/// CommandReg PowerDown.
pub const COMMAND_POWER_DOWN: u8 = 0x10;
/// TxControlReg Tx1RFEn | Tx2RFEn.
pub const TX_CONTROL_ANTENNA: u8 = 0x03;

pub struct PICCCommand;
impl PICCCommand {
    pub const PICC_CMD_REQA: u8 = 0x26;
    pub const PICC_CMD_WUPA: u8 = 0x52;
    pub const PICC_CMD_CT: u8 = 0x88;
    pub const PICC_CMD_SEL_CL1: u8 = 0x93;
    pub const PICC_CMD_SEL_CL2: u8 = 0x95;
    pub const PICC_CMD_SEL_CL3: u8 = 0x97;
    pub const PICC_CMD_HLTA: u8 = 0x50;

    pub const PICC_CMD_MF_AUTH_KEY_A: u8 = 0x60;
    pub const PICC_CMD_MF_AUTH_KEY_B: u8 = 0x61;
    pub const PICC_CMD_MF_READ: u8 = 0x30;
    pub const PICC_CMD_MF_WRITE: u8 = 0xA0;
    pub const PICC_CMD_MF_DECREMENT: u8 = 0xC0;
    pub const PICC_CMD_MF_INCREMENT: u8 = 0xC1;
    pub const PICC_CMD_MF_RESTORE: u8 = 0xC2;
    pub const PICC_CMD_MF_TRANSFER: u8 = 0xB0;

    /// NVB for a full anti-collision request (two bytes sent, no UID bits).
    pub const NVB_ANTICOLL: u8 = 0x20;
    /// NVB for SELECT with all 40 UID+BCC bits.
    pub const NVB_SELECT: u8 = 0x70;
}

/// Low nibble of a MIFARE ACK.
pub const MF_ACK: u8 = 0x0A;
