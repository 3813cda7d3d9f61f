#![allow(dead_code)]

use std::{
    cell::Cell,
    collections::VecDeque,
    convert::Infallible,
    rc::Rc,
};

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_rc522::{
    consts::{PCDCommand, PCDRegister},
    Config, IrqSignal, Transport, RC522,
};

/// What the simulated card does with the next frame it receives.
#[derive(Debug, Clone)]
pub enum Reply {
    Data { bytes: Vec<u8>, last_bits: u8 },
    /// No card: the chip timer expires.
    Silent,
    /// Chip never raises any irq bit.
    Hang,
    ChipError(u8),
    /// MFAuthent finishes, with or without Crypto1 switched on.
    Auth(bool),
}

impl Reply {
    pub fn bytes(bytes: &[u8]) -> Self {
        Reply::Data {
            bytes: bytes.to_vec(),
            last_bits: 0,
        }
    }

    pub fn ack() -> Self {
        Reply::Data {
            bytes: vec![0x0A],
            last_bits: 4,
        }
    }

    pub fn nak() -> Self {
        Reply::Data {
            bytes: vec![0x04],
            last_bits: 4,
        }
    }

    pub fn atqa() -> Self {
        Reply::bytes(&[0x04, 0x00])
    }

    /// Anti-collision answer: four uid bytes and their BCC.
    pub fn uid(uid: [u8; 4]) -> Self {
        let bcc = uid.iter().fold(0, |acc, b| acc ^ b);
        Reply::bytes(&[uid[0], uid[1], uid[2], uid[3], bcc])
    }

    /// SAK + CRC.
    pub fn sak(sak: u8) -> Self {
        let crc = crc_a(&[sak]);
        Reply::bytes(&[sak, crc[0], crc[1]])
    }
}

/// ISO 14443-3 CRC_A, low byte first.
pub fn crc_a(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0x6363;
    for &b in data {
        let mut ch = b ^ (crc & 0xFF) as u8;
        ch ^= ch << 4;
        crc = (crc >> 8) ^ ((ch as u16) << 8) ^ ((ch as u16) << 3) ^ ((ch as u16) >> 4);
    }

    crc.to_le_bytes()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(u8),
    Write(u8, u8),
}

/// Register level model of the reader chip with one scripted card.
pub struct SimChip {
    pub regs: [u8; 64],
    fifo: VecDeque<u8>,
    pub replies: VecDeque<Reply>,
    /// Frames handed to the card (transceive and authenticate).
    pub frames: Vec<Vec<u8>>,
    pub crc_inputs: Vec<Vec<u8>>,
    pub accesses: Vec<Access>,
    pub raw: Vec<Vec<u8>>,
    pub crc_stall: bool,
    /// Shared with a [`CsPin`]; `true` while the line is high.
    pub cs_line: Option<Rc<Cell<bool>>>,
    pub transfers_without_cs: usize,
}

impl SimChip {
    pub fn new() -> Self {
        let mut sim = Self {
            regs: [0; 64],
            fifo: VecDeque::new(),
            replies: VecDeque::new(),
            frames: Vec::new(),
            crc_inputs: Vec::new(),
            accesses: Vec::new(),
            raw: Vec::new(),
            crc_stall: false,
            cs_line: None,
            transfers_without_cs: 0,
        };
        sim.power_on();
        sim
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        let mut sim = Self::new();
        sim.replies.extend(replies);
        sim
    }

    fn power_on(&mut self) {
        self.regs = [0; 64];
        self.regs[PCDRegister::CommandReg as usize] = 0x20;
        self.regs[PCDRegister::TxControlReg as usize] = 0x80;
        self.regs[PCDRegister::RFCfgReg as usize] = 0x48;
        self.regs[PCDRegister::VersionReg as usize] = 0x92;
        self.fifo.clear();
    }

    pub fn reads_of(&self, reg: u8) -> usize {
        self.accesses
            .iter()
            .filter(|a| **a == Access::Read(reg))
            .count()
    }

    pub fn writes_to(&self, reg: u8) -> Vec<u8> {
        self.accesses
            .iter()
            .filter_map(|a| match *a {
                Access::Write(r, v) if r == reg => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn reg(&self, reg: u8) -> u8 {
        self.regs[reg as usize]
    }

    fn read(&mut self, reg: u8) -> u8 {
        self.accesses.push(Access::Read(reg));
        match reg {
            PCDRegister::FIFODataReg => self.fifo.pop_front().unwrap_or(0),
            PCDRegister::FIFOLevelReg => self.fifo.len() as u8,
            _ => self.regs[reg as usize],
        }
    }

    fn write(&mut self, reg: u8, val: u8) {
        self.accesses.push(Access::Write(reg, val));
        match reg {
            PCDRegister::FIFODataReg => self.fifo.push_back(val),
            PCDRegister::FIFOLevelReg => {
                if val & 0x80 != 0 {
                    self.fifo.clear();
                }
            }
            PCDRegister::ComIrqReg | PCDRegister::DivIrqReg => {
                // bit 7 selects whether the marked bits get set or cleared
                let r = &mut self.regs[reg as usize];
                if val & 0x80 != 0 {
                    *r |= val & 0x7F;
                } else {
                    *r &= !(val & 0x7F);
                }
            }
            PCDRegister::CommandReg => {
                self.regs[reg as usize] = val;
                self.command(val & 0x0F);
            }
            PCDRegister::BitFramingReg => {
                self.regs[reg as usize] = val;
                let cmd = self.regs[PCDRegister::CommandReg as usize] & 0x0F;
                if val & 0x80 != 0 && cmd == PCDCommand::Transceive {
                    self.transmit();
                }
            }
            _ => self.regs[reg as usize] = val,
        }
    }

    fn command(&mut self, cmd: u8) {
        match cmd {
            PCDCommand::SoftReset => {
                self.power_on();
                self.regs[PCDRegister::CommandReg as usize] = 0x00;
            }
            PCDCommand::CalcCRC => {
                let input: Vec<u8> = self.fifo.drain(..).collect();
                self.crc_inputs.push(input.clone());
                if !self.crc_stall {
                    let crc = crc_a(&input);
                    self.regs[PCDRegister::CRCResultRegL as usize] = crc[0];
                    self.regs[PCDRegister::CRCResultRegH as usize] = crc[1];
                    self.regs[PCDRegister::DivIrqReg as usize] |= 0x04;
                }
            }
            PCDCommand::MFAuthent => {
                let frame: Vec<u8> = self.fifo.drain(..).collect();
                self.frames.push(frame);
                let reply = self.replies.pop_front().unwrap_or(Reply::Hang);
                self.answer(reply);
            }
            _ => {}
        }
    }

    fn transmit(&mut self) {
        let frame: Vec<u8> = self.fifo.drain(..).collect();
        self.frames.push(frame);
        let reply = self.replies.pop_front().unwrap_or(Reply::Silent);
        self.answer(reply);
    }

    fn answer(&mut self, reply: Reply) {
        let mut error = 0;
        let mut last_bits = 0;
        let irq = match reply {
            Reply::Data { bytes, last_bits: bits } => {
                self.fifo.extend(bytes);
                last_bits = bits & 0x07;
                0x30
            }
            Reply::Silent => 0x01,
            Reply::Hang => 0x00,
            Reply::ChipError(bits) => {
                error = bits;
                0x32
            }
            Reply::Auth(ok) => {
                if ok {
                    self.regs[PCDRegister::Status2Reg as usize] |= 0x08;
                }
                0x10
            }
        };

        self.regs[PCDRegister::ErrorReg as usize] = error;
        self.regs[PCDRegister::ControlReg as usize] = last_bits;
        self.regs[PCDRegister::ComIrqReg as usize] |= irq;
    }
}

impl Transport for SimChip {
    type Error = Infallible;

    async fn transfer(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        assert_eq!(buf.len(), 2, "register frames are two bytes");
        self.raw.push(buf.to_vec());
        if let Some(line) = &self.cs_line {
            if line.get() {
                self.transfers_without_cs += 1;
            }
        }

        let reg = (buf[0] >> 1) & 0x3F;
        if buf[0] & 0x80 != 0 {
            buf[0] = 0;
            buf[1] = self.read(reg);
        } else {
            let val = buf[1];
            self.write(reg, val);
            buf[0] = 0;
            buf[1] = 0;
        }

        Ok(())
    }
}

/// Chip select that records its level into a shared cell.
pub struct CsPin {
    pub line: Rc<Cell<bool>>,
}

impl ErrorType for CsPin {
    type Error = Infallible;
}

impl OutputPin for CsPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.line.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.line.set(true);
        Ok(())
    }
}

/// Chip select whose driver always fails.
pub struct BrokenPin;

impl ErrorType for BrokenPin {
    type Error = embedded_hal::digital::ErrorKind;
}

impl OutputPin for BrokenPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(embedded_hal::digital::ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(embedded_hal::digital::ErrorKind::Other)
    }
}

/// Transport whose bus always fails.
pub struct BrokenBus;

impl Transport for BrokenBus {
    type Error = &'static str;

    async fn transfer(&mut self, _buf: &mut [u8]) -> Result<(), Self::Error> {
        Err("bus fault")
    }
}

/// Signal that fires on the `fire_on`-th wait (1-based), never if `None`.
#[derive(Default)]
pub struct MockIrq {
    pub fire_on: Option<usize>,
    pub waits: Vec<u64>,
    pub clears: usize,
}

impl IrqSignal for MockIrq {
    fn clear(&mut self) {
        self.clears += 1;
    }

    async fn wait(&mut self, timeout_us: u64) -> bool {
        self.waits.push(timeout_us);
        self.fire_on == Some(self.waits.len())
    }
}

thread_local! {
    static NOW: Cell<u64> = const { Cell::new(0) };
}

/// Fake microsecond clock, 1ms passes on every read.
pub fn clock() -> u64 {
    NOW.with(|now| {
        let t = now.get();
        now.set(t + 1_000);
        t
    })
}

pub fn config() -> Config {
    Config::builder().pin_rst(22).build().unwrap()
}

pub fn reader(sim: &mut SimChip) -> RC522<&mut SimChip> {
    RC522::new(sim, &config(), clock)
}
