// libmfc1k/src/reader/mfrc522.rs

//! NXP MFRC522 transceiver on the Raspberry Pi SPI bus.

use std::thread;
use std::time::{Duration, Instant};

use rppal::gpio::{Gpio, OutputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::reader::traits::CardReader;
use crate::types::{BlockAddress, BlockData, Key, KeyKind, RequestMode, TagResponse, TagType, Uid};
use crate::{Error, Result};

/// Default SPI clock
pub const DEFAULT_SPI_CLOCK_HZ: u32 = 1_000_000;

// Upper bound on one transceive, on top of the chip's own 15 ms timer
const SAFETY_TIMEOUT: Duration = Duration::from_millis(25);
const MAX_FIFO_BYTES: usize = 64;
const CASCADE_TAG: u8 = 0x88;
// MIFARE ACK nibble
const ACK: u8 = 0x0A;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Register {
    Command = 0x01,
    ComIEn = 0x02,
    ComIrq = 0x04,
    DivIrq = 0x05,
    Error = 0x06,
    Status2 = 0x08,
    FifoData = 0x09,
    FifoLevel = 0x0A,
    Control = 0x0C,
    BitFraming = 0x0D,
    Mode = 0x11,
    TxControl = 0x14,
    TxAsk = 0x15,
    CrcResultH = 0x21,
    CrcResultL = 0x22,
    TMode = 0x2A,
    TPrescaler = 0x2B,
    TReloadH = 0x2C,
    TReloadL = 0x2D,
    Version = 0x37,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum PcdCommand {
    Idle = 0x00,
    CalcCrc = 0x03,
    Transceive = 0x0C,
    MfAuthent = 0x0E,
    SoftReset = 0x0F,
}

mod picc {
    pub const SEL_CL: [u8; 3] = [0x93, 0x95, 0x97];
    pub const HLTA: u8 = 0x50;
    pub const READ: u8 = 0x30;
    pub const WRITE: u8 = 0xA0;
}

/// MFRC522 driver implementing [`CardReader`].
pub struct Mfrc522Reader {
    spi: Spi,
    reset_pin: Option<OutputPin>,
    request_mode: RequestMode,
}

impl Mfrc522Reader {
    /// Open SPI0/CE0 at `clock_hz`.
    pub fn open(clock_hz: u32) -> Result<Self> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, clock_hz, Mode::Mode0)?;
        Ok(Self::new(spi))
    }

    /// Driver over an already configured SPI bus.
    pub fn new(spi: Spi) -> Self {
        Self {
            spi,
            reset_pin: None,
            request_mode: RequestMode::default(),
        }
    }

    /// Drive the chip's NRSTPD line from BCM pin `pin`, pulsing it low once.
    pub fn with_reset_pin(mut self, pin: u8) -> Result<Self> {
        let mut reset = Gpio::new()?.get(pin)?.into_output();
        reset.set_reset_on_drop(false);
        reset.set_low();
        thread::sleep(Duration::from_millis(100));
        reset.set_high();
        thread::sleep(Duration::from_millis(50));
        self.reset_pin = Some(reset);
        Ok(self)
    }

    /// Choose the request frame. The default wakes halted tags too, so a
    /// card left on the antenna answers again after the HLTA that ends
    /// every command.
    pub fn with_request_mode(mut self, mode: RequestMode) -> Self {
        self.request_mode = mode;
        self
    }

    /// Content of the VersionReg (0x91 or 0x92 for genuine chips).
    pub fn version(&mut self) -> Result<u8> {
        self.read(Register::Version)
    }

    fn write(&mut self, reg: Register, value: u8) -> Result<()> {
        self.spi.write(&[((reg as u8) << 1) & 0x7E, value])?;
        Ok(())
    }

    fn read(&mut self, reg: Register) -> Result<u8> {
        let tx = [(((reg as u8) << 1) & 0x7E) | 0x80, 0];
        let mut rx = [0u8; 2];
        self.spi.transfer(&mut rx, &tx)?;
        Ok(rx[1])
    }

    fn set_bits(&mut self, reg: Register, mask: u8) -> Result<()> {
        let value = self.read(reg)?;
        self.write(reg, value | mask)
    }

    fn clear_bits(&mut self, reg: Register, mask: u8) -> Result<()> {
        let value = self.read(reg)?;
        self.write(reg, value & !mask)
    }

    fn reset(&mut self) -> Result<()> {
        self.write(Register::Command, PcdCommand::SoftReset as u8)?;
        let deadline = Instant::now() + Duration::from_millis(50);
        // PowerDown clears once the oscillator is back
        while self.read(Register::Command)? & 0x10 != 0 {
            if Instant::now() > deadline {
                return Err(Error::Timeout);
            }
            thread::sleep(Duration::from_millis(1));
        }

        // ~2 kHz timer ticks, 15 ms reload: TAuto, prescaler 0xD3E
        self.write(Register::TMode, 0x8D)?;
        self.write(Register::TPrescaler, 0x3E)?;
        self.write(Register::TReloadH, 0)?;
        self.write(Register::TReloadL, 30)?;
        // 100% ASK, CRC preset 0x6363
        self.write(Register::TxAsk, 0x40)?;
        self.write(Register::Mode, 0x3D)?;

        let tx = self.read(Register::TxControl)?;
        if tx & 0x03 != 0x03 {
            self.write(Register::TxControl, tx | 0x03)?;
        }
        Ok(())
    }

    /// Run `command` with `data` in the FIFO. Returns the received bytes and
    /// the number of valid bits in the last one.
    fn to_card(&mut self, command: PcdCommand, data: &[u8], tx_last_bits: u8) -> Result<(Vec<u8>, u8)> {
        if data.len() > MAX_FIFO_BYTES {
            return Err(Error::InvalidLength {
                expected: MAX_FIFO_BYTES,
                actual: data.len(),
            });
        }
        let (irq_en, wait_irq) = match command {
            PcdCommand::MfAuthent => (0x12, 0x10),
            _ => (0x77, 0x30),
        };

        self.write(Register::ComIEn, irq_en | 0x80)?;
        self.clear_bits(Register::ComIrq, 0x80)?;
        self.set_bits(Register::FifoLevel, 0x80)?;
        self.write(Register::Command, PcdCommand::Idle as u8)?;
        for byte in data {
            self.write(Register::FifoData, *byte)?;
        }
        self.write(Register::BitFraming, tx_last_bits & 0x07)?;
        self.write(Register::Command, command as u8)?;
        if command == PcdCommand::Transceive {
            self.set_bits(Register::BitFraming, 0x80)?;
        }

        let start = Instant::now();
        let outcome = loop {
            let irq = self.read(Register::ComIrq)?;
            if irq & wait_irq != 0 {
                break Ok(());
            }
            // TimerIRq: nothing answered
            if irq & 0x01 != 0 || start.elapsed() > SAFETY_TIMEOUT {
                break Err(Error::Timeout);
            }
        };
        self.clear_bits(Register::BitFraming, 0x80)?;
        outcome?;

        let err = self.read(Register::Error)? & 0x1B;
        if err != 0 {
            return Err(Error::Reader(format!("transceive error {:#04x}", err)));
        }
        if command != PcdCommand::Transceive {
            return Ok((Vec::new(), 0));
        }

        let level = (self.read(Register::FifoLevel)? as usize).min(MAX_FIFO_BYTES);
        let last_bits = self.read(Register::Control)? & 0x07;
        let mut received = Vec::with_capacity(level);
        for _ in 0..level {
            received.push(self.read(Register::FifoData)?);
        }
        Ok((received, if last_bits == 0 { 8 } else { last_bits }))
    }

    fn transceive(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.to_card(PcdCommand::Transceive, data, 0).map(|(bytes, _)| bytes)
    }

    fn crc(&mut self, data: &[u8]) -> Result<[u8; 2]> {
        self.write(Register::Command, PcdCommand::Idle as u8)?;
        self.clear_bits(Register::DivIrq, 0x04)?;
        self.set_bits(Register::FifoLevel, 0x80)?;
        for byte in data {
            self.write(Register::FifoData, *byte)?;
        }
        self.write(Register::Command, PcdCommand::CalcCrc as u8)?;

        let start = Instant::now();
        while self.read(Register::DivIrq)? & 0x04 == 0 {
            if start.elapsed() > SAFETY_TIMEOUT {
                return Err(Error::Timeout);
            }
        }
        self.write(Register::Command, PcdCommand::Idle as u8)?;
        Ok([self.read(Register::CrcResultL)?, self.read(Register::CrcResultH)?])
    }

    fn with_crc(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        let crc = self.crc(frame)?;
        let mut out = frame.to_vec();
        out.extend_from_slice(&crc);
        Ok(out)
    }

    fn authenticate(&mut self, uid: &Uid, address: BlockAddress, kind: KeyKind, key: &Key) -> Result<()> {
        let uid_bytes = uid.as_bytes();
        let mut frame = vec![kind.auth_command(), address.absolute()];
        frame.extend_from_slice(key.as_bytes());
        // Crypto1 uses the last four UID bytes (the final cascade level)
        frame.extend_from_slice(&uid_bytes[uid_bytes.len() - 4..]);

        let auth = self.to_card(PcdCommand::MfAuthent, &frame, 0);
        let crypto_on = self.read(Register::Status2)? & 0x08 != 0;
        match auth {
            Ok(_) if crypto_on => Ok(()),
            Ok(_) | Err(Error::Timeout) => Err(Error::AuthenticationFailed {
                sector: address.sector(),
                block: address.block(),
            }),
            Err(err) => Err(err),
        }
    }

    fn stop_crypto(&mut self) -> Result<()> {
        self.clear_bits(Register::Status2, 0x08)
    }

    fn expect_ack(&mut self, frame: &[u8], address: BlockAddress) -> Result<()> {
        let (reply, bits) = self.to_card(PcdCommand::Transceive, frame, 0)?;
        match reply.first() {
            Some(nibble) if bits == 4 && nibble & 0x0F == ACK => Ok(()),
            _ => Err(Error::Reader(format!("write to {} not acknowledged", address))),
        }
    }
}

impl CardReader for Mfrc522Reader {
    fn init(&mut self) -> Result<()> {
        self.reset()
    }

    fn request_tag(&mut self) -> Result<TagResponse> {
        match self.to_card(PcdCommand::Transceive, &[self.request_mode.command()], 7) {
            Ok((atqa, _)) if atqa.len() == 2 => Ok(TagResponse::Present(TagType::from_atqa(
                u16::from_le_bytes([atqa[0], atqa[1]]),
            ))),
            Ok(_) | Err(Error::Timeout) => Ok(TagResponse::NoTag),
            Err(err) => Err(err),
        }
    }

    fn select_tag(&mut self) -> Result<Uid> {
        let mut uid = Vec::with_capacity(10);
        for sel in picc::SEL_CL {
            let answer = self.transceive(&[sel, 0x20])?;
            if answer.len() != 5 {
                return Err(Error::InvalidLength {
                    expected: 5,
                    actual: answer.len(),
                });
            }
            let bcc = answer[..4].iter().fold(0u8, |acc, b| acc ^ b);
            if bcc != answer[4] {
                return Err(Error::Reader("UID check byte mismatch".into()));
            }

            let mut frame = vec![sel, 0x70];
            frame.extend_from_slice(&answer);
            let frame = self.with_crc(&frame)?;
            let sak = self.transceive(&frame)?;
            if sak.is_empty() {
                return Err(Error::NoTagDetected);
            }

            if answer[0] == CASCADE_TAG {
                uid.extend_from_slice(&answer[1..4]);
            } else {
                uid.extend_from_slice(&answer[..4]);
                return Uid::try_from(&uid[..]);
            }
        }
        Err(Error::InvalidUid(uid.len()))
    }

    fn authenticate_and_read(
        &mut self,
        uid: &Uid,
        address: BlockAddress,
        kind: KeyKind,
        key: &Key,
    ) -> Result<BlockData> {
        self.authenticate(uid, address, kind, key)?;
        let frame = self.with_crc(&[picc::READ, address.absolute()])?;
        let reply = self.transceive(&frame);
        self.stop_crypto()?;
        let reply = reply?;
        if reply.len() < 16 {
            return Err(Error::InvalidLength {
                expected: 18,
                actual: reply.len(),
            });
        }
        BlockData::try_from(&reply[..16])
    }

    fn authenticate_and_write(
        &mut self,
        uid: &Uid,
        address: BlockAddress,
        kind: KeyKind,
        key: &Key,
        data: &BlockData,
    ) -> Result<()> {
        self.authenticate(uid, address, kind, key)?;
        let command = self.with_crc(&[picc::WRITE, address.absolute()])?;
        let result = self.expect_ack(&command, address).and_then(|()| {
            let payload = self.with_crc(data.as_bytes())?;
            self.expect_ack(&payload, address)
        });
        self.stop_crypto()?;
        result
    }

    fn halt(&mut self) -> Result<()> {
        let frame = self.with_crc(&[picc::HLTA, 0x00])?;
        // A halted tag stays silent; a timeout is the expected answer
        match self.transceive(&frame) {
            Ok(_) | Err(Error::Timeout) => {}
            Err(err) => log::debug!("HLTA: {}", err),
        }
        self.stop_crypto()
    }
}

impl Drop for Mfrc522Reader {
    fn drop(&mut self) {
        if let Some(pin) = self.reset_pin.as_mut() {
            pin.set_low();
        }
    }
}
