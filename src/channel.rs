//! Device channel abstraction.
//!
//! Everything the job controller needs from a printer is behind
//! [`DeviceChannel`]: read the status word, send a control command, submit
//! exactly one page, read an info record. Opening a device is the concrete
//! type's constructor and closing happens on drop, so the underlying
//! handle cannot leak on an error path.

use crate::bitmap::ImageBuffer;
use crate::error::Error;
use crate::paper::{Orientation, PaperType, QualityMode};

/// Control commands understood by the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    Reset,
    Lock,
    Unlock,
    CutPaper,
}

impl CommandCode {
    pub fn code(&self) -> u32 {
        match self {
            Self::Reset => 100,
            Self::Lock => 101,
            Self::Unlock => 102,
            Self::CutPaper => 103,
        }
    }
}

/// Info records the device can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    MfgSerial,
    ModelName,
    FirmwareVersion,
    RibbonInfo,
    PrintCount,
    CutterCount,
}

impl InfoKind {
    pub fn code(&self) -> u32 {
        match self {
            Self::MfgSerial => 1,
            Self::ModelName => 2,
            Self::FirmwareVersion => 3,
            Self::RibbonInfo => 4,
            Self::PrintCount => 5,
            Self::CutterCount => 6,
        }
    }
}

/// Per-page job options, mirroring the driver's job property record.
///
/// The controller always submits with `copies == 1`; multi-copy is its
/// client-side loop.
#[derive(Debug, Clone, Copy)]
pub struct JobOptions {
    pub paper: PaperType,
    pub quality: QualityMode,
    pub orientation: Orientation,
    pub matte: bool,
    pub copies: u16,
}

/// An open, exclusively owned communication channel to one printer.
pub trait DeviceChannel {
    /// Read the raw 32-bit status word.
    fn read_status(&mut self) -> Result<u32, Error>;

    /// Send a control command, returning the raw driver result code.
    fn send_command(&mut self, command: CommandCode) -> Result<u32, Error>;

    /// Submit a single sheet. Returns the raw driver result code; `0`
    /// means accepted, anything else is interpreted by the caller.
    fn submit_one_page(&mut self, options: &JobOptions, image: &ImageBuffer)
        -> Result<u32, Error>;

    /// Read a raw info record.
    fn read_device_info(&mut self, kind: InfoKind) -> Result<Vec<u8>, Error>;
}

/// Enumeration of addressable printers.
pub trait Discovery {
    /// Device identifiers (serial numbers) of reachable printers.
    fn enumerate(&self) -> Result<Vec<String>, Error>;
}

/// Ribbon cartridge families reported in the ribbon info record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RibbonType {
    Ribbon4x6,
    Ribbon5x7,
    Ribbon6x9,
    Ribbon6x8,
    Ribbon5x3_5,
    Ribbon6x12,
    Ribbon8x12,
    Unknown(u32),
}

impl RibbonType {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Ribbon4x6,
            2 => Self::Ribbon5x7,
            3 => Self::Ribbon6x9,
            4 => Self::Ribbon6x8,
            5 => Self::Ribbon5x3_5,
            6 => Self::Ribbon6x12,
            7 => Self::Ribbon8x12,
            other => Self::Unknown(other),
        }
    }
}

/// Decoded ribbon info record: cartridge type plus remaining print count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RibbonInfo {
    pub ribbon: RibbonType,
    pub count: u32,
}

impl RibbonInfo {
    /// Parse the 8-byte little-endian record returned for
    /// [`InfoKind::RibbonInfo`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 8 {
            return Err(Error::Channel(format!(
                "ribbon info record is {} bytes, expected 8",
                data.len()
            )));
        }
        let ribbon_type = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let count = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        Ok(RibbonInfo {
            ribbon: RibbonType::from_code(ribbon_type),
            count,
        })
    }
}

/// Parse a 4-byte little-endian counter record (print or cutter count).
pub fn parse_counter(data: &[u8]) -> Result<u32, Error> {
    if data.len() < 4 {
        return Err(Error::Channel(format!(
            "counter record is {} bytes, expected 4",
            data.len()
        )));
    }
    Ok(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
}

/// Parse a NUL-terminated string record (serial, model, firmware).
pub fn parse_text(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}
