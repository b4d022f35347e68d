//! Status word decoding.
//!
//! The printer reports its condition as a single 32-bit status word. The
//! encoding is a mix of exact sentinel values and category bit flags that
//! overlap each other, so decoding has to walk an ordered rule list instead
//! of a table lookup:
//!
//! 1. `0x00000000` is the unique fully-idle value.
//! 2. `0x00000002` is a vendor quirk meaning "print in progress". Its bits
//!    would otherwise fall through to the severe-condition check, so it is
//!    matched before anything else can mis-bucket it.
//! 3. Known codes from the vendor status table.
//! 4. Any remaining value carrying one of the severe bits is a fault.
//! 5. Everything else is reported as unknown.

// Vendor status table. These values are fixed by the printer firmware and
// must not be changed.
pub const OK: u32 = 0x0000_0000;
pub const PRINT_IN_PROGRESS: u32 = 0x0000_0002;
pub const BUSY: u32 = 0x0008_0000;
pub const OFFLINE: u32 = 0x0000_0080;
pub const PRINTING: u32 = 0x0000_0400;
pub const PROCESSING_DATA: u32 = 0x0000_0005;
pub const SENDING_DATA: u32 = 0x0000_0006;

pub const COVER_OPEN: u32 = 0x0005_0001;
pub const COVER_OPEN_2: u32 = 0x0005_0101;

pub const PAPER_OUT: u32 = 0x0000_8000;
pub const PAPER_JAM: u32 = 0x0003_0000;
pub const PAPER_TYPE_MISMATCH: u32 = 0x0001_00FE;
pub const PAPER_TRAY_MISMATCH: u32 = 0x0000_8010;
pub const TRAY_MISSING: u32 = 0x0000_8008;

pub const RIBBON_MISSING: u32 = 0x0008_0004;
pub const OUT_OF_RIBBON: u32 = 0x0008_0103;
pub const RIBBON_TYPE_MISMATCH: u32 = 0x0008_0200;
pub const RIBBON_ERROR: u32 = 0x0008_02FE;

pub const SRAM_ERROR: u32 = 0x0003_0001;
pub const SDRAM_ERROR: u32 = 0x0003_0101;
pub const ADC_ERROR: u32 = 0x0003_0201;
pub const NVRAM_ERROR: u32 = 0x0003_0301;
pub const FW_CHECKSUM_ERROR: u32 = 0x0003_0302;
pub const DSP_CHECKSUM_ERROR: u32 = 0x0003_0402;
pub const HEAT_PARAM_INCOMPATIBLE: u32 = 0x0003_04FE;
pub const CAM_PLATEN_ERROR: u32 = 0x0003_0501;
pub const ADF_ERROR: u32 = 0x0003_0601;

pub const WRITE_FAIL: u32 = 0x0000_001F;
pub const READ_FAIL: u32 = 0x0000_002F;

// Bits that mark a severe condition in codes not present in the table.
const SEVERE_BIT_HIGH: u32 = 0x0008_0000;
const SEVERE_BIT_LOW: u32 = 0x0000_8000;

/// Decoded interpretation of a raw status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// Fully idle, ready to accept a page.
    Ready,
    /// Printer is occupied.
    Busy,
    /// Printer or driver is actively working on a page. Covers the
    /// printing, processing-data and sending-data codes.
    Printing,
    /// The `0x00000002` print-in-progress quirk.
    TransientActive,
    /// Printer is offline.
    Offline,
    /// A fault that needs operator intervention.
    Fault { raw: u32, text: &'static str },
    /// Code not present in the vendor table and without severe bits.
    Unknown { raw: u32 },
}

/// Policy for codes that decode to [`Classified::Unknown`].
///
/// The vendor tooling assumes an unrecognized code means the printer is
/// usable, which keeps a kiosk from hanging forever on firmware codes the
/// table does not know. `AssumeBusy` is the conservative alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownPolicy {
    AssumeReady,
    AssumeBusy,
}

impl Default for UnknownPolicy {
    fn default() -> Self {
        Self::AssumeReady
    }
}

/// Classify a raw status word.
///
/// Pure and total; every `u32` maps to exactly one classification. The
/// rule order is load-bearing, see the module docs.
pub fn classify(raw: u32) -> Classified {
    if raw == OK {
        return Classified::Ready;
    }
    if raw == PRINT_IN_PROGRESS {
        return Classified::TransientActive;
    }
    if let Some(classified) = lookup(raw) {
        return classified;
    }
    if raw & SEVERE_BIT_HIGH != 0 || raw & SEVERE_BIT_LOW != 0 {
        return Classified::Fault {
            raw,
            text: "unknown severe condition",
        };
    }
    Classified::Unknown { raw }
}

fn lookup(raw: u32) -> Option<Classified> {
    let classified = match raw {
        BUSY => Classified::Busy,
        OFFLINE => Classified::Offline,
        PRINTING | PROCESSING_DATA | SENDING_DATA => Classified::Printing,
        COVER_OPEN | COVER_OPEN_2 => fault(raw, "cover is open"),
        PAPER_OUT => fault(raw, "out of paper"),
        PAPER_JAM => fault(raw, "paper jam"),
        PAPER_TYPE_MISMATCH => fault(raw, "paper type mismatch"),
        PAPER_TRAY_MISMATCH => fault(raw, "paper tray mismatch"),
        TRAY_MISSING => fault(raw, "paper tray is missing"),
        RIBBON_MISSING => fault(raw, "ribbon is missing"),
        OUT_OF_RIBBON => fault(raw, "out of ribbon"),
        RIBBON_TYPE_MISMATCH => fault(raw, "ribbon type mismatch"),
        RIBBON_ERROR => fault(raw, "ribbon error"),
        SRAM_ERROR => fault(raw, "SRAM error"),
        SDRAM_ERROR => fault(raw, "SDRAM error"),
        ADC_ERROR => fault(raw, "ADC error"),
        NVRAM_ERROR => fault(raw, "NVRAM read/write error"),
        FW_CHECKSUM_ERROR => fault(raw, "firmware checksum error"),
        DSP_CHECKSUM_ERROR => fault(raw, "DSP code checksum error"),
        HEAT_PARAM_INCOMPATIBLE => fault(raw, "heating parameter table incompatible"),
        CAM_PLATEN_ERROR => fault(raw, "cam platen error"),
        ADF_ERROR => fault(raw, "ADF cam error"),
        WRITE_FAIL => fault(raw, "sending data to the printer failed"),
        READ_FAIL => fault(raw, "receiving data from the printer failed"),
        _ => return None,
    };
    Some(classified)
}

fn fault(raw: u32, text: &'static str) -> Classified {
    Classified::Fault { raw, text }
}

/// Human readable text for a raw status word, for logs and messages.
pub fn describe(raw: u32) -> String {
    match classify(raw) {
        Classified::Ready => "ready".to_string(),
        Classified::Busy => "printer is busy".to_string(),
        Classified::TransientActive => "print in progress".to_string(),
        Classified::Offline => "printer is offline".to_string(),
        Classified::Fault { text, .. } => text.to_string(),
        Classified::Unknown { raw } => format!("unknown status code 0x{:08X}", raw),
        Classified::Printing => match raw {
            PROCESSING_DATA => "driver is processing print data".to_string(),
            SENDING_DATA => "driver is sending data to the printer".to_string(),
            _ => "printer is printing".to_string(),
        },
    }
}

impl Classified {
    /// Whether this classification should keep a readiness wait spinning.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::Busy | Self::Printing | Self::TransientActive
        )
    }

    /// Like [`is_blocking`](Self::is_blocking) but applies the policy for
    /// unknown codes.
    pub fn blocks(&self, policy: UnknownPolicy) -> bool {
        match self {
            Self::Unknown { .. } => policy == UnknownPolicy::AssumeBusy,
            _ => self.is_blocking(),
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }
}
