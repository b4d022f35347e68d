//! HiTi Photo Printer Driver
//!
//! This crate drives HiTi dye-sublimation photo printers over USB: it
//! decodes the 32-bit status word, waits for the device to become ready,
//! and runs multi-copy print jobs as a sequence of single-sheet
//! submissions with the readiness checks a kiosk workflow needs.
//!
//! # Example
//!
//! ```rust,no_run
//! use hiti_print::{
//!     Discovery, ImageBuffer, JobController, PaperProfile, PaperType, PrintJobRequest,
//!     UsbChannel, UsbDiscovery,
//! };
//!
//! let serials = UsbDiscovery.enumerate().unwrap();
//! let mut channel = UsbChannel::open(&serials[0]).unwrap();
//!
//! let profile = PaperProfile::portrait(PaperType::Photo4x6);
//! let (w, h) = profile.pixel_dimensions();
//! let page = ImageBuffer::from_rgb(w, h, &vec![0xFF; (w * h * 3) as usize]).unwrap();
//!
//! let request = PrintJobRequest::new(profile, vec![page]).copies(2);
//! let outcome = JobController::new().submit_job(&request, &mut channel, None).unwrap();
//! assert!(outcome.succeeded());
//! ```

mod bitmap;
mod channel;
mod error;
mod job;
mod paper;
mod status;
mod usb;
mod wait;

pub use crate::{
    bitmap::{row_stride, ImageBuffer, ImagePreparer, SinglePagePreparer, BYTES_PER_PIXEL},
    channel::{
        parse_counter, parse_text, CommandCode, DeviceChannel, Discovery, InfoKind, JobOptions,
        RibbonInfo, RibbonType,
    },
    error::Error,
    job::{
        CopyAttempt, CopyState, JobConfig, JobController, JobOutcome, PrintJobRequest, Verdict,
        SUBMIT_ACCEPTED, SUBMIT_ALREADY_ACCEPTED,
    },
    paper::{Orientation, PaperProfile, PaperType, QualityMode},
    status::{classify, describe, Classified, UnknownPolicy},
    usb::{UsbChannel, UsbDiscovery, HITI_VID},
    wait::{wait_until_ready, CancelToken, WaitConfig, WaitOutcome},
};
