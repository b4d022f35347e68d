//! USB transport for HiTi printers.
//!
//! Implements [`DeviceChannel`] over a pair of bulk endpoints. Requests
//! are small opcode-prefixed frames with little-endian fields; every
//! request is answered with a 4-byte little-endian result word (the info
//! opcode additionally returns a payload).

use log::{debug, info};
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext};
use std::time::Duration;

use crate::bitmap::ImageBuffer;
use crate::channel::{CommandCode, DeviceChannel, Discovery, InfoKind, JobOptions};
use crate::error::Error;

/// HiTi Digital vendor id.
pub const HITI_VID: u16 = 0x0D16;

const OP_STATUS: u8 = 0x01;
const OP_COMMAND: u8 = 0x02;
const OP_PRINT: u8 = 0x03;
const OP_INFO: u8 = 0x04;

const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    config: u8,
    iface: u8,
    setting: u8,
    address: u8,
}

/// An exclusively claimed USB connection to one printer.
///
/// The interface is released again on drop, so the handle cannot leak on
/// an error path.
pub struct UsbChannel {
    handle: Box<DeviceHandle<Context>>,
    endpoint_out: Endpoint,
    endpoint_in: Endpoint,
    serial: String,
}

impl UsbChannel {
    /// Open the printer with the given serial number.
    pub fn open(serial: &str) -> Result<Self, Error> {
        let mut context = Context::new()?;
        let (mut device, device_desc, mut handle) = open_device(&mut context, serial)?;

        handle.reset()?;

        let endpoint_in = find_endpoint(&mut device, &device_desc, Direction::In)
            .ok_or_else(|| Error::Connection("device has no bulk in endpoint".to_string()))?;
        let endpoint_out = find_endpoint(&mut device, &device_desc, Direction::Out)
            .ok_or_else(|| Error::Connection("device has no bulk out endpoint".to_string()))?;

        handle.set_auto_detach_kernel_driver(true)?;
        handle.set_active_configuration(endpoint_out.config)?;
        handle.claim_interface(endpoint_out.iface)?;
        handle.set_alternate_setting(endpoint_out.iface, endpoint_out.setting)?;

        info!("opened printer {}", serial);

        Ok(UsbChannel {
            handle: Box::new(handle),
            endpoint_out,
            endpoint_in,
            serial: serial.to_string(),
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    fn write(&self, buf: &[u8]) -> Result<(), Error> {
        let n = self
            .handle
            .write_bulk(self.endpoint_out.address, buf, WRITE_TIMEOUT)
            .map_err(transfer_error)?;
        if n != buf.len() {
            debug!("short write: {} of {} bytes", n, buf.len());
            return Err(Error::Channel(format!(
                "short write: {} of {} bytes",
                n,
                buf.len()
            )));
        }
        Ok(())
    }

    fn read_result(&self) -> Result<u32, Error> {
        let mut buf = [0u8; 4];
        let n = self
            .handle
            .read_bulk(self.endpoint_in.address, &mut buf, READ_TIMEOUT)
            .map_err(transfer_error)?;
        if n != 4 {
            return Err(Error::Channel(format!("short status reply: {} bytes", n)));
        }
        Ok(u32::from_le_bytes(buf))
    }
}

impl DeviceChannel for UsbChannel {
    fn read_status(&mut self) -> Result<u32, Error> {
        self.write(&[OP_STATUS])?;
        let raw = self.read_result()?;
        debug!("status word 0x{:08X}", raw);
        Ok(raw)
    }

    fn send_command(&mut self, command: CommandCode) -> Result<u32, Error> {
        self.write(&command_frame(command))?;
        self.read_result()
    }

    fn submit_one_page(
        &mut self,
        options: &JobOptions,
        image: &ImageBuffer,
    ) -> Result<u32, Error> {
        self.write(&page_header(options, image))?;
        self.write(image.data())?;
        self.read_result()
    }

    fn read_device_info(&mut self, kind: InfoKind) -> Result<Vec<u8>, Error> {
        self.write(&[OP_INFO, kind.code() as u8])?;
        let mut buf = [0u8; 256];
        let n = self
            .handle
            .read_bulk(self.endpoint_in.address, &mut buf, READ_TIMEOUT)
            .map_err(transfer_error)?;
        Ok(buf[..n].to_vec())
    }
}

impl Drop for UsbChannel {
    fn drop(&mut self) {
        self.handle.release_interface(self.endpoint_out.iface).ok();
    }
}

fn command_frame(command: CommandCode) -> Vec<u8> {
    let mut frame = vec![OP_COMMAND];
    frame.extend_from_slice(&command.code().to_le_bytes());
    frame
}

fn page_header(options: &JobOptions, image: &ImageBuffer) -> Vec<u8> {
    let mut frame = vec![OP_PRINT];
    frame.extend_from_slice(&options.paper.id().to_le_bytes());
    frame.extend_from_slice(&options.quality.id().to_le_bytes());
    frame.extend_from_slice(&options.orientation.id().to_le_bytes());
    frame.extend_from_slice(&(options.matte as u32).to_le_bytes());
    frame.extend_from_slice(&(options.copies as u32).to_le_bytes());
    frame.extend_from_slice(&image.width().to_le_bytes());
    frame.extend_from_slice(&image.height().to_le_bytes());
    frame.extend_from_slice(&(image.stride() as u32).to_le_bytes());
    frame
}

// Transient transfer conditions are retried by the polling loops, the
// rest means the device is gone.
fn transfer_error(err: rusb::Error) -> Error {
    match err {
        rusb::Error::Timeout | rusb::Error::Busy | rusb::Error::Interrupted => {
            Error::Channel(err.to_string())
        }
        rusb::Error::NoDevice | rusb::Error::NotFound | rusb::Error::Io => {
            Error::Connection(err.to_string())
        }
        other => Error::UsbError(other),
    }
}

fn open_device(
    context: &mut Context,
    serial: &str,
) -> Result<(Device<Context>, DeviceDescriptor, DeviceHandle<Context>), Error> {
    let devices = context.devices()?;

    for device in devices.iter() {
        let device_desc = match device.device_descriptor() {
            Ok(d) => d,
            Err(err) => {
                debug!("{:?}", err);
                continue;
            }
        };

        if device_desc.vendor_id() != HITI_VID {
            continue;
        }

        match device.open() {
            Ok(handle) => match read_serial(&handle, &device_desc) {
                Some(s) if s == serial => return Ok((device, device_desc, handle)),
                Some(_) | None => continue,
            },
            Err(err) => {
                debug!("failed to open device: {:?}", err);
                continue;
            }
        }
    }
    debug!("no device matches serial {:?}", serial);
    Err(Error::Connection(format!("no printer with serial {}", serial)))
}

fn read_serial(handle: &DeviceHandle<Context>, device_desc: &DeviceDescriptor) -> Option<String> {
    let timeout = Duration::from_secs(1);
    let languages = handle.read_languages(timeout).ok()?;
    let language = languages.first().copied()?;
    handle
        .read_serial_number_string(language, device_desc, timeout)
        .ok()
}

fn find_endpoint(
    device: &mut Device<Context>,
    device_desc: &DeviceDescriptor,
    direction: Direction,
) -> Option<Endpoint> {
    for n in 0..device_desc.num_configurations() {
        let config_desc = match device.config_descriptor(n) {
            Ok(c) => c,
            Err(_) => continue,
        };
        for interface in config_desc.interfaces() {
            for interface_desc in interface.descriptors() {
                for endpoint_desc in interface_desc.endpoint_descriptors() {
                    if endpoint_desc.direction() == direction
                        && endpoint_desc.transfer_type() == TransferType::Bulk
                    {
                        return Some(Endpoint {
                            config: config_desc.number(),
                            iface: interface_desc.interface_number(),
                            setting: interface_desc.setting_number(),
                            address: endpoint_desc.address(),
                        });
                    }
                }
            }
        }
    }
    None
}

/// Lists HiTi printers reachable over USB.
pub struct UsbDiscovery;

impl Discovery for UsbDiscovery {
    fn enumerate(&self) -> Result<Vec<String>, Error> {
        let context = Context::new()?;
        let devices = context.devices()?;

        let mut serials = Vec::new();
        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(_) => continue,
            };
            if device_desc.vendor_id() != HITI_VID {
                continue;
            }
            if let Ok(handle) = device.open() {
                if let Some(serial) = read_serial(&handle, &device_desc) {
                    info!("found printer {}", serial);
                    serials.push(serial);
                }
            }
        }
        Ok(serials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::row_stride;
    use crate::paper::{Orientation, PaperType, QualityMode};

    #[test]
    fn command_frames_encode_little_endian() {
        assert_eq!(command_frame(CommandCode::Reset), vec![OP_COMMAND, 100, 0, 0, 0]);
        assert_eq!(
            command_frame(CommandCode::CutPaper),
            vec![OP_COMMAND, 103, 0, 0, 0]
        );
    }

    #[test]
    fn page_header_carries_geometry_and_options() {
        let options = JobOptions {
            paper: PaperType::Photo4x6,
            quality: QualityMode::Fine,
            orientation: Orientation::Landscape,
            matte: true,
            copies: 1,
        };
        let image =
            ImageBuffer::new(1844, 1240, vec![0u8; row_stride(1844) * 1240]).unwrap();
        let frame = page_header(&options, &image);

        assert_eq!(frame[0], OP_PRINT);
        assert_eq!(&frame[1..5], &0u32.to_le_bytes()); // paper id
        assert_eq!(&frame[5..9], &1u32.to_le_bytes()); // fine quality
        assert_eq!(&frame[9..13], &2u32.to_le_bytes()); // landscape
        assert_eq!(&frame[13..17], &1u32.to_le_bytes()); // matte
        assert_eq!(&frame[17..21], &1u32.to_le_bytes()); // one copy
        assert_eq!(&frame[21..25], &1844u32.to_le_bytes());
        assert_eq!(&frame[25..29], &1240u32.to_le_bytes());
        assert_eq!(&frame[29..33], &(row_stride(1844) as u32).to_le_bytes());
    }
}
