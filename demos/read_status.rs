use hiti_print::{
    classify, describe, parse_counter, parse_text, DeviceChannel, Discovery, InfoKind, RibbonInfo,
    UsbChannel, UsbDiscovery,
};
//
// cargo run --example read_status
//

fn main() {
    env_logger::init();

    let serials = match UsbDiscovery.enumerate() {
        Ok(serials) => serials,
        Err(err) => panic!("enumeration failed: {}", err),
    };
    if serials.is_empty() {
        println!("no printers found");
        return;
    }

    for serial in serials {
        let mut channel = match UsbChannel::open(&serial) {
            Ok(channel) => channel,
            Err(err) => {
                println!("{}: open failed: {}", serial, err);
                continue;
            }
        };

        match channel.read_status() {
            Ok(raw) => {
                println!("{}: status 0x{:08X} ({})", serial, raw, describe(raw));
                println!("{}: classified as {:?}", serial, classify(raw));
            }
            Err(err) => println!("{}: status read failed: {}", serial, err),
        }

        if let Ok(data) = channel.read_device_info(InfoKind::ModelName) {
            println!("{}: model {}", serial, parse_text(&data));
        }
        if let Ok(data) = channel.read_device_info(InfoKind::FirmwareVersion) {
            println!("{}: firmware {}", serial, parse_text(&data));
        }
        if let Ok(data) = channel.read_device_info(InfoKind::RibbonInfo) {
            match RibbonInfo::from_bytes(&data) {
                Ok(info) => println!(
                    "{}: ribbon {:?}, {} prints left",
                    serial, info.ribbon, info.count
                ),
                Err(err) => println!("{}: ribbon info unreadable: {}", serial, err),
            }
        }
        if let Ok(data) = channel.read_device_info(InfoKind::PrintCount) {
            if let Ok(count) = parse_counter(&data) {
                println!("{}: lifetime prints {}", serial, count);
            }
        }
    }
}
