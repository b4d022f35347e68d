use hiti_print::{
    Discovery, ImageBuffer, JobController, Orientation, PaperProfile, PaperType, PrintJobRequest,
    QualityMode, UsbChannel, UsbDiscovery, Verdict,
};
use image::imageops::FilterType;
use std::env;
//
// cargo run --example kiosk_print -- photo.jpg [copies]
//

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("usage: kiosk_print <image> [copies]");
            return;
        }
    };
    let copies: u32 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);

    let profile = PaperProfile::new(PaperType::Photo4x6, Orientation::Portrait);
    let (width, height) = profile.pixel_dimensions();

    let source = match image::open(&path) {
        Ok(source) => source,
        Err(err) => panic!("cannot open {}: {}", path, err),
    };
    let rgb = source
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgb8();
    let page = match ImageBuffer::from_rgb(width, height, rgb.as_raw()) {
        Ok(page) => page,
        Err(err) => panic!("cannot pack page: {}", err),
    };

    let serials = UsbDiscovery.enumerate().unwrap_or_default();
    let serial = match serials.first() {
        Some(serial) => serial.clone(),
        None => {
            println!("no printers found");
            return;
        }
    };
    let mut channel = match UsbChannel::open(&serial) {
        Ok(channel) => channel,
        Err(err) => panic!("cannot open {}: {}", serial, err),
    };

    let request = PrintJobRequest::new(profile, vec![page])
        .copies(copies)
        .quality(QualityMode::Fine)
        .wait_for_completion(true);

    match JobController::new().submit_job(&request, &mut channel, None) {
        Ok(outcome) => {
            for attempt in &outcome.copies {
                println!("copy {}: {:?}", attempt.index + 1, attempt.state);
            }
            match outcome.verdict {
                Verdict::Succeeded => println!("job done"),
                Verdict::TimedOutWaiting => {
                    println!("all sheets submitted, printer still finishing")
                }
                Verdict::Failed(err) => println!("job failed: {}", err),
            }
        }
        Err(err) => println!("job rejected: {}", err),
    }
}
