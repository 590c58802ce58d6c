//! Send webcam or image file frames to the ASL letter server.
//!
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::Parser;
use env_logger::TimestampPrecision;
use frame_sender::{
    client::ApiClient,
    sensors::{get_capture_fn_linux, FrameSource},
    Error,
};

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Base URL of the ASL letter server
    #[clap(long, default_value = "http://127.0.0.1:5000")]
    server_url: String,

    /// Video device to capture frames from
    #[clap(long, default_value = "/dev/video0")]
    device: String,

    /// Pixel format of the video device
    #[clap(long, default_value = "MJPG")]
    format: String,

    /// Send these image files in a loop instead of capturing the webcam
    #[clap(long, num_args = 1..)]
    images: Vec<PathBuf>,

    /// Milliseconds to wait between two frames
    #[clap(long, default_value_t = 0)]
    frame_interval_ms: u64,

    /// Milliseconds between two polls of the recognized text
    #[clap(long, default_value_t = 300)]
    poll_ms: u64,

    /// Only send an edit key (c: clear, s: space, b: backspace) and exit
    #[clap(long)]
    key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let client = ApiClient::new(&args.server_url);

    if let Some(key) = &args.key {
        let text = client.update_text(key).await?;
        log::info!("Recognized text: {:?}", text);
        return Ok(());
    }

    let mut source = match args.images.is_empty() {
        true => FrameSource::Camera(get_capture_fn_linux(&args.device, &args.format, None, None)?),
        false => FrameSource::from_images(&args.images)?,
    };
    log::info!("Sending frames to {}", &args.server_url);

    let poll_interval = Duration::from_millis(args.poll_ms);
    let mut last_poll = Instant::now();
    let mut last_letter = String::new();
    let mut last_text = String::new();

    loop {
        match source.next_frame() {
            Some(frame) => match client.predict_frame(&frame).await {
                Ok(letter) => {
                    if letter != last_letter {
                        log::info!("Letter: {:?}", letter);
                        last_letter = letter;
                    }
                }
                Err(err) => log::warn!("Prediction failed: {}", err),
            },
            None => log::error!("Unable to capture frame, trying again..."),
        }

        if last_poll.elapsed() >= poll_interval {
            last_poll = Instant::now();
            match client.recognized_text().await {
                Ok(text) if text != last_text => {
                    log::info!("Recognized text: {:?}", text);
                    last_text = text;
                }
                Ok(_) => (),
                Err(err) => log::warn!("Failed to fetch recognized text: {}", err),
            }
        }

        if args.frame_interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.frame_interval_ms)).await;
        }
    }
}
