//! Sensors module.
//!
use std::path::{Path, PathBuf};

use rscam::{Camera, Config, Frame};
use simple_error::simple_error;

use crate::Error;

pub type CaptureFn = Box<dyn Fn() -> Option<Frame>>;

/// Get a capture function to a video device on a Linux machine.
pub fn get_capture_fn_linux(
    device_name: &str,
    format: &str,
    resolution: Option<(u32, u32)>,
    frame_rate: Option<(u32, u32)>,
) -> Result<CaptureFn, Error> {
    let mut cam = Camera::new(device_name)?;
    log_supported_formats(&cam, format);
    let format = format.as_bytes();

    log::info!("Using camera {}", device_name);

    let resolution = resolution
        .map(Ok)
        .unwrap_or_else(|| get_max_resolution(&cam, format))?;

    let frame_rate = frame_rate
        .map(Ok)
        .unwrap_or_else(|| get_max_frame_rate(&cam, format, resolution))?;

    cam.start(&Config {
        interval: frame_rate,
        resolution,
        format,
        ..Default::default()
    })?;

    let callback = move || cam.capture().ok();
    Ok(Box::new(callback))
}

/// Encoded image together with its MIME type.
pub struct EncodedFrame {
    pub mime: &'static str,
    pub data: Vec<u8>,
}

/// Where frames come from.
pub enum FrameSource {
    /// MJPG frames of a webcam.
    Camera(CaptureFn),
    /// Image files, sent over and over again.
    Images {
        frames: Vec<EncodedFrame>,
        next: usize,
    },
}

impl FrameSource {
    /// Read all image files into memory.
    pub fn from_images(paths: &[PathBuf]) -> Result<Self, Error> {
        if paths.is_empty() {
            return Err(simple_error!("No image files given").into());
        }

        let frames = paths
            .iter()
            .map(|path| -> Result<EncodedFrame, Error> {
                Ok(EncodedFrame {
                    mime: mime_for_path(path),
                    data: std::fs::read(path)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self::Images { frames, next: 0 })
    }

    /// Get the next frame.
    pub fn next_frame(&mut self) -> Option<EncodedFrame> {
        match self {
            Self::Camera(capture_fn) => capture_fn().map(|frame| EncodedFrame {
                mime: "image/jpeg",
                data: frame[..].to_vec(),
            }),
            Self::Images { frames, next } => {
                let frame = frames.get(*next)?;
                *next = (*next + 1) % frames.len();
                Some(EncodedFrame {
                    mime: frame.mime,
                    data: frame.data.clone(),
                })
            }
        }
    }
}

/// Guess the MIME type from the file extension, defaulting to JPEG.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("bmp") => "image/bmp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// Get the maximum supported resolution for the given format.
fn get_max_resolution(cam: &Camera, format: &[u8]) -> Result<(u32, u32), Error> {
    let resolution_info = cam.resolutions(format)?;
    log::debug!("Found resolutions: {:?}", &resolution_info);
    match resolution_info {
        rscam::ResolutionInfo::Discretes(resolutions) => resolutions
            .iter()
            // Map to iterator over ((width, height) num_pixels)
            .map(|res| (res, res.0 * res.1))
            // Get the highest resolution in terms of number of pixels
            .max_by(|a, b| a.1.cmp(&b.1))
            // Extract width and height values
            .map(|res| *res.0),
        rscam::ResolutionInfo::Stepwise {
            min: _,
            max,
            step: _,
        } => Some(max),
    }
    .ok_or_else(|| simple_error!("No resolution found").into())
}

/// Get the maximum supported frame rate for the given format and resolution.
fn get_max_frame_rate(
    cam: &Camera,
    format: &[u8],
    resolution: (u32, u32),
) -> Result<(u32, u32), Error> {
    let interval_info = cam.intervals(format, resolution)?;
    log::debug!("Found frame rates: {:?}", &interval_info);
    match interval_info {
        rscam::IntervalInfo::Discretes(frame_rates) => frame_rates
            .iter()
            // Map discrete values to real frame rate
            .map(|(denominator, numerator)| ((denominator, numerator), numerator / denominator))
            // Get the highest frame rate
            .max_by(|a, b| a.1.cmp(&b.1))
            // Extract denominator and numerator
            .map(|((&d, &n), _)| (d, n)),
        rscam::IntervalInfo::Stepwise {
            min: _,
            max,
            step: _,
        } => Some(max),
    }
    .ok_or_else(|| simple_error!("No frame rate found").into())
}

fn log_supported_formats(cam: &Camera, format: &str) {
    let formats: Vec<_> = cam.formats().filter_map(|fmt| fmt.ok()).collect();
    log::debug!(
        "Supported formats: {:?}, using format {:?}",
        formats,
        format
    );
}
