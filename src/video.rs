// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Video reading.
//!
//! [`VideoReader`] wraps a `video-rs` decoder: it reports the container's
//! declared properties at open time and yields frames lazily in presentation
//! order. The sequence is finite and non-restartable; a decode failure
//! mid-stream ends it early rather than raising, so callers must tolerate a
//! truncated sequence.

use std::path::Path;
use std::sync::Once;

use image::DynamicImage;
use video_rs::decode::Decoder;

use crate::error::{PipelineError, Result};

static INIT: Once = Once::new();

/// Initialize the video backend and silence its logs.
///
/// Safe to call multiple times.
fn init_backend() {
    INIT.call_once(|| {
        if let Err(e) = video_rs::init() {
            eprintln!("Failed to initialize video-rs: {e}");
        }
    });
}

/// Frame-by-frame reader over a single video file.
///
/// Properties are read from the container at open time and may be
/// approximate or zero for malformed files; no validation is performed.
/// The decoding handle is released when the reader is dropped.
pub struct VideoReader {
    decoder: Decoder,
    frame_count: usize,
    width: u32,
    height: u32,
    fps: f32,
    frames_read: usize,
}

impl VideoReader {
    /// Open a video file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be opened or decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        init_backend();

        let path = path.as_ref();
        let decoder = Decoder::new(path).map_err(|e| {
            PipelineError::VideoError(format!("Failed to open {}: {e}", path.display()))
        })?;

        let fps = decoder.frame_rate();
        let (width, height) = decoder.size();

        // Containers don't carry an exact frame count; estimate it from
        // duration and frame rate, zero when the duration is unknown.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let frame_count = decoder
            .duration()
            .map(|d| (d.as_secs_f64() * f64::from(fps)) as usize)
            .unwrap_or(0);

        Ok(Self {
            decoder,
            frame_count,
            width,
            height,
            fps,
            frames_read: 0,
        })
    }

    /// Declared frame count, estimated from the container.
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Frame width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Declared frame rate.
    #[must_use]
    pub const fn fps(&self) -> f32 {
        self.fps
    }

    /// Frames yielded so far.
    #[must_use]
    pub const fn frames_read(&self) -> usize {
        self.frames_read
    }
}

impl Iterator for VideoReader {
    type Item = DynamicImage;

    fn next(&mut self) -> Option<Self::Item> {
        // A decode error is indistinguishable from end-of-stream here; both
        // terminate the sequence and the caller sees a truncated video.
        match self.decoder.decode() {
            Ok((_ts, frame)) => match frame_to_image(&frame) {
                Ok(img) => {
                    self.frames_read += 1;
                    Some(img)
                }
                Err(_) => None,
            },
            Err(_) => None,
        }
    }
}

/// Convert a decoded RGB frame (HWC u8 ndarray) to a `DynamicImage`.
fn frame_to_image(frame: &video_rs::Frame) -> Result<DynamicImage> {
    let shape = frame.shape();
    let height = u32::try_from(shape[0])
        .map_err(|_| PipelineError::VideoError("Frame height exceeds u32::MAX".to_string()))?;
    let width = u32::try_from(shape[1])
        .map_err(|_| PipelineError::VideoError("Frame width exceeds u32::MAX".to_string()))?;

    let mut rgb_data = Vec::with_capacity((height * width * 3) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            rgb_data.push(frame[[y, x, 0]]);
            rgb_data.push(frame[[y, x, 1]]);
            rgb_data.push(frame[[y, x, 2]]);
        }
    }

    let img_buffer = image::RgbImage::from_raw(width, height, rgb_data).ok_or_else(|| {
        PipelineError::VideoError("Failed to create image from video frame".to_string())
    })?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}
