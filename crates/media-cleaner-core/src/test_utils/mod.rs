//! Builders and fakes shared by the unit tests.

use chrono::{DateTime, TimeZone, Utc};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::processing::{Fingerprint, Fingerprinter};
use crate::types::MediaItem;

/// Timestamp `secs` seconds after the epoch
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// A photo whose preview is its own key
pub fn photo_at(key: &str, secs: i64, size: u64) -> MediaItem {
    MediaItem::photo(key, ts(secs), size, Some(key.as_bytes().to_vec()))
}

/// A photo whose preview is read by [`ScriptedFingerprinter`] as a position on a line
pub fn photo_with_preview(key: &str, secs: i64, preview: &str) -> MediaItem {
    MediaItem::photo(key, ts(secs), 1, Some(preview.as_bytes().to_vec()))
}

/// A video with three frames derived from its key
pub fn video_at(key: &str, secs: i64, size: u64, duration: f64) -> MediaItem {
    let frames = (0..3).map(|i| format!("{}-{}", key, i).into_bytes()).collect();
    MediaItem::video(key, ts(secs), size, duration, frames)
}

/// A video with explicit frames
pub fn video_with_frames(key: &str, secs: i64, duration: f64, frames: &[&str]) -> MediaItem {
    let frames = frames.iter().map(|f| f.as_bytes().to_vec()).collect();
    MediaItem::video(key, ts(secs), 1, duration, frames)
}

/// Encode an image as PNG bytes
pub fn encode_png(img: &image::RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// Fingerprinter that parses the preview as a decimal number; distance is the absolute difference
#[derive(Debug, Default)]
pub struct ScriptedFingerprinter {
    computations: AtomicUsize,
}

impl ScriptedFingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }
}

impl Fingerprinter for ScriptedFingerprinter {
    fn compute(&self, image: &[u8]) -> Result<Fingerprint> {
        self.computations.fetch_add(1, Ordering::SeqCst);
        let text = std::str::from_utf8(image).map_err(|e| Error::Unknown(e.to_string()))?;
        let value: f32 = text
            .trim()
            .parse()
            .map_err(|_| Error::Unknown(format!("unreadable preview {:?}", text)))?;
        Ok(Fingerprint::new(vec![value]))
    }

    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f32> {
        Ok((a.values()[0] - b.values()[0]).abs())
    }
}
