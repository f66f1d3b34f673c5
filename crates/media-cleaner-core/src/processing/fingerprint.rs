//! # Fingerprints
//!
//! A fingerprint is a fixed-length embedding that stays close for visually
//! similar images. The cleaner never looks inside one: it only asks a
//! [`Fingerprinter`] to build fingerprints and to measure the distance between
//! two of them.
//!
//! The bundled [`PerceptualHasher`] decodes preview bytes with the `image`
//! crate and derives a 64-bit perceptual hash (8×8 grayscale mean threshold).
//! Its distance is the Hamming distance scaled to `0.0..=1.0`:
//!
//! - 0.00-0.05: the same picture with minor changes (recompression, resize)
//! - 0.05-0.20: near duplicates (burst shots, small crops)
//! - above 0.20: different pictures
//!
//! Hosts with a better embedding model plug it in by implementing
//! [`Fingerprinter`].

use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};

/// An opaque fixed-length embedding for one image
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint(Vec<f32>);

impl Fingerprint {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Builds fingerprints from encoded image bytes and compares them
pub trait Fingerprinter: Send + Sync {
    /// Compute the fingerprint for an encoded image
    fn compute(&self, image: &[u8]) -> Result<Fingerprint>;

    /// Distance between two fingerprints; smaller means more alike
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f32>;
}

/// A perceptual hash represented as a 64-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PHash(pub u64);

impl PHash {
    /// Calculate the Hamming distance between two perceptual hashes
    pub fn distance(&self, other: &PHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Expand the hash into a 64-value fingerprint of 0.0/1.0 bits
    pub fn to_fingerprint(self) -> Fingerprint {
        Fingerprint::new(
            (0..64)
                .map(|bit| if self.0 & (1u64 << bit) != 0 { 1.0 } else { 0.0 })
                .collect(),
        )
    }
}

/// Calculate a 64-bit perceptual hash for an image
pub fn calculate_phash(img: &DynamicImage) -> PHash {
    let small = img.resize_exact(8, 8, image::imageops::FilterType::Triangle);

    // Grayscale formula: 0.299*R + 0.587*G + 0.114*B
    let mut pixels = [0.0f32; 64];
    for (x, y, pixel) in small.pixels() {
        pixels[(y as usize) * 8 + (x as usize)] =
            0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
    }

    let mean = pixels.iter().sum::<f32>() / 64.0;

    let mut hash: u64 = 0;
    for (bit_pos, &p) in pixels.iter().enumerate() {
        if p > mean {
            hash |= 1u64 << bit_pos;
        }
    }

    PHash(hash)
}

/// Default fingerprinter backed by the 64-bit perceptual hash
#[derive(Debug, Clone, Copy, Default)]
pub struct PerceptualHasher;

impl PerceptualHasher {
    pub fn new() -> Self {
        Self
    }

    /// Calculate a perceptual hash from encoded image bytes
    pub fn phash_from_bytes(&self, image: &[u8]) -> Result<PHash> {
        let img = image::load_from_memory(image)?;
        Ok(calculate_phash(&img))
    }
}

impl Fingerprinter for PerceptualHasher {
    fn compute(&self, image: &[u8]) -> Result<Fingerprint> {
        Ok(self.phash_from_bytes(image)?.to_fingerprint())
    }

    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f32> {
        normalized_l1(a, b)
    }
}

/// Mean absolute difference between two equally sized fingerprints.
/// For bit fingerprints this is the Hamming distance divided by the bit count.
pub fn normalized_l1(a: &Fingerprint, b: &Fingerprint) -> Result<f32> {
    if a.len() != b.len() || a.is_empty() {
        return Err(Error::Unknown(format!(
            "Cannot compare fingerprints of length {} and {}",
            a.len(),
            b.len()
        )));
    }

    let total: f32 = a
        .values()
        .iter()
        .zip(b.values())
        .map(|(x, y)| (x - y).abs())
        .sum();
    Ok(total / a.len() as f32)
}
