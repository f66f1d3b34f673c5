pub mod cache;
pub mod fingerprint;
pub mod similarity;

pub use cache::FingerprintCache;
pub use fingerprint::{
    calculate_phash, normalized_l1, Fingerprint, Fingerprinter, PHash, PerceptualHasher,
};
pub use similarity::SimilarityEngine;
