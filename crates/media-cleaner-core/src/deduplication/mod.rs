pub mod bucket;
pub mod cluster;
pub mod scheduler;
pub mod strategy;

pub use bucket::{Bucket, BucketKey, Bucketing};
pub use cluster::{ClusterStrategy, DuplicateClusterer};
pub use scheduler::BucketScheduler;
pub use strategy::{
    CategoryStrategy, ClusteringStrategy, LargeVideoFilter, MediaFilter, ProcessingContext,
    ScreenRecordingFilter, StrategyTable,
};
