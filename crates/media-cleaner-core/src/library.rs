//! Interfaces to the host media library.
//!
//! The core never talks to a photo library directly. The host app implements
//! [`MediaSource`] to hand over items and [`DeletionExecutor`] to carry out the
//! deletions the core decides on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{MediaCategory, MediaItem};

/// Outcome of a library permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessStatus {
    /// Full library access
    Authorized,

    /// Access to a user-chosen subset of the library
    Limited,

    /// The user refused access
    Denied,

    /// Access is blocked by policy (parental controls, MDM)
    Restricted,

    /// The user has not answered yet
    NotDetermined,
}

impl AccessStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Authorized | Self::Limited)
    }
}

/// Supplies the items of a category
pub trait MediaSource: Send + Sync {
    /// Ask for library access; may prompt the user
    fn request_access(&self) -> AccessStatus;

    /// Creation timestamp of the newest item in `category`, or `None` if the category is empty
    fn newest_item_date(&self, category: MediaCategory) -> Result<Option<DateTime<Utc>>>;

    /// Items in `category`, restricted to those created strictly after `created_after` when given.
    /// Photos carry a preview image, videos their sampled frames and duration.
    fn fetch_items(
        &self,
        category: MediaCategory,
        created_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<MediaItem>>;
}

/// Performs library deletions on behalf of the core
pub trait DeletionExecutor: Send + Sync {
    /// Delete the items with these local identifiers, all or nothing
    fn delete(&self, keys: &[String]) -> Result<()>;
}
