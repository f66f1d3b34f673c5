use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Library categories the cleaner knows how to process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaCategory {
    /// Screenshots, all compared against each other
    Screenshots,

    /// The general photo library, compared per capture day
    SimilarPhotos,

    /// Screen recordings, listed by filename heuristic
    ScreenRecordings,

    /// Videos with identical sampled frames, compared per rounded duration
    VideoDuplicates,

    /// Videos above the configured size threshold
    LargeVideos,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 5] = [
        MediaCategory::Screenshots,
        MediaCategory::SimilarPhotos,
        MediaCategory::ScreenRecordings,
        MediaCategory::VideoDuplicates,
        MediaCategory::LargeVideos,
    ];

    /// Name of the blob holding this category's cached result set
    pub fn cache_file_name(&self) -> &'static str {
        match self {
            Self::Screenshots => "cleaner-screenshots.json",
            Self::SimilarPhotos => "cleaner-similar-photos.json",
            Self::ScreenRecordings => "cleaner-screen-recordings.json",
            Self::VideoDuplicates => "cleaner-video-duplicates.json",
            Self::LargeVideos => "cleaner-large-videos.json",
        }
    }

    /// Whether the category holds videos rather than photos
    pub fn is_video(&self) -> bool {
        matches!(
            self,
            Self::ScreenRecordings | Self::VideoDuplicates | Self::LargeVideos
        )
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Screenshots => "screenshots",
            Self::SimilarPhotos => "similar-photos",
            Self::ScreenRecordings => "screen-recordings",
            Self::VideoDuplicates => "video-duplicates",
            Self::LargeVideos => "large-videos",
        };
        f.write_str(name)
    }
}

/// Visual content carried by a media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaContent {
    /// A photo with its encoded preview image, if one could be fetched
    Photo { preview: Option<Vec<u8>> },

    /// A video with its sampled preview frames (start, middle, near end).
    /// `duration` is `None` when the library reports no finite length.
    Video {
        frames: Vec<Vec<u8>>,
        duration: Option<f64>,
    },
}

/// A photo or video handed to the cleaner by the media source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Internally generated unique id
    pub id: Uuid,

    /// Stable library-local identifier
    pub local_identifier: String,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Size in bytes
    pub size: u64,

    /// Original filename, when the library exposes one
    pub filename: Option<String>,

    /// Preview image or sampled frames
    pub content: MediaContent,

    /// Whether the item is marked for deletion
    pub is_selected: bool,

    /// Whether the item is the one kept from its group
    pub is_best: bool,
}

impl MediaItem {
    /// Create a photo item
    pub fn photo(
        local_identifier: impl Into<String>,
        created: DateTime<Utc>,
        size: u64,
        preview: Option<Vec<u8>>,
    ) -> Self {
        Self::new(local_identifier, created, size, MediaContent::Photo { preview })
    }

    /// Create a video item. A NaN or infinite `duration` is stored as unknown.
    pub fn video(
        local_identifier: impl Into<String>,
        created: DateTime<Utc>,
        size: u64,
        duration: f64,
        frames: Vec<Vec<u8>>,
    ) -> Self {
        Self::new(
            local_identifier,
            created,
            size,
            MediaContent::Video {
                frames,
                duration: duration.is_finite().then_some(duration),
            },
        )
    }

    fn new(
        local_identifier: impl Into<String>,
        created: DateTime<Utc>,
        size: u64,
        content: MediaContent,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            local_identifier: local_identifier.into(),
            created,
            size,
            filename: None,
            content,
            is_selected: false,
            is_best: false,
        }
    }

    /// Attach the original filename
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn is_video(&self) -> bool {
        matches!(self.content, MediaContent::Video { .. })
    }

    /// Duration in seconds, for videos of known length
    pub fn duration(&self) -> Option<f64> {
        match &self.content {
            MediaContent::Video { duration, .. } => *duration,
            MediaContent::Photo { .. } => None,
        }
    }

    /// Sampled frames, for videos
    pub fn frames(&self) -> Option<&[Vec<u8>]> {
        match &self.content {
            MediaContent::Video { frames, .. } => Some(frames),
            MediaContent::Photo { .. } => None,
        }
    }

    /// Preview bytes, for photos
    pub fn preview(&self) -> Option<&[u8]> {
        match &self.content {
            MediaContent::Photo { preview } => preview.as_deref(),
            MediaContent::Video { .. } => None,
        }
    }
}

/// How a group was formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    /// Near-duplicates anchored on a best item
    Duplicates,

    /// A filtered list with no best item
    Flat,
}

/// A group of media items shown together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub kind: GroupKind,
    pub items: Vec<MediaItem>,
}

impl DuplicateGroup {
    /// Build a duplicate group: the first item is kept, the rest are pre-selected
    pub fn duplicates(mut items: Vec<MediaItem>) -> Self {
        for (index, item) in items.iter_mut().enumerate() {
            item.is_best = index == 0;
            item.is_selected = index != 0;
        }
        Self {
            kind: GroupKind::Duplicates,
            items,
        }
    }

    /// Build a flat list with every item pre-selected
    pub fn flat(mut items: Vec<MediaItem>) -> Self {
        for item in items.iter_mut() {
            item.is_best = false;
            item.is_selected = true;
        }
        Self {
            kind: GroupKind::Flat,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The kept item, if the group has one
    pub fn best(&self) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.is_best)
    }

    /// Creation date of the newest member
    pub fn newest_date(&self) -> Option<DateTime<Utc>> {
        self.items.iter().map(|item| item.created).max()
    }

    /// Whether the group is still worth showing
    pub fn is_presentable(&self) -> bool {
        match self.kind {
            GroupKind::Duplicates => self.items.len() > 1,
            GroupKind::Flat => !self.items.is_empty(),
        }
    }

    /// Remove items whose identifiers are in `keys`, returning how many were removed
    pub fn remove_items(&mut self, keys: &[String]) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !keys.contains(&item.local_identifier));
        before - self.items.len()
    }
}

/// Sort groups newest first, by each group's newest member
pub fn sort_groups_newest_first(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| b.newest_date().cmp(&a.newest_date()));
}

/// Derived selection state, recomputed after every change to the groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSummary {
    /// Number of items marked for deletion
    pub selected_count: usize,

    /// Bytes reclaimed by deleting the selected items
    pub reclaimable_bytes: u64,

    /// Bytes held by every item currently shown
    pub total_bytes: u64,
}

impl SelectionSummary {
    pub fn from_groups(groups: &[DuplicateGroup]) -> Self {
        groups
            .iter()
            .flat_map(|group| group.items.iter())
            .fold(Self::default(), |mut summary, item| {
                summary.total_bytes += item.size;
                if item.is_selected {
                    summary.selected_count += 1;
                    summary.reclaimable_bytes += item.size;
                }
                summary
            })
    }
}
