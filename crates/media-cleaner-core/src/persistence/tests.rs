#[allow(clippy::module_inception)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::tempdir;

    use super::super::blob::{BlobStore, FileBlobStore, MemoryBlobStore};
    use super::super::error::PersistenceError;
    use super::super::models::CachedResultSet;
    use super::super::store::DuplicateCacheStore;
    use crate::test_utils::{photo_at, ts, video_at};
    use crate::types::{DuplicateGroup, MediaCategory, MediaContent, MediaItem};

    fn sample_result() -> CachedResultSet {
        let mut photo = MediaItem::photo("p-odd", ts(1_700_000_123), 4096, None);
        photo.created += chrono::Duration::nanoseconds(123_456_789);
        CachedResultSet::new(
            vec![
                DuplicateGroup::duplicates(vec![
                    photo_at("a", 30, 100),
                    photo_at("b", 20, 200),
                    photo,
                ]),
                DuplicateGroup::flat(vec![
                    video_at("v", 10, 5000, 12.345).with_filename("RPReplay_Final1.MP4")
                ]),
            ],
            Some(ts(1_700_000_123)),
        )
    }

    fn memory_store() -> (Arc<MemoryBlobStore>, DuplicateCacheStore) {
        let blobs = Arc::new(MemoryBlobStore::new());
        (blobs.clone(), DuplicateCacheStore::new(blobs))
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let (_, store) = memory_store();
        let result = sample_result();

        store.save(&result, MediaCategory::SimilarPhotos).unwrap();
        let loaded = store.load(MediaCategory::SimilarPhotos).unwrap();

        assert_eq!(loaded, result);
        assert_eq!(loaded.latest_item_date, result.latest_item_date);
        assert_eq!(loaded.groups[0].items[2].created, result.groups[0].items[2].created);
    }

    #[test]
    fn test_missing_blob_is_a_miss() {
        let (_, store) = memory_store();
        assert!(store.load(MediaCategory::Screenshots).is_none());
        assert!(store.try_load(MediaCategory::Screenshots).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_blob_is_a_miss_and_gets_overwritten() {
        let (blobs, store) = memory_store();
        let category = MediaCategory::Screenshots;
        blobs.insert_raw(category.cache_file_name(), b"{not json".to_vec());

        assert!(store.load(category).is_none());
        let err = store.try_load(category).unwrap_err();
        assert!(err.is_corruption());
        assert!(matches!(
            crate::Error::from(err),
            crate::Error::CacheCorrupt(_)
        ));

        store.save(&sample_result(), category).unwrap();
        assert_eq!(store.load(category).unwrap(), sample_result());
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let (blobs, store) = memory_store();
        let category = MediaCategory::LargeVideos;
        store.save(&CachedResultSet::default(), category).unwrap();

        let mut raw: serde_json::Value =
            serde_json::from_slice(&blobs.read(category.cache_file_name()).unwrap().unwrap())
                .unwrap();
        raw["version"] = serde_json::json!(99);
        blobs.insert_raw(category.cache_file_name(), serde_json::to_vec(&raw).unwrap());

        match store.try_load(category) {
            Err(PersistenceError::VersionMismatch { found, .. }) => assert_eq!(found, 99),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(store.load(category).is_none());
    }

    #[test]
    fn test_category_mismatch_is_rejected() {
        let (blobs, store) = memory_store();
        store
            .save(&sample_result(), MediaCategory::Screenshots)
            .unwrap();
        let bytes = blobs
            .read(MediaCategory::Screenshots.cache_file_name())
            .unwrap()
            .unwrap();
        blobs.insert_raw(MediaCategory::SimilarPhotos.cache_file_name(), bytes);

        assert!(matches!(
            store.try_load(MediaCategory::SimilarPhotos),
            Err(PersistenceError::CategoryMismatch { .. })
        ));
    }

    #[test]
    fn test_merge_concatenates_and_keeps_latest_date() {
        let existing = CachedResultSet::new(
            vec![DuplicateGroup::duplicates(vec![photo_at("a", 1, 1), photo_at("b", 2, 1)])],
            Some(ts(100)),
        );
        let incoming = CachedResultSet::new(
            vec![DuplicateGroup::duplicates(vec![photo_at("c", 201, 1), photo_at("d", 200, 1)])],
            Some(ts(200)),
        );

        let merged = DuplicateCacheStore::merge(existing.clone(), incoming.clone());

        assert_eq!(merged.groups.len(), 2);
        assert_eq!(merged.groups[0], existing.groups[0]);
        assert_eq!(merged.groups[1], incoming.groups[0]);
        assert_eq!(merged.latest_item_date, Some(ts(200)));

        let backwards = DuplicateCacheStore::merge(incoming, existing);
        assert_eq!(backwards.latest_item_date, Some(ts(200)));
    }

    #[test]
    fn test_merge_with_empty_keeps_date() {
        let merged = DuplicateCacheStore::merge(
            CachedResultSet::new(Vec::new(), Some(ts(5))),
            CachedResultSet::default(),
        );
        assert_eq!(merged.latest_item_date, Some(ts(5)));
        assert!(merged.is_fresh(Some(ts(5))));
        assert!(!merged.is_fresh(Some(ts(6))));
    }

    #[test]
    fn test_remove_items_prunes_stored_groups() {
        let (blobs, store) = memory_store();
        let category = MediaCategory::SimilarPhotos;
        store.save(&sample_result(), category).unwrap();
        let writes = blobs.write_count();

        let removed = store
            .remove_items(category, &["b".to_string(), "p-odd".to_string(), "v".to_string()])
            .unwrap();

        assert_eq!(removed, 3);
        assert_eq!(blobs.write_count(), writes + 1);
        let pruned = store.load(category).unwrap();
        // "a" alone is no longer a duplicate group, and the flat list is empty
        assert!(pruned.groups.is_empty());
        assert_eq!(pruned.latest_item_date, sample_result().latest_item_date);
    }

    #[test]
    fn test_remove_items_without_matches_does_not_write() {
        let (blobs, store) = memory_store();
        let category = MediaCategory::SimilarPhotos;
        store.save(&sample_result(), category).unwrap();
        let writes = blobs.write_count();

        assert_eq!(store.remove_items(category, &["zzz".to_string()]).unwrap(), 0);
        assert_eq!(store.remove_items(MediaCategory::LargeVideos, &["a".to_string()]).unwrap(), 0);
        assert_eq!(blobs.write_count(), writes);
    }

    #[test]
    fn test_prune_lowers_date_when_newest_item_is_removed() {
        let (blobs, store) = memory_store();
        let category = MediaCategory::ScreenRecordings;
        let result = CachedResultSet::new(
            vec![DuplicateGroup::flat(vec![
                video_at("r1", 30, 100, 1.0),
                video_at("r2", 20, 100, 1.0),
            ])],
            Some(ts(30)),
        );
        store.save(&result, category).unwrap();

        let removed = store.prune(category, &["r1".to_string()], Some(ts(20))).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(blobs.write_count(), 2);
        let pruned = store.load(category).unwrap();
        assert_eq!(pruned.latest_item_date, Some(ts(20)));
        assert!(pruned.is_fresh(Some(ts(20))));
    }

    #[test]
    fn test_prune_never_raises_date() {
        let (blobs, store) = memory_store();
        let category = MediaCategory::SimilarPhotos;
        store.save(&sample_result(), category).unwrap();

        // A newer live item is left for the next incremental scan
        let removed = store
            .prune(category, &["zzz".to_string()], Some(ts(1_800_000_000)))
            .unwrap();

        assert_eq!(removed, 0);
        assert_eq!(blobs.write_count(), 1);
        assert_eq!(store.load(category).unwrap(), sample_result());
    }

    #[test]
    fn test_prune_of_emptied_library_clears_date() {
        let (_, store) = memory_store();
        let category = MediaCategory::LargeVideos;
        store
            .save(
                &CachedResultSet::new(
                    vec![DuplicateGroup::flat(vec![video_at("big", 10, 1 << 30, 1.0)])],
                    Some(ts(10)),
                ),
                category,
            )
            .unwrap();

        store.prune(category, &["big".to_string()], None).unwrap();

        let pruned = store.load(category).unwrap();
        assert!(pruned.groups.is_empty());
        assert!(pruned.is_fresh(None));
    }

    #[test]
    fn test_unknown_video_duration_round_trips() {
        let (_, store) = memory_store();
        let category = MediaCategory::LargeVideos;
        let result = CachedResultSet::new(
            vec![DuplicateGroup::flat(vec![video_at("v", 10, 1 << 30, f64::NAN)])],
            Some(ts(10)),
        );
        assert_eq!(result.groups[0].items[0].duration(), None);

        store.save(&result, category).unwrap();

        assert_eq!(store.load(category).unwrap(), result);
    }

    #[test]
    fn test_non_finite_duration_is_not_saved() {
        let (blobs, store) = memory_store();
        let mut item = video_at("v", 10, 1 << 30, 3.0);
        item.content = MediaContent::Video {
            frames: Vec::new(),
            duration: Some(f64::INFINITY),
        };
        let result = CachedResultSet::new(vec![DuplicateGroup::flat(vec![item])], Some(ts(10)));

        let err = store.save(&result, MediaCategory::LargeVideos).unwrap_err();

        assert!(matches!(err, PersistenceError::Unrepresentable(_)));
        assert!(!err.is_corruption());
        assert_eq!(blobs.write_count(), 0);
    }

    #[test]
    fn test_clear_removes_blob() {
        let (_, store) = memory_store();
        store.save(&sample_result(), MediaCategory::Screenshots).unwrap();
        store.clear(MediaCategory::Screenshots).unwrap();
        assert!(store.load(MediaCategory::Screenshots).is_none());
        store.clear(MediaCategory::Screenshots).unwrap();
    }

    #[test]
    fn test_file_blob_store_round_trip() {
        let temp_dir = tempdir().unwrap();
        let blobs = FileBlobStore::new(temp_dir.path().join("cache")).unwrap();

        assert!(blobs.read("cleaner-test.json").unwrap().is_none());
        blobs.write("cleaner-test.json", b"first").unwrap();
        blobs.write("cleaner-test.json", b"second").unwrap();
        assert_eq!(blobs.read("cleaner-test.json").unwrap().unwrap(), b"second");

        // No temporary files left behind
        let entries: Vec<_> = std::fs::read_dir(blobs.dir()).unwrap().collect();
        assert_eq!(entries.len(), 1);

        blobs.remove("cleaner-test.json").unwrap();
        assert!(blobs.read("cleaner-test.json").unwrap().is_none());
        blobs.remove("cleaner-test.json").unwrap();
    }

    #[test]
    fn test_file_blob_store_rejects_bad_names() {
        let temp_dir = tempdir().unwrap();
        let blobs = FileBlobStore::new(temp_dir.path()).unwrap();

        assert!(matches!(
            blobs.write("../escape.json", b"x"),
            Err(PersistenceError::Path(..))
        ));
        assert!(blobs.read("").is_err());
    }

    #[test]
    fn test_cache_store_on_disk() {
        let temp_dir = tempdir().unwrap();
        let store =
            DuplicateCacheStore::new(Arc::new(FileBlobStore::new(temp_dir.path()).unwrap()));
        let result = sample_result();

        store.save(&result, MediaCategory::ScreenRecordings).unwrap();
        assert!(temp_dir
            .path()
            .join(MediaCategory::ScreenRecordings.cache_file_name())
            .exists());
        assert_eq!(store.load(MediaCategory::ScreenRecordings).unwrap(), result);
    }
}
