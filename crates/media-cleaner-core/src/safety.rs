use log::warn;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::types::DuplicateGroup;

/// Decides which items a deletion request may touch. Best items are never deletable.
#[derive(Debug, Default, Clone, Copy)]
pub struct SafetyManager;

impl SafetyManager {
    pub fn new() -> Self {
        Self
    }

    /// Keys of the selected items that may be deleted, in group order
    pub fn deletable_keys(&self, groups: &[DuplicateGroup]) -> Vec<String> {
        groups
            .iter()
            .flat_map(|group| group.items.iter())
            .filter(|item| item.is_selected && !item.is_best)
            .map(|item| item.local_identifier.clone())
            .collect()
    }

    /// Check that every key names a shown item and none of them is a best item
    pub fn vet_deletion(&self, groups: &[DuplicateGroup], keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Err(Error::SafetyCheck("Nothing selected for deletion".to_string()));
        }

        let mut known = HashSet::new();
        let mut protected = HashSet::new();
        for item in groups.iter().flat_map(|group| group.items.iter()) {
            known.insert(item.local_identifier.as_str());
            if item.is_best {
                protected.insert(item.local_identifier.as_str());
            }
        }

        for key in keys {
            if !known.contains(key.as_str()) {
                warn!("Refusing to delete unknown item {}", key);
                return Err(Error::SafetyCheck(format!("Unknown item: {}", key)));
            }
            if protected.contains(key.as_str()) {
                warn!("Refusing to delete best item {}", key);
                return Err(Error::SafetyCheck(format!(
                    "Item {} is the one kept from its group",
                    key
                )));
            }
        }

        Ok(())
    }
}
