use serde::{Deserialize, Serialize};

use crate::types::{DuplicateGroup, MediaItem};

/// How a duplicate group grows around its seed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterStrategy {
    /// An item joins a group only if it is similar to the group's seed
    #[default]
    SeedAnchored,

    /// An item joins a group if it is similar to any member already in it
    Transitive,
}

/// Partitions one bucket of items into duplicate groups.
///
/// Items are scanned in input order. Each unvisited item seeds a new group and
/// pulls in every later unvisited item that matches. The seed is the group's
/// best item; callers decide which item is kept by sorting their input (newest
/// first keeps the newest). Groups of one are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateClusterer {
    strategy: ClusterStrategy,
}

impl DuplicateClusterer {
    pub fn new(strategy: ClusterStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ClusterStrategy {
        self.strategy
    }

    /// Find duplicate groups among `items` using the `similar` relation
    pub fn find_duplicates<F>(&self, items: &[MediaItem], similar: F) -> Vec<DuplicateGroup>
    where
        F: Fn(&MediaItem, &MediaItem) -> bool,
    {
        let mut visited = vec![false; items.len()];
        let mut groups = Vec::new();

        for seed in 0..items.len() {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;

            let members = match self.strategy {
                ClusterStrategy::SeedAnchored => {
                    seed_anchored_members(items, seed, &mut visited, &similar)
                }
                ClusterStrategy::Transitive => {
                    transitive_members(items, seed, &mut visited, &similar)
                }
            };

            if members.len() > 1 {
                groups.push(DuplicateGroup::duplicates(
                    members.into_iter().map(|i| items[i].clone()).collect(),
                ));
            }
        }

        groups
    }
}

fn seed_anchored_members<F>(
    items: &[MediaItem],
    seed: usize,
    visited: &mut [bool],
    similar: &F,
) -> Vec<usize>
where
    F: Fn(&MediaItem, &MediaItem) -> bool,
{
    let mut members = vec![seed];
    for candidate in (seed + 1)..items.len() {
        if !visited[candidate] && similar(&items[seed], &items[candidate]) {
            visited[candidate] = true;
            members.push(candidate);
        }
    }
    members
}

fn transitive_members<F>(
    items: &[MediaItem],
    seed: usize,
    visited: &mut [bool],
    similar: &F,
) -> Vec<usize>
where
    F: Fn(&MediaItem, &MediaItem) -> bool,
{
    let mut members = vec![seed];
    let mut cursor = 0;
    while cursor < members.len() {
        let anchor = members[cursor];
        for candidate in (seed + 1)..items.len() {
            if !visited[candidate] && similar(&items[anchor], &items[candidate]) {
                visited[candidate] = true;
                members.push(candidate);
            }
        }
        cursor += 1;
    }
    members
}
