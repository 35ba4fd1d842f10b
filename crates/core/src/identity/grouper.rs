//! Clustering archives into users by transitive identifier overlap

use std::collections::HashMap;

use timelens_domain::{IdentitySet, UserGroup};
use tracing::debug;

/// Disjoint-set forest over archive indices with path compression.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self { parent: (0..len).collect() }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            self.parent[index] = self.parent[self.parent[index]];
            index = self.parent[index];
        }
        index
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            // Attach the later-seen root under the earlier one so group
            // ordering follows processing order.
            let (keep, merge) = if root_a < root_b { (root_a, root_b) } else { (root_b, root_a) };
            self.parent[merge] = keep;
        }
    }
}

/// Cluster archives into disjoint [`UserGroup`]s: two archives belong to
/// the same user iff they are connected through shared identity tokens
/// (exact token equality, any single shared token suffices).
///
/// Callers pass the scans in the order clustering should process them;
/// the pipeline uses reverse discovery order so newer archives take
/// deterministic precedence. A single archive can bridge several earlier
/// clusters at once. The input is not modified.
pub fn group_related_archives(scans: &[(String, IdentitySet)]) -> Vec<UserGroup> {
    let mut components = DisjointSet::new(scans.len());
    let mut token_owner: HashMap<&str, usize> = HashMap::new();

    for (index, (_, identifiers)) in scans.iter().enumerate() {
        for token in identifiers {
            match token_owner.get(token.as_str()) {
                Some(&owner) => components.union(index, owner),
                None => {
                    token_owner.insert(token, index);
                }
            }
        }
    }

    // Materialize connected components, preserving processing order both
    // across groups and within each group's file list.
    let mut groups: Vec<UserGroup> = Vec::new();
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    for (index, (rel, identifiers)) in scans.iter().enumerate() {
        let root = components.find(index);
        let slot = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(UserGroup::default());
            groups.len() - 1
        });
        groups[slot].files.push(rel.clone());
        groups[slot].identifiers.extend(identifiers.iter().cloned());
    }

    for group in &groups {
        debug!(
            files = group.files.len(),
            identifiers = group.identifiers.len(),
            representative = group.representative().unwrap_or("<empty>"),
            "clustered user group"
        );
    }

    groups
}
