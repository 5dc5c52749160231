//! Texture source groups
//!
//! A texture proxy can absorb further image sources (mips, cube faces, array
//! slices, channel sources) which are then imported as one texture. The group
//! is an ordered list whose member 0 is always the owning proxy itself; the
//! owner never moves.
//!
//! Membership is deduplicated by canonical source path, and a proxy that
//! already owns other members cannot be absorbed into another group.

use std::path::{Path, PathBuf};

use crate::proxy::{AssetProxy, ProxyId, TextureProxy};

/// One entry of a source group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub id: ProxyId,
    pub source: PathBuf,
}

/// Ordered source list of a texture proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSourceGroup {
    members: Vec<GroupMember>,
}

impl TextureSourceGroup {
    /// Create a singleton group for its owner
    pub fn new(owner: ProxyId, source: PathBuf) -> Self {
        Self {
            members: vec![GroupMember { id: owner, source }],
        }
    }

    pub fn owner(&self) -> ProxyId {
        self.members[0].id
    }

    /// Member count, owner included
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; a group contains at least its owner
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    pub fn ids(&self) -> impl Iterator<Item = ProxyId> + '_ {
        self.members.iter().map(|m| m.id)
    }

    /// Ordered source paths, owner first
    pub fn sources(&self) -> impl Iterator<Item = &Path> + '_ {
        self.members.iter().map(|m| m.source.as_path())
    }

    pub fn index_of(&self, id: ProxyId) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }

    pub fn contains(&self, id: ProxyId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn contains_source(&self, source: &Path) -> bool {
        self.members.iter().any(|m| m.source == source)
    }

    /// Append `member` to the group.
    ///
    /// Fails (returning false, group unchanged) when the member's source is
    /// already present or when the member owns a group of its own.
    pub fn absorb(&mut self, member: &TextureProxy) -> bool {
        if self.contains_source(member.source()) || !member.group().is_singleton() {
            return false;
        }
        self.members.push(GroupMember {
            id: member.id(),
            source: member.source().to_path_buf(),
        });
        true
    }

    /// Remove a member; the owner cannot be released.
    ///
    /// Returns whether the member was removed.
    pub fn release(&mut self, member: ProxyId) -> bool {
        if member == self.owner() {
            return false;
        }
        match self.index_of(member) {
            Some(index) => {
                self.members.remove(index);
                true
            }
            None => false,
        }
    }

    /// Move the selected members one step towards the owner, as a block.
    ///
    /// Relative order of the selection is preserved and index 0 is never a target.
    pub fn move_up(&mut self, selection: &[ProxyId]) {
        let selected = self.selected_indices(selection);
        let Some(&first) = selected.first() else {
            return;
        };

        let ids: Vec<ProxyId> = selected.iter().map(|&i| self.members[i].id).collect();
        let mut target = first.saturating_sub(1).max(1);
        for id in ids {
            if let Some(index) = self.index_of(id) {
                if index != target {
                    self.move_member(index, target);
                }
            }
            target += 1;
        }
    }

    /// Move the selected members one step away from the owner, as a block.
    ///
    /// All members are placed at the same target slot in ascending order,
    /// which pushes the block past its next neighbour.
    pub fn move_down(&mut self, selection: &[ProxyId]) {
        let selected = self.selected_indices(selection);
        let Some(&last) = selected.last() else {
            return;
        };

        let ids: Vec<ProxyId> = selected.iter().map(|&i| self.members[i].id).collect();
        let target = (last + 1).min(self.members.len() - 1);
        for id in ids {
            if let Some(index) = self.index_of(id) {
                if index != target {
                    self.move_member(index, target);
                }
            }
        }
    }

    /// Current indices of selected non-owner members, ascending and unique
    fn selected_indices(&self, selection: &[ProxyId]) -> Vec<usize> {
        let mut indices: Vec<usize> = selection
            .iter()
            .filter_map(|&id| self.index_of(id))
            .filter(|&index| index != 0)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    fn move_member(&mut self, from: usize, to: usize) {
        let member = self.members.remove(from);
        self.members.insert(to, member);
    }
}
