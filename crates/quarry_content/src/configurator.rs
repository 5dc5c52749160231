//! Per-kind proxy collections
//!
//! A [`KindConfigurator`] owns every proxy of one asset kind in a single
//! insertion-ordered collection. Texture proxies absorbed into another
//! proxy's group stay in the collection with their `staged` flag cleared, so
//! the collection is the only owner and the staged view is derived from it.

use std::path::{Path, PathBuf};

use crate::import::{BatchId, ImportDispatcher};
use crate::proxy::{AssetProxy, ProxyBase, ProxyId, TextureProxy};
use crate::settings::ImportSettings;

/// Generic collection manager for one asset kind
pub struct KindConfigurator<P: AssetProxy> {
    proxies: Vec<P>,
}

impl<P: AssetProxy> Default for KindConfigurator<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: AssetProxy> KindConfigurator<P> {
    pub fn new() -> Self {
        Self { proxies: Vec::new() }
    }

    /// Stage new source files.
    ///
    /// Paths already staged (by canonical path) are skipped, as are paths
    /// that do not resolve to an existing file. Returns the number of proxies
    /// created.
    pub fn add_files<I, S>(&mut self, paths: I, destination_folder: &str) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.as_ref();
            let base = match ProxyBase::new(path, destination_folder) {
                Ok(base) => base,
                Err(e) => {
                    log::warn!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };

            if self.contains_source(base.source()) {
                log::debug!("{:?} already staged", base.source());
                continue;
            }

            log::debug!("Staged {} {:?} -> {}", <P::Settings as ImportSettings>::KIND, base.source(), base.destination_folder());
            self.proxies.push(P::create(base));
            added += 1;
        }
        added
    }

    /// Remove a staged proxy. Absorbed members of a removed group go with it.
    ///
    /// Returns false if no staged proxy has this id.
    pub fn remove_file(&mut self, id: ProxyId) -> bool {
        let Some(index) = self.proxies.iter().position(|p| p.is_staged() && p.id() == id) else {
            return false;
        };

        let removed = self.proxies.remove(index);
        let members = removed.group_members();
        if !members.is_empty() {
            self.proxies.retain(|p| !members.contains(&p.id()));
        }
        log::debug!("Removed {:?} ({} group members)", id, members.len());
        true
    }

    /// Number of staged proxies
    pub fn len(&self) -> usize {
        self.proxies.iter().filter(|p| p.is_staged()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Staged proxies in insertion order
    pub fn proxies(&self) -> impl Iterator<Item = &P> + '_ {
        self.proxies.iter().filter(|p| p.is_staged())
    }

    /// Look up any owned proxy, absorbed group members included
    pub fn get(&self, id: ProxyId) -> Option<&P> {
        self.proxies.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: ProxyId) -> Option<&mut P> {
        self.proxies.iter_mut().find(|p| p.id() == id)
    }

    /// Whether a staged proxy references this canonical source
    pub fn contains_source(&self, source: &Path) -> bool {
        self.proxies().any(|p| p.source() == source)
    }

    /// Destination of the most recently staged proxy
    pub fn last_destination_folder(&self) -> Option<&str> {
        self.proxies().last().map(|p| p.destination_folder())
    }

    /// Copy the settings of `from` onto each target and its group members.
    ///
    /// Returns the number of proxies updated.
    pub fn apply_settings(&mut self, from: ProxyId, targets: &[ProxyId]) -> usize {
        let Some(settings) = self.get(from).map(|p| p.settings().clone()) else {
            return 0;
        };

        let mut ids: Vec<ProxyId> = Vec::new();
        for &target in targets {
            let Some(proxy) = self.get(target).filter(|p| p.is_staged()) else {
                continue;
            };
            ids.push(target);
            ids.extend(proxy.group_members());
        }
        ids.retain(|&id| id != from);

        let mut updated = 0;
        for proxy in self.proxies.iter_mut().filter(|p| ids.contains(&p.id())) {
            proxy.copy_settings(&settings);
            updated += 1;
        }
        updated
    }

    /// Copy the settings of `from` onto every staged proxy
    pub fn apply_settings_to_all(&mut self, from: ProxyId) -> usize {
        let targets: Vec<ProxyId> = self.proxies().map(|p| p.id()).collect();
        self.apply_settings(from, &targets)
    }

    pub(crate) fn set_destination_folder(&mut self, id: ProxyId, folder: &str) -> bool {
        match self.proxies.iter_mut().find(|p| p.is_staged() && p.id() == id) {
            Some(proxy) => {
                proxy.base_mut().set_destination_folder(folder);
                true
            }
            None => false,
        }
    }

    /// Hand every staged proxy to the dispatcher and clear the collection.
    ///
    /// Does not wait for the batch; returns `None` when nothing is staged.
    pub fn import(&mut self, dispatcher: &ImportDispatcher) -> Option<BatchId> {
        if self.is_empty() {
            return None;
        }

        let requests: Vec<_> = std::mem::take(&mut self.proxies)
            .into_iter()
            .filter(|p| p.is_staged())
            .map(|mut p| {
                p.prepare_for_import();
                p.into_request()
            })
            .collect();

        Some(dispatcher.dispatch(<P::Settings as ImportSettings>::KIND, requests))
    }

    /// Canonical sources of all staged proxies
    pub fn sources(&self) -> Vec<PathBuf> {
        self.proxies().map(|p| p.source().to_path_buf()).collect()
    }

    fn index_of(&self, id: ProxyId) -> Option<usize> {
        self.proxies.iter().position(|p| p.id() == id)
    }
}

impl KindConfigurator<TextureProxy> {
    /// Absorb `member` into the group owned by `target`.
    ///
    /// Both must be staged. On success the member leaves the staged set.
    pub fn move_to_target(&mut self, member: ProxyId, target: ProxyId) -> bool {
        if member == target {
            return false;
        }
        let (Some(mi), Some(ti)) = (self.index_of(member), self.index_of(target)) else {
            return false;
        };
        if !self.proxies[mi].is_staged() || !self.proxies[ti].is_staged() {
            return false;
        }

        let candidate = self.proxies[mi].clone();
        if !self.proxies[ti].group_mut().absorb(&candidate) {
            log::debug!("{:?} cannot join group of {:?}", member, target);
            return false;
        }
        self.proxies[mi].set_staged(false);
        log::debug!("{:?} absorbed into {:?}", member, target);
        true
    }

    /// Release `member` from the group owned by `target`.
    ///
    /// The member is staged again at the end of the collection unless a
    /// staged proxy with the same source already exists, in which case it is
    /// dropped.
    pub fn move_from_target(&mut self, member: ProxyId, target: ProxyId) -> bool {
        let Some(ti) = self.index_of(target) else {
            return false;
        };
        if !self.proxies[ti].group_mut().release(member) {
            return false;
        }

        let Some(mi) = self.index_of(member) else {
            return true;
        };
        let mut released = self.proxies.remove(mi);
        if self.contains_source(released.source()) {
            log::debug!("{:?} released; source already staged", member);
        } else {
            released.set_staged(true);
            self.proxies.push(released);
            log::debug!("{:?} released and staged again", member);
        }
        true
    }

    /// Move members of `target`'s group one step towards the owner
    pub fn move_up(&mut self, target: ProxyId, selection: &[ProxyId]) -> bool {
        match self.get_mut(target) {
            Some(proxy) => {
                proxy.group_mut().move_up(selection);
                true
            }
            None => false,
        }
    }

    /// Move members of `target`'s group one step away from the owner
    pub fn move_down(&mut self, target: ProxyId, selection: &[ProxyId]) -> bool {
        match self.get_mut(target) {
            Some(proxy) => {
                proxy.group_mut().move_down(selection);
                true
            }
            None => false,
        }
    }
}
