//! Outpost registry - the owning collection of every outpost, keyed by name

use ahash::AHashMap;
use rayon::prelude::*;

use crate::core::config::Settings;
use crate::core::error::{OutpostError, Result};
use crate::core::types::{Position, Timestamp};
use crate::hooks::Hooks;
use crate::outpost::{KillEvent, Outpost, OutpostKind, OutpostStatus, Resolution, Sighting};

/// Above this many outposts, ticks run in parallel
const PARALLEL_THRESHOLD: usize = 8;

#[derive(Debug)]
pub struct OutpostRegistry {
    settings: Settings,
    hooks: Hooks,
    outposts: AHashMap<String, Outpost>,
}

impl OutpostRegistry {
    pub fn new(settings: Settings, hooks: Hooks) -> Self {
        Self {
            settings,
            hooks,
            outposts: AHashMap::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn len(&self) -> usize {
        self.outposts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outposts.is_empty()
    }

    /// Place a new outpost; names are case-insensitive
    pub fn create(&mut self, name: &str, position: Position, kind: OutpostKind) -> Result<&mut Outpost> {
        let key = name.to_lowercase();
        if self.outposts.contains_key(&key) {
            return Err(OutpostError::OutpostExists(key));
        }
        tracing::info!(outpost = %key, %kind, "outpost created");
        let outpost = Outpost::new(key.clone(), position, kind, &self.settings);
        Ok(self.outposts.entry(key).or_insert(outpost))
    }

    pub fn remove(&mut self, name: &str) -> Result<Outpost> {
        let key = name.to_lowercase();
        let outpost = self
            .outposts
            .remove(&key)
            .ok_or_else(|| OutpostError::OutpostNotFound(key.clone()))?;
        tracing::info!(outpost = %key, "outpost removed");
        Ok(outpost)
    }

    pub fn get(&self, name: &str) -> Option<&Outpost> {
        self.outposts.get(&name.to_lowercase())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Outpost> {
        self.outposts.get_mut(&name.to_lowercase())
    }

    fn require_mut(&mut self, name: &str) -> Result<&mut Outpost> {
        let key = name.to_lowercase();
        self.outposts
            .get_mut(&key)
            .ok_or(OutpostError::OutpostNotFound(key))
    }

    /// Outpost names in alphabetical order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.outposts.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn start(&mut self, name: &str, now: Timestamp) -> Result<()> {
        let hooks = self.hooks.clone();
        self.require_mut(name)?.start(now, &hooks)
    }

    pub fn stop(&mut self, name: &str) -> Result<()> {
        let hooks = self.hooks.clone();
        self.require_mut(name)?.stop(&hooks)
    }

    pub fn reset(&mut self, name: &str) -> Result<()> {
        let hooks = self.hooks.clone();
        self.require_mut(name)?.reset(&hooks);
        Ok(())
    }

    pub fn refill_loot(&mut self, name: &str, now: Timestamp) -> Result<()> {
        let hooks = self.hooks.clone();
        self.require_mut(name)?.refill_loot(now, &hooks)
    }

    /// Credit a kill at every running contested outpost; returns how many took it
    pub fn record_kill(&mut self, kill: KillEvent) -> usize {
        let hooks = &self.hooks;
        self.outposts
            .values_mut()
            .filter(|o| o.is_running() && o.kind() == OutpostKind::Contested)
            .filter_map(|o| o.record_kill(kill, hooks).ok())
            .count()
    }

    /// Tick every running outpost against the same world snapshot
    pub fn tick_all(&mut self, sightings: &[Sighting], now: Timestamp) -> Vec<Resolution> {
        let hooks = &self.hooks;
        let mut running: Vec<&mut Outpost> = self
            .outposts
            .values_mut()
            .filter(|o| o.is_running())
            .collect();

        let mut resolutions: Vec<Resolution> = if running.len() > PARALLEL_THRESHOLD {
            // PARALLEL: outposts share no mutable state
            running
                .par_iter_mut()
                .filter_map(|o| o.tick(sightings, &[], hooks, now))
                .filter_map(|report| report.resolution)
                .collect()
        } else {
            running
                .iter_mut()
                .filter_map(|o| o.tick(sightings, &[], hooks, now))
                .filter_map(|report| report.resolution)
                .collect()
        };

        resolutions.sort_by(|a, b| a.outpost.cmp(&b.outpost));
        resolutions
    }

    pub fn status_all(&self, now: Timestamp) -> Vec<OutpostStatus> {
        let mut statuses: Vec<OutpostStatus> = self.outposts.values().map(|o| o.status(now)).collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }
}
