//! Periodic driver - one tokio task per running outpost
//!
//! Each task owns its outpost behind an async mutex and ticks it on a fixed
//! interval. Late ticks are skipped rather than queued, so two ticks of the same
//! outpost never overlap. Kills arrive over a channel and are drained at the
//! start of each tick; stop requests are only seen between ticks.

use ahash::AHashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::core::error::{OutpostError, Result};
use crate::core::types::Timestamp;
use crate::hooks::Hooks;
use crate::outpost::{KillEvent, Outpost, OutpostStatus, Sighting};

/// Source of everyone's current position
pub trait WorldView: Send + Sync {
    fn sightings(&self) -> Vec<Sighting>;
}

/// World snapshot the host overwrites whenever positions change
#[derive(Debug, Clone, Default)]
pub struct SharedWorld {
    sightings: Arc<RwLock<Vec<Sighting>>>,
}

impl SharedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, sightings: Vec<Sighting>) {
        if let Ok(mut current) = self.sightings.write() {
            *current = sightings;
        }
    }
}

impl WorldView for SharedWorld {
    fn sightings(&self) -> Vec<Sighting> {
        self.sightings.read().map(|s| s.clone()).unwrap_or_default()
    }
}

struct DriverTask {
    outpost: Arc<Mutex<Outpost>>,
    kills: mpsc::UnboundedSender<KillEvent>,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct OutpostDriver {
    world: Arc<dyn WorldView>,
    hooks: Hooks,
    tick_interval: Duration,
    epoch: Instant,
    tasks: AHashMap<String, DriverTask>,
}

impl OutpostDriver {
    pub fn new(world: Arc<dyn WorldView>, hooks: Hooks, tick_interval: Duration) -> Self {
        Self {
            world,
            hooks,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            epoch: Instant::now(),
            tasks: AHashMap::new(),
        }
    }

    /// Driver clock reading
    pub fn now(&self) -> Timestamp {
        elapsed_since(self.epoch)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.keys().cloned().collect();
        names.sort();
        names
    }

    /// Take ownership of `outpost`, start it if needed, and begin ticking it
    pub async fn launch(&mut self, mut outpost: Outpost) -> Result<()> {
        let name = outpost.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(OutpostError::AlreadyRunning(name));
        }
        if !outpost.is_running() {
            outpost.start(self.now(), &self.hooks)?;
        }

        let outpost = Arc::new(Mutex::new(outpost));
        let (kill_tx, kill_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(run_outpost(
            Arc::clone(&outpost),
            Arc::clone(&self.world),
            self.hooks.clone(),
            self.tick_interval,
            self.epoch,
            kill_rx,
            stop_rx,
        ));

        tracing::info!(
            outpost = %name,
            interval_ms = self.tick_interval.as_millis() as u64,
            "outpost driver launched"
        );
        self.tasks.insert(
            name,
            DriverTask {
                outpost,
                kills: kill_tx,
                stop: stop_tx,
                handle,
            },
        );
        Ok(())
    }

    /// A sender the host's combat system can keep for reporting kills
    pub fn kill_sender(&self, name: &str) -> Result<mpsc::UnboundedSender<KillEvent>> {
        self.task(name).map(|t| t.kills.clone())
    }

    pub fn report_kill(&self, name: &str, kill: KillEvent) -> Result<()> {
        self.task(name)?
            .kills
            .send(kill)
            .map_err(|_| OutpostError::NotRunning(name.to_string()))
    }

    pub async fn status(&self, name: &str) -> Result<OutpostStatus> {
        let task = self.task(name)?;
        let outpost = task.outpost.lock().await;
        Ok(outpost.status(self.now()))
    }

    /// Whether the task for `name` is still ticking
    pub fn is_ticking(&self, name: &str) -> bool {
        self.tasks
            .get(name)
            .map(|t| !t.handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop ticking `name` after its current tick, stop the outpost, and
    /// return its final status
    pub async fn halt(&mut self, name: &str) -> Result<OutpostStatus> {
        let task = self
            .tasks
            .remove(name)
            .ok_or_else(|| OutpostError::OutpostNotFound(name.to_string()))?;

        let _ = task.stop.send(true);
        if let Err(e) = task.handle.await {
            tracing::warn!(outpost = name, error = %e, "outpost task ended abnormally");
        }

        let mut outpost = task.outpost.lock().await;
        if outpost.is_running() {
            outpost.stop(&self.hooks)?;
        }
        Ok(outpost.status(self.now()))
    }

    pub async fn shutdown(&mut self) -> Vec<OutpostStatus> {
        let mut statuses = Vec::new();
        for name in self.names() {
            match self.halt(&name).await {
                Ok(status) => statuses.push(status),
                Err(e) => tracing::warn!(outpost = %name, error = %e, "failed to halt outpost"),
            }
        }
        statuses
    }

    fn task(&self, name: &str) -> Result<&DriverTask> {
        self.tasks
            .get(name)
            .ok_or_else(|| OutpostError::OutpostNotFound(name.to_string()))
    }
}

impl std::fmt::Debug for OutpostDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutpostDriver")
            .field("tick_interval", &self.tick_interval)
            .field("outposts", &self.names())
            .finish()
    }
}

fn elapsed_since(epoch: Instant) -> Timestamp {
    Timestamp::from_millis(epoch.elapsed().as_millis() as u64)
}

async fn run_outpost(
    outpost: Arc<Mutex<Outpost>>,
    world: Arc<dyn WorldView>,
    hooks: Hooks,
    tick_interval: Duration,
    epoch: Instant,
    mut kills: mpsc::UnboundedReceiver<KillEvent>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
                continue;
            }
        }

        let mut pending = Vec::new();
        while let Ok(kill) = kills.try_recv() {
            pending.push(kill);
        }
        let sightings = world.sightings();

        let mut guard = outpost.lock().await;
        let report = guard.tick(&sightings, &pending, &hooks, elapsed_since(epoch));
        match report {
            Some(report) if report.resolution.is_some() => {
                tracing::info!(outpost = guard.name(), "objective resolved, driver stopping");
                break;
            }
            Some(_) => {}
            None => {
                tracing::debug!(outpost = guard.name(), "outpost stopped, driver exiting");
                break;
            }
        }
    }
}
