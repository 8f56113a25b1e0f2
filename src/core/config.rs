//! Outpost configuration with documented defaults
//!
//! Every tunable lives here. Values come from a TOML file; anything missing or
//! malformed falls back to its default, so a bad config never stops an objective.

use ordered_float::OrderedFloat;
use std::fs;
use std::path::Path;

use crate::core::error::Result;

/// Configuration for contested outposts (charge, contest and overtime)
#[derive(Debug, Clone, PartialEq)]
pub struct OutpostConfig {
    /// Distance from the reference point that counts as "on the point" (world units)
    pub capture_radius: f32,

    /// Seconds a lone, unboosted controller needs to charge from 0 to 100
    ///
    /// Accrual is wall-clock based: the per-second rate is `100 / charge_time_secs`
    /// no matter how irregularly ticks arrive.
    pub charge_time_secs: f64,

    /// Charge removed each time a contest outlasts the grace period
    pub charge_reduction_rate: f64,

    /// Seconds a contest must persist before charge starts to decay
    ///
    /// Earlier revisions of the game used 60s, later ones 120s.
    pub contest_grace_secs: f64,

    /// Full overtime countdown in seconds
    pub overtime_duration_secs: u32,

    /// Number of full-duration overtime resets before the countdown starts shrinking
    pub overtime_reset_limit: u32,

    /// Extra charge per second for each unit of team kill weight
    pub team_boost: f64,

    /// Extra charge per second for each kill by a solo player
    pub solo_boost: f64,

    /// Checkpoints contest decay cannot push charge below once reached (ascending)
    pub charge_thresholds: Vec<f64>,

    /// Seconds between loot refills while the outpost is running
    pub loot_refill_interval_secs: f64,
}

impl Default for OutpostConfig {
    fn default() -> Self {
        Self {
            capture_radius: 15.0,
            charge_time_secs: 100.0,
            charge_reduction_rate: 1.0,
            contest_grace_secs: 120.0,
            overtime_duration_secs: 5,
            overtime_reset_limit: 4,
            team_boost: 0.5,
            solo_boost: 1.0,
            charge_thresholds: vec![25.0, 50.0, 75.0],
            loot_refill_interval_secs: 300.0,
        }
    }
}

impl OutpostConfig {
    /// Charge gained per second by an unboosted controller
    pub fn base_rate(&self) -> f64 {
        100.0 / self.charge_time_secs
    }

    /// Highest threshold at or below `charge`, if any
    pub fn threshold_floor(&self, charge: f64) -> Option<f64> {
        self.charge_thresholds
            .iter()
            .copied()
            .filter(|t| *t <= charge)
            .max_by_key(|t| OrderedFloat(*t))
    }

    /// Replace out-of-range values with defaults and normalise thresholds
    pub fn sanitize(&mut self) {
        let defaults = Self::default();

        if !(self.capture_radius.is_finite() && self.capture_radius > 0.0) {
            tracing::warn!(value = self.capture_radius, "invalid capture_radius, using default");
            self.capture_radius = defaults.capture_radius;
        }
        sanitize_positive(&mut self.charge_time_secs, defaults.charge_time_secs, "charge_time_secs");
        sanitize_non_negative(
            &mut self.charge_reduction_rate,
            defaults.charge_reduction_rate,
            "charge_reduction_rate",
        );
        sanitize_non_negative(
            &mut self.contest_grace_secs,
            defaults.contest_grace_secs,
            "contest_grace_secs",
        );
        if self.overtime_duration_secs == 0 {
            tracing::warn!("overtime duration must be at least 1s, using default");
            self.overtime_duration_secs = defaults.overtime_duration_secs;
        }
        sanitize_non_negative(&mut self.team_boost, defaults.team_boost, "team_boost");
        sanitize_non_negative(&mut self.solo_boost, defaults.solo_boost, "solo_boost");
        sanitize_positive(
            &mut self.loot_refill_interval_secs,
            defaults.loot_refill_interval_secs,
            "loot_refill_interval_secs",
        );

        let mut thresholds: Vec<OrderedFloat<f64>> = self
            .charge_thresholds
            .iter()
            .filter(|t| t.is_finite())
            .map(|t| OrderedFloat(t.clamp(0.0, 100.0)))
            .collect();
        thresholds.sort();
        thresholds.dedup();
        self.charge_thresholds = thresholds.into_iter().map(|t| t.into_inner()).collect();
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.charge_time_secs <= 0.0 {
            return Err(format!(
                "charge_time_secs ({}) must be positive",
                self.charge_time_secs
            ));
        }

        if self.capture_radius <= 0.0 {
            return Err(format!(
                "capture_radius ({}) must be positive",
                self.capture_radius
            ));
        }

        if self.overtime_duration_secs == 0 {
            return Err("overtime_duration_secs must be at least 1".into());
        }

        if self.charge_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!(
                "charge_thresholds ({:?}) must be strictly ascending",
                self.charge_thresholds
            ));
        }

        if self
            .charge_thresholds
            .iter()
            .any(|t| !(0.0..=100.0).contains(t))
        {
            return Err("charge_thresholds must lie within [0, 100]".into());
        }

        Ok(())
    }
}

/// Configuration for simple hold-to-win outposts
#[derive(Debug, Clone, PartialEq)]
pub struct HoldConfig {
    /// Distance from the reference point that counts as holding it
    pub radius: f32,

    /// Progress gained per second while holding (100 completes)
    pub progress_rate: f64,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            progress_rate: 1.0,
        }
    }
}

impl HoldConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if !(self.radius.is_finite() && self.radius > 0.0) {
            tracing::warn!(value = self.radius, "invalid hold radius, using default");
            self.radius = defaults.radius;
        }
        sanitize_positive(&mut self.progress_rate, defaults.progress_rate, "progress_rate");
    }
}

/// Objective activity window
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Seconds an objective stays active before it is stopped (6 hours by default)
    pub active_window_secs: f64,

    /// Seconds to wait after a stop before the next objective starts
    pub cooldown_secs: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            active_window_secs: 21_600.0,
            cooldown_secs: 0.0,
        }
    }
}

impl SchedulerConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        sanitize_positive(
            &mut self.active_window_secs,
            defaults.active_window_secs,
            "active_window_secs",
        );
        sanitize_non_negative(&mut self.cooldown_secs, defaults.cooldown_secs, "cooldown_secs");
    }
}

/// Everything a host needs to run outposts
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub contested: OutpostConfig,
    pub hold: HoldConfig,
    pub scheduler: SchedulerConfig,

    /// Milliseconds between driver ticks
    pub tick_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            contested: OutpostConfig::default(),
            hold: HoldConfig::default(),
            scheduler: SchedulerConfig::default(),
            tick_interval_ms: 1000,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load settings, falling back to defaults if the file is missing or unreadable
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "using default outpost settings");
                Self::default()
            }
        }
    }

    /// Parse settings from TOML text
    ///
    /// Only a syntax error is fatal. Missing keys and values of the wrong type
    /// take their defaults; out-of-range values are sanitised.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml = toml::Value::Table(content.parse::<toml::Table>()?);
        let defaults = Settings::default();
        let mut settings = Settings::default();

        if let Some(table) = toml.get("contested_outpost") {
            let c = &mut settings.contested;
            let d = &defaults.contested;
            c.capture_radius = read_f64(table, "capture_radius", d.capture_radius as f64) as f32;
            c.charge_time_secs = read_f64(table, "charge_time_secs", d.charge_time_secs);
            c.charge_reduction_rate =
                read_f64(table, "charge_reduction_rate", d.charge_reduction_rate);
            c.contest_grace_secs = read_f64(table, "contest_grace_secs", d.contest_grace_secs);
            c.team_boost = read_f64(table, "team_boost", d.team_boost);
            c.solo_boost = read_f64(table, "solo_boost", d.solo_boost);
            c.loot_refill_interval_secs = read_f64(
                table,
                "loot_refill_interval_secs",
                d.loot_refill_interval_secs,
            );
            if let Some(list) = table.get("charge_thresholds").and_then(|v| v.as_array()) {
                c.charge_thresholds = list.iter().filter_map(as_number).collect();
            }
            if let Some(overtime) = table.get("overtime") {
                c.overtime_duration_secs =
                    read_u32(overtime, "duration_secs", d.overtime_duration_secs);
                c.overtime_reset_limit = read_u32(overtime, "reset_limit", d.overtime_reset_limit);
            }
        }

        if let Some(table) = toml.get("outpost") {
            settings.hold.radius = read_f64(table, "radius", defaults.hold.radius as f64) as f32;
            settings.hold.progress_rate =
                read_f64(table, "progress_rate", defaults.hold.progress_rate);
        }

        if let Some(table) = toml.get("objective") {
            settings.scheduler.active_window_secs = read_f64(
                table,
                "active_window_secs",
                defaults.scheduler.active_window_secs,
            );
            settings.scheduler.cooldown_secs =
                read_f64(table, "cooldown_secs", defaults.scheduler.cooldown_secs);
        }

        let tick = read_f64(&toml, "tick_interval_ms", defaults.tick_interval_ms as f64);
        settings.tick_interval_ms = if tick >= 1.0 {
            tick as u64
        } else {
            tracing::warn!(value = tick, "invalid tick_interval_ms, using default");
            defaults.tick_interval_ms
        };

        settings.sanitize();
        Ok(settings)
    }

    pub fn sanitize(&mut self) {
        self.contested.sanitize();
        self.hold.sanitize();
        self.scheduler.sanitize();
    }

    /// Check the whole settings bundle, including combinations that are each
    /// valid on their own
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.contested.validate()?;

        if self.hold.progress_rate <= 0.0 {
            return Err(format!(
                "outpost progress_rate ({}) must be positive",
                self.hold.progress_rate
            ));
        }

        if self.scheduler.active_window_secs < self.contested.charge_time_secs {
            return Err(format!(
                "active_window_secs ({}) is shorter than charge_time_secs ({}); no capture can finish",
                self.scheduler.active_window_secs, self.contested.charge_time_secs
            ));
        }

        if self.tick_interval_ms as f64 / 1000.0 > self.contested.contest_grace_secs {
            return Err(format!(
                "tick_interval_ms ({}) exceeds the contest grace period",
                self.tick_interval_ms
            ));
        }

        Ok(())
    }
}

fn as_number(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

fn read_f64(table: &toml::Value, key: &str, default: f64) -> f64 {
    match table.get(key) {
        None => default,
        Some(value) => as_number(value).unwrap_or_else(|| {
            tracing::warn!(key, "expected a number, using default {}", default);
            default
        }),
    }
}

fn read_u32(table: &toml::Value, key: &str, default: u32) -> u32 {
    match table.get(key) {
        None => default,
        Some(value) => value
            .as_integer()
            .and_then(|i| u32::try_from(i).ok())
            .unwrap_or_else(|| {
                tracing::warn!(key, "expected a non-negative integer, using default {}", default);
                default
            }),
    }
}

fn sanitize_positive(value: &mut f64, default: f64, name: &str) {
    if !(value.is_finite() && *value > 0.0) {
        tracing::warn!(value = *value, "invalid {}, using default {}", name, default);
        *value = default;
    }
}

fn sanitize_non_negative(value: &mut f64, default: f64, name: &str) {
    if !(value.is_finite() && *value >= 0.0) {
        tracing::warn!(value = *value, "invalid {}, using default {}", name, default);
        *value = default;
    }
}
