//! Headless Siege Simulation
//!
//! Wandering teams and solo players fight over one contested outpost on a
//! simulated clock. The objective scheduler opens and closes the outpost's
//! active windows. Prints a JSON summary of how the rounds ended.

use clap::Parser;
use contested_outposts::core::types::{PlayerId, Position, TeamId, Timestamp};
use contested_outposts::core::Settings;
use contested_outposts::hooks::{Hooks, StaticRoster};
use contested_outposts::objective::{ObjectiveScheduler, OutpostRegistry, ScheduleAction};
use contested_outposts::outpost::{KillEvent, OutpostKind, Resolution, Sighting};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const OUTPOST_NAME: &str = "citadel";

/// Headless siege simulation - bots fighting over a contested outpost
#[derive(Parser, Debug)]
#[command(name = "siege_sim")]
#[command(about = "Simulate a contested outpost and output the result as JSON")]
struct Args {
    /// Number of teams
    #[arg(long, default_value_t = 2)]
    teams: u32,

    /// Players on each team
    #[arg(long, default_value_t = 3)]
    players_per_team: usize,

    /// Unaffiliated players
    #[arg(long, default_value_t = 1)]
    solos: usize,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated seconds before giving up
    #[arg(long, default_value_t = 3600)]
    max_seconds: u64,

    /// Outpost configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chance per second that a player on a contested point scores a kill
    #[arg(long, default_value_t = 0.05)]
    kill_chance: f64,

    /// Resolved objectives to play before stopping
    #[arg(long, default_value_t = 1)]
    rounds: usize,

    /// Override the scheduler's active window, in seconds
    #[arg(long)]
    window_secs: Option<f64>,
}

/// JSON output structure
#[derive(Serialize)]
struct SiegeResult {
    seed: u64,
    resolved: bool,
    winner: Option<String>,
    seconds: u64,
    final_charge: f64,
    overtime_resets: u32,
    kills: u32,
    /// Windows the scheduler closed before anyone won
    windows_expired: u32,
    resolutions: Vec<Resolution>,
}

struct Bot {
    id: PlayerId,
    team: Option<TeamId>,
    position: Position,
    /// How strongly this bot is drawn toward the outpost
    aggression: f32,
}

impl Bot {
    fn wander(&mut self, rng: &mut ChaCha8Rng) {
        let jitter = Vec3::new(rng.gen_range(-4.0..4.0), 0.0, rng.gen_range(-4.0..4.0));
        let pull = (-self.position).normalize_or_zero() * 3.0 * self.aggression;
        self.position += jitter + pull;
    }
}

fn spawn_bots(args: &Args, rng: &mut ChaCha8Rng) -> Vec<Bot> {
    let mut bots = Vec::new();
    let mut spawn = |team: Option<TeamId>, rng: &mut ChaCha8Rng| {
        let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance: f32 = rng.gen_range(30.0..80.0);
        bots.push(Bot {
            id: PlayerId::new(),
            team,
            position: Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance),
            aggression: rng.gen_range(0.2..1.0),
        });
    };
    for team in 1..=args.teams {
        for _ in 0..args.players_per_team {
            spawn(Some(TeamId(team)), rng);
        }
    }
    for _ in 0..args.solos {
        spawn(None, rng);
    }
    bots
}

/// Apply the scheduler's decision for this second; true if a window expired
fn follow_schedule(registry: &mut OutpostRegistry, action: ScheduleAction, now: Timestamp) -> bool {
    match action {
        ScheduleAction::Start => {
            if let Err(e) = registry.start(OUTPOST_NAME, now) {
                tracing::warn!(error = %e, "scheduled start failed");
            }
            false
        }
        ScheduleAction::Stop => {
            if let Err(e) = registry.stop(OUTPOST_NAME) {
                tracing::warn!(error = %e, "scheduled stop failed");
            }
            true
        }
        ScheduleAction::Idle => false,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut settings = match &args.config {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    if let Some(window) = args.window_secs {
        settings.scheduler.active_window_secs = window;
        settings.scheduler.sanitize();
    }
    if let Err(problem) = settings.validate() {
        tracing::warn!(%problem, "simulation settings look inconsistent");
    }
    let radius = settings.contested.capture_radius;
    let mut scheduler = ObjectiveScheduler::new(settings.scheduler.clone());

    let mut roster = StaticRoster::new();
    for team in 1..=args.teams {
        roster.set_team(TeamId(team), args.players_per_team);
    }

    let mut registry = OutpostRegistry::new(settings, Hooks::default().with_roster(roster));
    if let Err(e) = registry.create(OUTPOST_NAME, Vec3::ZERO, OutpostKind::Contested) {
        eprintln!("Failed to place outpost: {}", e);
        std::process::exit(1);
    }

    let mut clock = Timestamp::ZERO;
    let mut bots = spawn_bots(&args, &mut rng);
    let mut kills = 0u32;
    let mut overtime_resets = 0u32;
    let mut windows_expired = 0u32;
    let mut resolutions: Vec<Resolution> = Vec::new();

    for _ in 0..args.max_seconds {
        clock = clock.advanced(Duration::from_secs(1));
        if follow_schedule(&mut registry, scheduler.step(1.0), clock) {
            windows_expired += 1;
        }

        for bot in bots.iter_mut() {
            bot.wander(&mut rng);
        }

        // Fights only break out while the point is contested
        let contested = registry
            .get(OUTPOST_NAME)
            .filter(|o| o.is_running())
            .and_then(|o| o.contested_objective())
            .map(|c| c.occupants().sole_party().is_none() && !c.occupants().is_empty())
            .unwrap_or(false);
        if contested {
            for bot in bots.iter().filter(|b| b.position.length() <= radius) {
                if rng.gen_bool(args.kill_chance.clamp(0.0, 1.0)) {
                    registry.record_kill(KillEvent::new(bot.id, bot.team));
                    kills += 1;
                }
            }
        }

        let sightings: Vec<Sighting> = bots
            .iter()
            .map(|b| Sighting::new(b.id, b.team, b.position))
            .collect();
        let resolved = registry.tick_all(&sightings, clock);

        if let Some(outpost) = registry.get(OUTPOST_NAME) {
            overtime_resets = overtime_resets.max(outpost.status(clock).overtime_resets);
        }
        if !resolved.is_empty() {
            scheduler.objective_finished();
            resolutions.extend(resolved);
            if resolutions.len() >= args.rounds.max(1) {
                break;
            }
        }
    }

    let final_charge = registry
        .get(OUTPOST_NAME)
        .map(|o| o.current_charge_percent())
        .unwrap_or(0.0);

    let result = SiegeResult {
        seed,
        resolved: !resolutions.is_empty(),
        winner: resolutions
            .last()
            .and_then(|r| r.outcome.winner())
            .map(|p| p.to_string()),
        seconds: clock.millis() / 1000,
        final_charge,
        overtime_resets,
        kills,
        windows_expired,
        resolutions,
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize result: {}", e);
            std::process::exit(1);
        }
    }
}
