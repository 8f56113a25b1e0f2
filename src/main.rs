//! Contested Outposts - Operator Console
//!
//! A line-based console for placing outposts, moving players around them and
//! stepping the simulation clock one second at a time.

use ahash::AHashMap;
use contested_outposts::core::error::Result;
use contested_outposts::core::types::{PlayerId, Position, TeamId, Timestamp};
use contested_outposts::core::Settings;
use contested_outposts::hooks::{Hooks, TeamRoster};
use contested_outposts::objective::OutpostRegistry;
use contested_outposts::outpost::{KillEvent, OutpostKind, Sighting};

use glam::Vec3;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, RwLock};

const CONFIG_PATH: &str = "config/outposts.toml";

/// Team sizes derived from whoever has joined the console session
#[derive(Debug, Clone, Default)]
struct ConsoleRoster {
    sizes: Arc<RwLock<AHashMap<TeamId, usize>>>,
}

impl ConsoleRoster {
    fn rebuild(&self, players: &AHashMap<String, ConsolePlayer>) {
        let mut sizes = AHashMap::new();
        for team in players.values().filter_map(|p| p.team) {
            *sizes.entry(team).or_insert(0) += 1;
        }
        if let Ok(mut current) = self.sizes.write() {
            *current = sizes;
        }
    }
}

impl TeamRoster for ConsoleRoster {
    fn member_count(&self, team: TeamId) -> Option<usize> {
        self.sizes.read().ok().and_then(|s| s.get(&team).copied())
    }
}

#[derive(Debug, Clone)]
struct ConsolePlayer {
    id: PlayerId,
    team: Option<TeamId>,
    position: Position,
}

struct Console {
    registry: OutpostRegistry,
    roster: ConsoleRoster,
    players: AHashMap<String, ConsolePlayer>,
    clock: Timestamp,
}

impl Console {
    fn sightings(&self) -> Vec<Sighting> {
        self.players
            .values()
            .map(|p| Sighting::new(p.id, p.team, p.position))
            .collect()
    }

    fn tick(&mut self) {
        self.clock = self.clock.advanced(std::time::Duration::from_secs(1));
        let sightings = self.sightings();
        for resolution in self.registry.tick_all(&sightings, self.clock) {
            match resolution.outcome.winner() {
                Some(party) => println!("*** {} captured by {} ***", resolution.outpost, party),
                None => println!("*** {} ended with no winner ***", resolution.outpost),
            }
        }
    }

    fn handle(&mut self, args: &[&str]) -> Result<()> {
        match args {
            ["create", name, kind, coords @ ..] => {
                let kind = match kind.parse::<OutpostKind>() {
                    Ok(kind) => kind,
                    Err(e) => {
                        println!("{}", e);
                        return Ok(());
                    }
                };
                let position = parse_position(coords).unwrap_or(Vec3::ZERO);
                self.registry.create(name, position, kind)?;
                println!("Created {} outpost '{}' at {}", kind, name.to_lowercase(), position);
            }
            ["remove", name] => {
                self.registry.remove(name)?;
                println!("Removed '{}'", name);
            }
            ["start", name] => {
                self.registry.start(name, self.clock)?;
                println!("Started '{}'", name);
            }
            ["stop", name] => {
                self.registry.stop(name)?;
                println!("Stopped '{}'", name);
            }
            ["join", player, rest @ ..] => {
                let team = rest.first().and_then(|t| t.parse::<u32>().ok()).map(TeamId);
                let entry = self
                    .players
                    .entry(player.to_string())
                    .or_insert_with(|| ConsolePlayer {
                        id: PlayerId::new(),
                        team: None,
                        position: Vec3::new(1000.0, 0.0, 1000.0),
                    });
                entry.team = team;
                self.roster.rebuild(&self.players);
                match team {
                    Some(team) => println!("{} joined {}", player, team),
                    None => println!("{} is playing solo", player),
                }
            }
            ["move", player, coords @ ..] => match (self.players.get_mut(*player), parse_position(coords)) {
                (Some(p), Some(position)) => {
                    p.position = position;
                    println!("{} moved to {}", player, position);
                }
                (None, _) => println!("Unknown player '{}'", player),
                (_, None) => println!("Usage: move <player> <x> <y> <z>"),
            },
            ["kill", player] => match self.players.get(*player) {
                Some(p) => {
                    let credited = self.registry.record_kill(KillEvent::new(p.id, p.team));
                    println!("Kill by {} credited at {} outpost(s)", player, credited);
                }
                None => println!("Unknown player '{}'", player),
            },
            ["tick"] | ["t"] => {
                self.tick();
                println!("Clock at {:.0}s", self.clock.millis() as f64 / 1000.0);
            }
            ["run", n] => match n.parse::<u32>() {
                Ok(n) => {
                    for _ in 0..n {
                        self.tick();
                    }
                    println!("Ran {} ticks, clock at {:.0}s", n, self.clock.millis() as f64 / 1000.0);
                }
                Err(_) => println!("Usage: run <number>"),
            },
            ["status"] | ["s"] => self.display_status(),
            _ => println!(
                "Unknown command. Available: create, remove, start, stop, join, move, kill, tick, run <n>, status, quit"
            ),
        }
        Ok(())
    }

    fn display_status(&self) {
        println!();
        println!("=== Outposts at {:.0}s ===", self.clock.millis() as f64 / 1000.0);
        let statuses = self.registry.status_all(self.clock);
        if statuses.is_empty() {
            println!("  (none)");
        }
        for status in statuses {
            let controller = status
                .controller
                .map(|c| c.to_string())
                .unwrap_or_else(|| "nobody".to_string());
            println!(
                "  {} [{}] {} - charge {:.1}%, held by {}",
                status.name,
                status.kind,
                if status.running { "running" } else { "stopped" },
                status.charge,
                controller
            );
            if status.overtime_active {
                println!(
                    "    OVERTIME {:.1}s left, {} reset(s)",
                    status.overtime_remaining_secs, status.overtime_resets
                );
            }
            if !status.teams_in_radius.is_empty() || status.solo_in_radius > 0 {
                println!(
                    "    on point: teams {:?}, {} solo",
                    status.teams_in_radius.iter().map(|t| t.0).collect::<Vec<_>>(),
                    status.solo_in_radius
                );
            }
        }
        println!();
    }
}

fn parse_position(coords: &[&str]) -> Option<Position> {
    match coords {
        [x, y, z] => Some(Vec3::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?)),
        _ => None,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("contested_outposts=debug")
        .init();

    tracing::info!("Outpost console starting...");

    let settings = Settings::load_or_default(Path::new(CONFIG_PATH));
    if let Err(problem) = settings.validate() {
        tracing::warn!(path = CONFIG_PATH, %problem, "outpost settings look inconsistent");
        println!("Warning: {}", problem);
    }
    let roster = ConsoleRoster::default();
    let hooks = Hooks::default().with_roster(roster.clone());

    let mut console = Console {
        registry: OutpostRegistry::new(settings, hooks),
        roster,
        players: AHashMap::new(),
        clock: Timestamp::ZERO,
    };

    println!("\n=== CONTESTED OUTPOSTS ===");
    println!();
    println!("Commands:");
    println!("  create <name> <simple|contested> [x y z]  - Place an outpost");
    println!("  remove <name>                            - Remove an outpost");
    println!("  start <name> / stop <name>               - Start or stop an objective");
    println!("  join <player> [team]                     - Add a player (no team = solo)");
    println!("  move <player> <x> <y> <z>                - Move a player");
    println!("  kill <player>                            - Report a kill by a player");
    println!("  tick / t                                 - Advance one second");
    println!("  run <n>                                  - Advance n seconds");
    println!("  status / s                               - Show outposts");
    println!("  quit / q                                 - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let args: Vec<&str> = input.split_whitespace().collect();

        match args.as_slice() {
            [] => continue,
            ["quit"] | ["q"] => break,
            args => {
                if let Err(e) = console.handle(args) {
                    println!("Error: {}", e);
                }
            }
        }
    }

    println!(
        "\nGoodbye! {} outpost(s), clock at {:.0}s.",
        console.registry.len(),
        console.clock.millis() as f64 / 1000.0
    );
    Ok(())
}
