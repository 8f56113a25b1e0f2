//! Integration tests for contested outposts
//!
//! These walk full objective cycles through the public API:
//! - Charge, contest decay and threshold floors
//! - Overtime resets, the reset limit and shrinking countdowns
//! - Pausing on an empty point
//! - Lifecycle round trips and collaborator notifications

use contested_outposts::core::error::{OutpostError, Result};
use contested_outposts::core::types::{Party, PlayerId, TeamId, Timestamp};
use contested_outposts::core::{OutpostConfig, SchedulerConfig, Settings};
use contested_outposts::hooks::{HookEvent, Hooks, LootHook, RecordingHooks, StaticRoster};
use contested_outposts::objective::{ObjectiveScheduler, OutpostRegistry, ScheduleAction};
use contested_outposts::outpost::{
    KillEvent, Occupant, Outpost, OutpostKind, OvertimeOutcome, Sighting, TickReport,
};
use glam::Vec3;

// ============================================================================
// Helpers
// ============================================================================

fn team(id: u32) -> Sighting {
    Sighting::new(PlayerId::new(), Some(TeamId(id)), Vec3::new(2.0, 0.0, 2.0))
}

fn scenario_config() -> OutpostConfig {
    OutpostConfig {
        capture_radius: 15.0,
        charge_time_secs: 100.0,
        contest_grace_secs: 60.0,
        charge_reduction_rate: 1.0,
        overtime_duration_secs: 5,
        overtime_reset_limit: 4,
        charge_thresholds: vec![25.0, 50.0, 75.0],
        ..Default::default()
    }
}

fn started(hooks: &Hooks) -> Outpost {
    let mut outpost = Outpost::contested("keep", Vec3::ZERO, scenario_config());
    outpost.start(Timestamp::ZERO, hooks).unwrap();
    outpost
}

/// Tick once per second over `from..=to`, returning the last report
fn hold(
    outpost: &mut Outpost,
    sightings: &[Sighting],
    hooks: &Hooks,
    from: u64,
    to: u64,
) -> Option<TickReport> {
    let mut last = None;
    for s in from..=to {
        last = outpost.tick(sightings, &[], hooks, Timestamp::from_secs(s));
    }
    last
}

// ============================================================================
// Charge and contest
// ============================================================================

/// Team A holds for 50s, team B arrives, and after the grace period the
/// reduction is held up by the 50 threshold.
#[test]
fn test_contest_decay_floors_at_reached_threshold() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);
    let a = [team(1)];
    let both = [team(1), team(2)];

    hold(&mut outpost, &a, &hooks, 1, 50);
    assert!((outpost.current_charge_percent() - 50.0).abs() < 1e-9);
    assert_eq!(outpost.controlling_party(), Some(Party::Team(TeamId(1))));

    hold(&mut outpost, &both, &hooks, 51, 110);
    assert!((outpost.current_charge_percent() - 50.0).abs() < 1e-9);
    let contest = outpost.contested_objective().unwrap().contest_start_time();
    assert_eq!(contest, Some(Timestamp::from_secs(51)));

    hold(&mut outpost, &both, &hooks, 111, 111);
    assert_eq!(outpost.current_charge_percent(), 50.0);
    let contest = outpost.contested_objective().unwrap().contest_start_time();
    assert_eq!(contest, Some(Timestamp::from_secs(111)));

    // Many more windows never push it lower
    hold(&mut outpost, &both, &hooks, 112, 1000);
    assert_eq!(outpost.current_charge_percent(), 50.0);
}

#[test]
fn test_uncontested_capture_takes_exactly_charge_time() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);

    let report = hold(&mut outpost, &[team(1)], &hooks, 1, 99).unwrap();
    assert!(!report.overtime_active);
    assert!(report.charge < 100.0);

    let report = hold(&mut outpost, &[team(1)], &hooks, 100, 100).unwrap();
    assert_eq!(report.charge, 100.0);
    assert!(report.overtime_active);
}

#[test]
fn test_empty_point_pauses_then_resumes() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);

    hold(&mut outpost, &[team(1)], &hooks, 1, 30);
    hold(&mut outpost, &[], &hooks, 31, 200);
    assert!((outpost.current_charge_percent() - 30.0).abs() < 1e-9);
    assert_eq!(outpost.controlling_party(), Some(Party::Team(TeamId(1))));

    hold(&mut outpost, &[team(1)], &hooks, 201, 210);
    assert!((outpost.current_charge_percent() - 40.0).abs() < 1e-9);
}

#[test]
fn test_outnumbered_team_earns_larger_boost() {
    let roster = StaticRoster::new()
        .with_team(TeamId(1), 1)
        .with_team(TeamId(2), 6);
    let hooks = Hooks::default().with_roster(roster);
    let mut outpost = started(&hooks);

    let small = team(1);
    let big = team(2);
    outpost.tick(&[small, big], &[], &hooks, Timestamp::from_secs(1));
    outpost.record_kill(KillEvent::new(small.player, Some(TeamId(1))), &hooks).unwrap();
    outpost.record_kill(KillEvent::new(big.player, Some(TeamId(2))), &hooks).unwrap();

    let ledger = outpost.contested_objective().unwrap().ledger();
    assert_eq!(ledger.team_weight(TeamId(1)), 1.0);
    assert_eq!(ledger.team_weight(TeamId(2)), 0.5);

    // Team 1 alone now charges at 1.0 + 0.5 per second
    hold(&mut outpost, &[small], &hooks, 2, 11);
    assert!((outpost.current_charge_percent() - 15.0).abs() < 1e-9);
}

/// A solo capture never locks the point: once the player walks off, the next
/// lone team claims and carries the charge all the way to overtime.
#[test]
fn test_team_claims_after_solo_walks_away() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);
    let solo = Sighting::new(PlayerId::new(), None, Vec3::ZERO);

    hold(&mut outpost, &[solo], &hooks, 1, 30);
    assert_eq!(outpost.controlling_party(), Some(Party::Solo(solo.player)));

    hold(&mut outpost, &[], &hooks, 31, 40);
    assert_eq!(outpost.controlling_party(), None);
    assert!((outpost.current_charge_percent() - 30.0).abs() < 1e-9);

    let report = hold(&mut outpost, &[team(1)], &hooks, 41, 110).unwrap();
    assert_eq!(report.controller.and_then(|p| p.team()), Some(TeamId(1)));
    assert_eq!(report.charge, 100.0);
    assert!(report.overtime_active);
}

#[test]
fn test_team_arriving_takes_over_solo_capture() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);
    let solo = Sighting::new(PlayerId::new(), None, Vec3::ZERO);

    hold(&mut outpost, &[solo], &hooks, 1, 20);
    let report = hold(&mut outpost, &[solo, team(2)], &hooks, 21, 30).unwrap();

    assert_eq!(report.controller, Some(Party::Team(TeamId(2))));
    assert!((report.charge - 30.0).abs() < 1e-9);
    assert_eq!(
        outpost.contested_objective().unwrap().contest_start_time(),
        None
    );
}

// ============================================================================
// Overtime
// ============================================================================

#[test]
fn test_overtime_resets_until_limit_then_shrinks() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);
    hold(&mut outpost, &[team(1)], &hooks, 1, 100);
    assert!(outpost.is_overtime_active());

    // Teams alternate alone on the point at every expiry
    let mut now = 100;
    for expected in 1..=4u32 {
        let challenger = if expected % 2 == 1 { 2 } else { 1 };
        hold(&mut outpost, &[team(challenger)], &hooks, now + 1, now + 5);
        now += 5;
        let overtime = *outpost.contested_objective().unwrap().overtime_state();
        assert_eq!(overtime.reset_count, expected);
        assert_eq!(overtime.remaining_duration_secs, 5);
        assert_eq!(outpost.controlling_party(), Some(Party::Team(TeamId(challenger))));
    }

    // Fifth challenge: count holds at the limit, countdown drops to 4s
    hold(&mut outpost, &[team(2)], &hooks, now + 1, now + 5);
    now += 5;
    let overtime = *outpost.contested_objective().unwrap().overtime_state();
    assert_eq!(overtime.reset_count, 4);
    assert_eq!(overtime.remaining_duration_secs, 4);

    // Sixth: 3s
    hold(&mut outpost, &[team(1)], &hooks, now + 1, now + 4);
    now += 4;
    let overtime = *outpost.contested_objective().unwrap().overtime_state();
    assert_eq!(overtime.remaining_duration_secs, 3);

    // Team 1 holds on through the shortened countdown and wins
    let report = hold(&mut outpost, &[team(1)], &hooks, now + 1, now + 3).unwrap();
    assert_eq!(
        report.resolution.map(|r| r.outcome),
        Some(OvertimeOutcome::Winner(Party::Team(TeamId(1))))
    );
}

#[test]
fn test_multi_team_overtime_never_resolves() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);
    hold(&mut outpost, &[team(1)], &hooks, 1, 100);

    let report = hold(&mut outpost, &[team(1), team(2)], &hooks, 101, 2000).unwrap();
    assert!(report.resolution.is_none());
    assert!(outpost.is_overtime_active());
    assert!(outpost.is_running());
}

#[test]
fn test_abandoned_overtime_goes_to_controller() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);
    hold(&mut outpost, &[team(3)], &hooks, 1, 100);

    let report = hold(&mut outpost, &[], &hooks, 101, 105).unwrap();
    assert_eq!(
        report.resolution.map(|r| r.outcome),
        Some(OvertimeOutcome::Winner(Party::Team(TeamId(3))))
    );
}

#[test]
fn test_solo_capture_wins_overtime() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);
    let solo = Sighting::new(PlayerId::new(), None, Vec3::ZERO);

    let report = hold(&mut outpost, &[solo], &hooks, 1, 105).unwrap();
    assert_eq!(
        report.resolution.map(|r| r.outcome),
        Some(OvertimeOutcome::Winner(Party::Solo(solo.player)))
    );
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_stop_start_matches_fresh_outpost() {
    let hooks = Hooks::default();
    let mut outpost = started(&hooks);
    let a = team(1);
    hold(&mut outpost, &[a], &hooks, 1, 100);
    outpost.record_kill(KillEvent::new(a.player, Some(TeamId(1))), &hooks).unwrap();
    assert!(outpost.is_overtime_active());

    outpost.stop(&hooks).unwrap();
    outpost.start(Timestamp::from_secs(500), &hooks).unwrap();

    let mut fresh = Outpost::contested("keep", Vec3::ZERO, scenario_config());
    fresh.start(Timestamp::from_secs(500), &hooks).unwrap();

    assert_eq!(
        outpost.status(Timestamp::from_secs(500)),
        fresh.status(Timestamp::from_secs(500))
    );
    assert_eq!(outpost.current_charge_percent(), 0.0);
    assert_eq!(outpost.controlling_party(), None);
    assert!(!outpost.is_overtime_active());
    assert!(outpost.contested_objective().unwrap().ledger().is_empty());
}

#[test]
fn test_stop_when_stopped_is_an_error() {
    let mut outpost = Outpost::contested("keep", Vec3::ZERO, scenario_config());
    assert!(matches!(
        outpost.stop(&Hooks::default()),
        Err(OutpostError::NotRunning(_))
    ));
}

#[test]
fn test_occupancy_and_rewards_reach_collaborators() {
    let recorder = RecordingHooks::new();
    let hooks = Hooks::recording(&recorder);
    let mut outpost = started(&hooks);
    let a = team(1);

    hold(&mut outpost, &[a], &hooks, 1, 105);

    let events = recorder.events();
    assert_eq!(
        events.first(),
        Some(&HookEvent::Refilled {
            outpost: "keep".into()
        })
    );
    assert!(events.contains(&HookEvent::Entered {
        outpost: "keep".into(),
        occupant: Occupant::Team(TeamId(1)),
    }));
    let resolutions = recorder.resolutions();
    assert_eq!(resolutions.len(), 1);
    assert_eq!(resolutions[0].kind, OutpostKind::Contested);
}

fn occupancy_counts(recorder: &RecordingHooks) -> (usize, usize) {
    let events = recorder.events();
    let entered = events
        .iter()
        .filter(|e| matches!(e, HookEvent::Entered { .. }))
        .count();
    let exited = events
        .iter()
        .filter(|e| matches!(e, HookEvent::Exited { .. }))
        .count();
    (entered, exited)
}

#[test]
fn test_stop_releases_occupants_to_observer() {
    let recorder = RecordingHooks::new();
    let hooks = Hooks::recording(&recorder);
    let mut outpost = started(&hooks);
    let solo = Sighting::new(PlayerId::new(), None, Vec3::ZERO);

    hold(&mut outpost, &[team(1), team(2), solo], &hooks, 1, 3);
    assert_eq!(occupancy_counts(&recorder), (3, 0));

    outpost.stop(&hooks).unwrap();
    assert_eq!(occupancy_counts(&recorder), (3, 3));

    // A restart sees the same crowd arrive again, paired with the earlier exits
    outpost.start(Timestamp::from_secs(10), &hooks).unwrap();
    hold(&mut outpost, &[team(1), team(2), solo], &hooks, 11, 12);
    outpost.stop(&hooks).unwrap();
    assert_eq!(occupancy_counts(&recorder), (6, 6));
}

#[test]
fn test_resolution_releases_occupants_to_observer() {
    let recorder = RecordingHooks::new();
    let hooks = Hooks::recording(&recorder);
    let mut outpost = started(&hooks);

    let report = hold(&mut outpost, &[team(1)], &hooks, 1, 105).unwrap();
    assert!(report.resolution.is_some());
    assert!(!outpost.is_running());
    assert_eq!(occupancy_counts(&recorder), (1, 1));
    assert!(recorder.events().contains(&HookEvent::Exited {
        outpost: "keep".into(),
        occupant: Occupant::Team(TeamId(1)),
    }));
}

struct BrokenLoot;

impl LootHook for BrokenLoot {
    fn refill_loot(&self, _outpost: &str) -> Result<()> {
        Err(OutpostError::Hook("chest missing".into()))
    }
}

#[test]
fn test_failing_collaborator_never_breaks_a_tick() {
    let hooks = Hooks::default().with_loot(BrokenLoot);
    let mut outpost = Outpost::contested(
        "keep",
        Vec3::ZERO,
        OutpostConfig {
            loot_refill_interval_secs: 1.0,
            ..scenario_config()
        },
    );
    outpost.start(Timestamp::ZERO, &hooks).unwrap();

    let report = hold(&mut outpost, &[team(1)], &hooks, 1, 20).unwrap();
    assert!((report.charge - 20.0).abs() < 1e-9);
}

// ============================================================================
// Registry and scheduling
// ============================================================================

#[test]
fn test_scheduler_drives_registry_cycles() {
    let mut registry = OutpostRegistry::new(Settings::default(), Hooks::default());
    registry.create("Keep", Vec3::ZERO, OutpostKind::Contested).unwrap();
    let mut scheduler = ObjectiveScheduler::new(SchedulerConfig {
        active_window_secs: 30.0,
        cooldown_secs: 10.0,
    });

    let sightings = [team(1)];
    let mut starts = 0;
    let mut stops = 0;
    for s in 1..=100u64 {
        let now = Timestamp::from_secs(s);
        match scheduler.step(1.0) {
            ScheduleAction::Start => {
                registry.start("keep", now).unwrap();
                starts += 1;
            }
            ScheduleAction::Stop => {
                registry.stop("keep").unwrap();
                stops += 1;
            }
            ScheduleAction::Idle => {}
        }
        registry.tick_all(&sightings, now);
    }

    // 30s on, 10s off
    assert_eq!(starts, 3);
    assert_eq!(stops, 2);
    assert!(registry.get("keep").unwrap().is_running());
}

#[test]
fn test_shipped_config_matches_defaults() {
    let settings = Settings::load(std::path::Path::new("config/outposts.toml")).unwrap();
    assert_eq!(settings, Settings::default());
}
