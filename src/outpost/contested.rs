//! Contested outpost - occupancy, boosts, charge and overtime wired into one tick

use serde::{Deserialize, Serialize};

use crate::core::config::OutpostConfig;
use crate::core::types::{Party, PlayerId, Position, TeamId, Timestamp};
use crate::hooks::{Hooks, TeamRoster};
use crate::outpost::boost::{BoostLedger, KillCredit};
use crate::outpost::charge::{ChargeEngine, ChargeResult};
use crate::outpost::occupancy::{OccupancyTracker, OccupantSet, Sighting};
use crate::outpost::overtime::{OvertimeOutcome, OvertimeResolver, OvertimeState, OvertimeStep};

/// A kill reported by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillEvent {
    pub killer: PlayerId,
    pub killer_team: Option<TeamId>,
}

impl KillEvent {
    pub fn new(killer: PlayerId, killer_team: Option<TeamId>) -> Self {
        Self {
            killer,
            killer_team,
        }
    }
}

/// Which part of the state machine handled a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContestedStep {
    Charge(ChargeResult),
    Overtime(OvertimeStep),
}

impl ContestedStep {
    /// Final outcome, if this tick resolved overtime
    pub fn outcome(&self) -> Option<OvertimeOutcome> {
        match self {
            ContestedStep::Overtime(OvertimeStep::Resolved(outcome)) => Some(*outcome),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContestedObjective {
    config: OutpostConfig,
    tracker: OccupancyTracker,
    engine: ChargeEngine,
    ledger: BoostLedger,
    overtime: OvertimeResolver,
}

impl ContestedObjective {
    pub fn new(center: Position, config: OutpostConfig) -> Self {
        Self {
            tracker: OccupancyTracker::new(center, config.capture_radius),
            engine: ChargeEngine::new(config.clone()),
            ledger: BoostLedger::new(config.team_boost, config.solo_boost),
            overtime: OvertimeResolver::new(config.overtime_duration_secs, config.overtime_reset_limit),
            config,
        }
    }

    pub fn config(&self) -> &OutpostConfig {
        &self.config
    }

    pub fn occupants(&self) -> &OccupantSet {
        self.tracker.occupants()
    }

    pub fn tracker(&self) -> &OccupancyTracker {
        &self.tracker
    }

    pub fn ledger(&self) -> &BoostLedger {
        &self.ledger
    }

    pub fn charge(&self) -> f64 {
        self.engine.charge()
    }

    pub fn controlling_party(&self) -> Option<Party> {
        self.engine.controlling_party()
    }

    pub fn contest_start_time(&self) -> Option<Timestamp> {
        self.engine.state().contest_start_time
    }

    pub fn is_overtime_active(&self) -> bool {
        self.overtime.is_active()
    }

    pub fn overtime_state(&self) -> &OvertimeState {
        self.overtime.state()
    }

    pub fn overtime_remaining_secs(&self, now: Timestamp) -> f64 {
        self.overtime.remaining_secs(now)
    }

    /// Begin measuring elapsed time from `now`
    pub fn start(&mut self, now: Timestamp) {
        self.engine.resume(now);
    }

    /// Credit a kill against the teams seen at the last refresh
    pub fn record_kill(&mut self, kill: KillEvent, roster: &dyn TeamRoster) -> KillCredit {
        self.ledger.record_kill(
            kill.killer,
            kill.killer_team,
            &self.tracker.occupants().teams_in_radius,
            roster,
        )
    }

    /// One tick: refresh occupancy, credit kills, then charge or run overtime
    pub fn tick(
        &mut self,
        outpost: &str,
        sightings: &[Sighting],
        kills: &[KillEvent],
        hooks: &Hooks,
        now: Timestamp,
    ) -> ContestedStep {
        self.tracker.refresh(outpost, sightings, hooks);

        for kill in kills {
            self.record_kill(*kill, hooks.roster.as_ref());
        }

        if self.overtime.is_active() {
            let mut controller = self.engine.controlling_party();
            let step = self
                .overtime
                .tick(&self.tracker.occupants().teams_in_radius, &mut controller, now);
            self.engine.set_controlling_party(controller);
            return ContestedStep::Overtime(step);
        }

        let result = self.engine.tick(self.tracker.occupants(), &self.ledger, now);
        if result.entered_overtime {
            tracing::info!(outpost, "entering overtime");
            self.overtime.activate(now);
        }
        ContestedStep::Charge(result)
    }

    /// Back to a freshly constructed state; current occupants are reported as exited
    pub fn reset(&mut self, outpost: &str, hooks: &Hooks) {
        self.tracker.clear(outpost, hooks);
        self.engine.reset();
        self.ledger.clear();
        self.overtime.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::StaticRoster;
    use crate::outpost::charge::{ChargePhase, MAX_CHARGE};
    use glam::Vec3;

    fn objective() -> ContestedObjective {
        ContestedObjective::new(
            Vec3::ZERO,
            OutpostConfig {
                contest_grace_secs: 60.0,
                ..Default::default()
            },
        )
    }

    fn squad(team: u32, n: usize, at: Vec3) -> Vec<Sighting> {
        (0..n)
            .map(|_| Sighting::new(PlayerId::new(), Some(TeamId(team)), at))
            .collect()
    }

    fn run(obj: &mut ContestedObjective, sightings: &[Sighting], from: u64, to: u64) -> ContestedStep {
        let hooks = Hooks::default();
        let mut last = obj.tick("keep", sightings, &[], &hooks, Timestamp::from_secs(from));
        for s in (from + 1)..=to {
            last = obj.tick("keep", sightings, &[], &hooks, Timestamp::from_secs(s));
        }
        last
    }

    #[test]
    fn test_full_charge_starts_overtime() {
        let mut obj = objective();
        let a = squad(1, 3, Vec3::ZERO);
        obj.start(Timestamp::ZERO);
        let step = run(&mut obj, &a, 1, 100);

        match step {
            ContestedStep::Charge(result) => {
                assert!(result.entered_overtime);
                assert_eq!(result.charge, MAX_CHARGE);
            }
            other => panic!("expected charge step, got {other:?}"),
        }
        assert!(obj.is_overtime_active());
    }

    #[test]
    fn test_uncontested_overtime_resolves_for_controller() {
        let mut obj = objective();
        let a = squad(1, 2, Vec3::ZERO);
        obj.start(Timestamp::ZERO);
        run(&mut obj, &a, 1, 100);

        let step = run(&mut obj, &a, 101, 105);
        assert_eq!(
            step.outcome(),
            Some(OvertimeOutcome::Winner(Party::Team(TeamId(1))))
        );
        assert!(!obj.is_overtime_active());
    }

    #[test]
    fn test_overtime_takeover_moves_controller() {
        let mut obj = objective();
        obj.start(Timestamp::ZERO);
        run(&mut obj, &squad(1, 2, Vec3::ZERO), 1, 100);

        let step = run(&mut obj, &squad(2, 2, Vec3::ZERO), 101, 105);
        assert!(matches!(
            step,
            ContestedStep::Overtime(OvertimeStep::Reset { reset_count: 1, .. })
        ));
        assert_eq!(obj.controlling_party(), Some(Party::Team(TeamId(2))));
    }

    #[test]
    fn test_kills_credit_teams_seen_this_tick() {
        let mut obj = objective();
        let hooks = Hooks::default().with_roster(
            StaticRoster::new()
                .with_team(TeamId(1), 2)
                .with_team(TeamId(2), 4),
        );
        let mut sightings = squad(1, 2, Vec3::ZERO);
        sightings.extend(squad(2, 4, Vec3::ZERO));
        let kills = [
            KillEvent::new(sightings[0].player, Some(TeamId(1))),
            KillEvent::new(sightings[3].player, Some(TeamId(2))),
        ];

        obj.tick("keep", &sightings, &kills, &hooks, Timestamp::ZERO);
        assert_eq!(obj.ledger().team_weight(TeamId(1)), 1.0);
        assert_eq!(obj.ledger().team_weight(TeamId(2)), 0.5);
    }

    #[test]
    fn test_players_outside_radius_do_not_contest() {
        let mut obj = objective();
        let mut sightings = squad(1, 1, Vec3::ZERO);
        sightings.extend(squad(2, 5, Vec3::new(40.0, 0.0, 0.0)));
        obj.start(Timestamp::ZERO);
        let step = run(&mut obj, &sightings, 1, 10);
        match step {
            ContestedStep::Charge(result) => assert_eq!(result.phase, ChargePhase::Accruing),
            other => panic!("expected charge step, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut obj = objective();
        let a = squad(1, 1, Vec3::ZERO);
        obj.start(Timestamp::ZERO);
        run(&mut obj, &a, 1, 100);
        obj.record_kill(KillEvent::new(a[0].player, Some(TeamId(1))), &StaticRoster::new());

        obj.reset("keep", &Hooks::default());
        assert_eq!(obj.charge(), 0.0);
        assert_eq!(obj.controlling_party(), None);
        assert!(obj.ledger().is_empty());
        assert!(!obj.is_overtime_active());
        assert!(obj.occupants().is_empty());
    }
}
