//! Kill boosts
//!
//! Kills speed up capture. Team kills are weighted toward outnumbered teams;
//! solo kills count one each. Nothing here decays within an objective cycle.

use ahash::{AHashMap, AHashSet};

use crate::core::types::{Party, PlayerId, TeamId};
use crate::hooks::TeamRoster;

/// Weight credited for a kill by the smallest team on the point
pub const FULL_BOOST_UNIT: f64 = 1.0;
/// Weight credited for a kill by any larger team
pub const HALF_BOOST_UNIT: f64 = 0.5;

/// What a recorded kill was worth
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KillCredit {
    Team { team: TeamId, weight: f64 },
    Solo { player: PlayerId, kills: u32 },
}

/// Accumulated kill weights per team and kill counts per solo player
#[derive(Debug, Clone)]
pub struct BoostLedger {
    team_weights: AHashMap<TeamId, f64>,
    solo_kills: AHashMap<PlayerId, u32>,
    team_boost: f64,
    solo_boost: f64,
}

impl BoostLedger {
    pub fn new(team_boost: f64, solo_boost: f64) -> Self {
        Self {
            team_weights: AHashMap::new(),
            solo_kills: AHashMap::new(),
            team_boost,
            solo_boost,
        }
    }

    /// Credit a kill
    ///
    /// A team killer earns a full unit if their team is tied for smallest among
    /// the teams in radius, half a unit otherwise. Unknown teams count as size 0.
    pub fn record_kill(
        &mut self,
        killer: PlayerId,
        killer_team: Option<TeamId>,
        teams_in_radius: &AHashSet<TeamId>,
        roster: &dyn TeamRoster,
    ) -> KillCredit {
        match killer_team {
            Some(team) => {
                let team_size = roster.member_count(team).unwrap_or(0);
                let smallest = teams_in_radius
                    .iter()
                    .map(|t| roster.member_count(*t).unwrap_or(0))
                    .min()
                    .unwrap_or(0);
                let weight = if team_size <= smallest {
                    FULL_BOOST_UNIT
                } else {
                    HALF_BOOST_UNIT
                };
                let total = self.team_weights.entry(team).or_insert(0.0);
                *total += weight;
                tracing::debug!(%team, weight, total = *total, "team kill boost");
                KillCredit::Team { team, weight }
            }
            None => {
                let kills = self.solo_kills.entry(killer).or_insert(0);
                *kills += 1;
                tracing::debug!(%killer, kills = *kills, "solo kill boost");
                KillCredit::Solo {
                    player: killer,
                    kills: *kills,
                }
            }
        }
    }

    pub fn team_weight(&self, team: TeamId) -> f64 {
        self.team_weights.get(&team).copied().unwrap_or(0.0)
    }

    pub fn solo_kills(&self, player: PlayerId) -> u32 {
        self.solo_kills.get(&player).copied().unwrap_or(0)
    }

    /// Extra charge per second earned by `team`
    pub fn team_boost(&self, team: TeamId) -> f64 {
        self.team_weight(team) * self.team_boost
    }

    /// Extra charge per second earned by a solo `player`
    pub fn solo_boost(&self, player: PlayerId) -> f64 {
        self.solo_kills(player) as f64 * self.solo_boost
    }

    /// Extra charge per second for whichever party is charging
    pub fn boost_for(&self, party: &Party) -> f64 {
        match party {
            Party::Team(team) => self.team_boost(*team),
            Party::Solo(player) => self.solo_boost(*player),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.team_weights.is_empty() && self.solo_kills.is_empty()
    }

    pub fn clear(&mut self) {
        self.team_weights.clear();
        self.solo_kills.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::StaticRoster;

    fn roster() -> StaticRoster {
        StaticRoster::new()
            .with_team(TeamId(1), 2)
            .with_team(TeamId(2), 5)
    }

    fn radius(teams: &[u32]) -> AHashSet<TeamId> {
        teams.iter().map(|t| TeamId(*t)).collect()
    }

    #[test]
    fn test_smallest_team_gets_full_unit() {
        let mut ledger = BoostLedger::new(0.5, 1.0);
        let credit = ledger.record_kill(PlayerId::new(), Some(TeamId(1)), &radius(&[1, 2]), &roster());
        assert_eq!(
            credit,
            KillCredit::Team {
                team: TeamId(1),
                weight: FULL_BOOST_UNIT
            }
        );
        assert_eq!(ledger.team_boost(TeamId(1)), 0.5);
    }

    #[test]
    fn test_larger_team_gets_half_unit() {
        let mut ledger = BoostLedger::new(0.5, 1.0);
        ledger.record_kill(PlayerId::new(), Some(TeamId(2)), &radius(&[1, 2]), &roster());
        ledger.record_kill(PlayerId::new(), Some(TeamId(2)), &radius(&[1, 2]), &roster());
        assert_eq!(ledger.team_weight(TeamId(2)), 1.0);
    }

    #[test]
    fn test_tied_teams_both_count_as_smallest() {
        let roster = StaticRoster::new()
            .with_team(TeamId(1), 3)
            .with_team(TeamId(2), 3);
        let mut ledger = BoostLedger::new(0.5, 1.0);
        ledger.record_kill(PlayerId::new(), Some(TeamId(2)), &radius(&[1, 2]), &roster);
        assert_eq!(ledger.team_weight(TeamId(2)), FULL_BOOST_UNIT);
    }

    #[test]
    fn test_unknown_team_is_always_smallest() {
        let mut ledger = BoostLedger::new(0.5, 1.0);
        ledger.record_kill(PlayerId::new(), Some(TeamId(42)), &radius(&[1, 2]), &roster());
        assert_eq!(ledger.team_weight(TeamId(42)), FULL_BOOST_UNIT);
    }

    #[test]
    fn test_solo_kills_accumulate() {
        let mut ledger = BoostLedger::new(0.5, 1.5);
        let solo = PlayerId::new();
        ledger.record_kill(solo, None, &radius(&[]), &roster());
        let credit = ledger.record_kill(solo, None, &radius(&[]), &roster());
        assert_eq!(
            credit,
            KillCredit::Solo {
                player: solo,
                kills: 2
            }
        );
        assert_eq!(ledger.solo_boost(solo), 3.0);
        assert_eq!(ledger.boost_for(&Party::Solo(solo)), 3.0);
    }

    #[test]
    fn test_clear_empties_ledger() {
        let mut ledger = BoostLedger::new(0.5, 1.0);
        ledger.record_kill(PlayerId::new(), None, &radius(&[]), &roster());
        ledger.record_kill(PlayerId::new(), Some(TeamId(1)), &radius(&[1]), &roster());
        assert!(!ledger.is_empty());
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
