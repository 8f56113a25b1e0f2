//! Occupancy tracking - who is standing on the point
//!
//! Individuals with a recognised team are represented only through their team;
//! everyone else is tracked as a solo player.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::types::{Party, PlayerId, Position, TeamId};
use crate::hooks::Hooks;

/// One individual's reported whereabouts for a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub player: PlayerId,
    pub team: Option<TeamId>,
    pub position: Position,
}

impl Sighting {
    pub fn new(player: PlayerId, team: Option<TeamId>, position: Position) -> Self {
        Self {
            player,
            team,
            position,
        }
    }
}

/// How an individual inside the radius is represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    Team(TeamId),
    Solo(PlayerId),
}

impl From<Occupant> for Party {
    fn from(occupant: Occupant) -> Self {
        match occupant {
            Occupant::Team(team) => Party::Team(team),
            Occupant::Solo(player) => Party::Solo(player),
        }
    }
}

/// Membership transition produced by a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyChange {
    Entered(Occupant),
    Exited(Occupant),
}

/// Teams and solo players currently inside the capture radius
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccupantSet {
    pub teams_in_radius: AHashSet<TeamId>,
    pub solo_players_in_radius: AHashSet<PlayerId>,
}

impl OccupantSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.teams_in_radius.is_empty() && self.solo_players_in_radius.is_empty()
    }

    /// The only party present, if exactly one is
    ///
    /// Solo players are irrelevant once any team is present.
    pub fn sole_party(&self) -> Option<Party> {
        match self.teams_in_radius.len() {
            0 if self.solo_players_in_radius.len() == 1 => self
                .solo_players_in_radius
                .iter()
                .next()
                .map(|p| Party::Solo(*p)),
            1 => self.teams_in_radius.iter().next().map(|t| Party::Team(*t)),
            _ => None,
        }
    }

    /// The only team present, if exactly one is
    pub fn sole_team(&self) -> Option<TeamId> {
        if self.teams_in_radius.len() == 1 {
            self.teams_in_radius.iter().next().copied()
        } else {
            None
        }
    }

    /// Sorted team ids, for stable display
    pub fn sorted_teams(&self) -> Vec<TeamId> {
        let mut teams: Vec<TeamId> = self.teams_in_radius.iter().copied().collect();
        teams.sort();
        teams
    }
}

/// Classifies nearby individuals into team and solo occupants
#[derive(Debug, Clone)]
pub struct OccupancyTracker {
    center: Position,
    radius: f32,
    members: AHashMap<PlayerId, Occupant>,
    occupants: OccupantSet,
    last_changes: Vec<OccupancyChange>,
}

impl OccupancyTracker {
    pub fn new(center: Position, radius: f32) -> Self {
        Self {
            center,
            radius,
            members: AHashMap::new(),
            occupants: OccupantSet::new(),
            last_changes: Vec::new(),
        }
    }

    pub fn center(&self) -> Position {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn occupants(&self) -> &OccupantSet {
        &self.occupants
    }

    /// Transitions produced by the most recent refresh
    pub fn last_changes(&self) -> &[OccupancyChange] {
        &self.last_changes
    }

    /// How `player` was counted in the last refresh, if they were inside
    pub fn occupant_of(&self, player: PlayerId) -> Option<Occupant> {
        self.members.get(&player).copied()
    }

    pub fn contains(&self, position: Position) -> bool {
        position.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Rebuild occupancy from the current world snapshot
    ///
    /// Anyone not sighted this tick counts as gone. Entered/exited notifications
    /// go to the occupancy observer; a failing observer is logged and ignored.
    pub fn refresh(&mut self, outpost: &str, sightings: &[Sighting], hooks: &Hooks) -> &OccupantSet {
        let mut members = AHashMap::with_capacity(sightings.len());
        for sighting in sightings.iter().filter(|s| self.contains(s.position)) {
            let occupant = match sighting.team {
                Some(team) if hooks.roster.recognizes(team) => Occupant::Team(team),
                _ => Occupant::Solo(sighting.player),
            };
            members.insert(sighting.player, occupant);
        }

        let mut next = OccupantSet::new();
        for occupant in members.values() {
            match occupant {
                Occupant::Team(team) => {
                    next.teams_in_radius.insert(*team);
                }
                Occupant::Solo(player) => {
                    next.solo_players_in_radius.insert(*player);
                }
            }
        }

        let mut changes = Vec::new();
        for team in next.teams_in_radius.difference(&self.occupants.teams_in_radius) {
            changes.push(OccupancyChange::Entered(Occupant::Team(*team)));
        }
        for player in next
            .solo_players_in_radius
            .difference(&self.occupants.solo_players_in_radius)
        {
            changes.push(OccupancyChange::Entered(Occupant::Solo(*player)));
        }
        for team in self.occupants.teams_in_radius.difference(&next.teams_in_radius) {
            changes.push(OccupancyChange::Exited(Occupant::Team(*team)));
        }
        for player in self
            .occupants
            .solo_players_in_radius
            .difference(&next.solo_players_in_radius)
        {
            changes.push(OccupancyChange::Exited(Occupant::Solo(*player)));
        }

        for change in &changes {
            let result = match change {
                OccupancyChange::Entered(occupant) => {
                    tracing::debug!(outpost, ?occupant, "entered capture radius");
                    hooks.observer.entered(outpost, *occupant)
                }
                OccupancyChange::Exited(occupant) => {
                    tracing::debug!(outpost, ?occupant, "exited capture radius");
                    hooks.observer.exited(outpost, *occupant)
                }
            };
            if let Err(e) = result {
                tracing::warn!(outpost, error = %e, "occupancy registry update failed");
            }
        }

        self.members = members;
        self.occupants = next;
        self.last_changes = changes;
        &self.occupants
    }

    /// Forget everyone, reporting each current occupant as exited
    pub fn clear(&mut self, outpost: &str, hooks: &Hooks) {
        let occupants = std::mem::take(&mut self.occupants);
        let leaving = occupants
            .teams_in_radius
            .iter()
            .map(|t| Occupant::Team(*t))
            .chain(occupants.solo_players_in_radius.iter().map(|p| Occupant::Solo(*p)));
        for occupant in leaving {
            tracing::debug!(outpost, ?occupant, "released from capture radius");
            if let Err(e) = hooks.observer.exited(outpost, occupant) {
                tracing::warn!(outpost, error = %e, "occupancy registry update failed");
            }
        }
        self.members.clear();
        self.last_changes.clear();
    }
}
