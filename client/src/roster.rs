//! Roster projection and local role resolution
//!
//! The roster is a read-only cache of the coordinator's last `Players` broadcast.
//! It is replaced wholesale on every broadcast and never edited locally, so scores
//! only ever change because the coordinator said so.

use shared::{Participant, Role, SeatRole};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in the latest snapshot. Nothing from the previous one survives.
    pub fn replace(&mut self, participants: Vec<Participant>) {
        self.participants = participants;
    }

    /// Participants in payload order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Participants by descending score; equal scores keep payload order.
    pub fn ranked(&self) -> Vec<&Participant> {
        let mut ranked: Vec<&Participant> = self.participants.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    pub fn get(&self, identity: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == identity)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

/// Orders final standings for the post-game summary. The winner is the first entry.
pub fn rank_standings(mut standings: Vec<Participant>) -> Vec<Participant> {
    // `sort_by` is stable, which keeps payload order for tied scores.
    standings.sort_by(|a, b| b.score.cmp(&a.score));
    standings
}

/// Derives the local participant's role from the current snapshot.
///
/// Drawer identity wins. Otherwise the explicit seat assignment decides, then
/// the local roster entry, and a participant with neither is a guesser.
/// Nothing here is cached; callers recompute on every read.
pub fn resolve_role(
    local_identity: Option<&str>,
    drawer_identity: Option<&str>,
    seat: Option<SeatRole>,
    roster: &Roster,
) -> Role {
    if let (Some(local), Some(drawer)) = (local_identity, drawer_identity) {
        if local == drawer {
            return Role::Drawer;
        }
    }

    match seat {
        Some(SeatRole::Spectator) => Role::Spectator,
        Some(SeatRole::Player) => Role::Guesser,
        None => match local_identity.and_then(|id| roster.get(id)).map(|p| p.role) {
            Some(Role::Spectator) => Role::Spectator,
            // A roster drawer flag that disagrees with the drawer notification is stale.
            Some(Role::Drawer) | Some(Role::Guesser) | None => Role::Guesser,
        },
    }
}
