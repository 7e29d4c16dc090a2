//! Round phase machine and derived permissions

use crate::roster::{rank_standings, resolve_role, Roster};
use log::{debug, info};
use shared::{Notification, Participant, Role, SeatRole, DEFAULT_ROUND_SECONDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Active,
    Ended,
    GameOver,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundState {
    pub phase: Phase,
    pub drawer: Option<String>,
    pub word: Option<String>,
    pub hint: Option<String>,
    pub remaining_seconds: u32,
}

impl RoundState {
    fn new() -> Self {
        Self {
            phase: Phase::Lobby,
            drawer: None,
            word: None,
            hint: None,
            remaining_seconds: DEFAULT_ROUND_SECONDS,
        }
    }
}

/// Local projection of the coordinator's room state.
///
/// Phases only move when a notification says so. Everything the renderer or the
/// permission gates need is derived from this on demand.
#[derive(Debug, Clone)]
pub struct GameState {
    pub local_identity: Option<String>,
    pub seat: Option<SeatRole>,
    pub round: RoundState,
    pub roster: Roster,
    pub standings: Vec<Participant>,
}

impl GameState {
    pub fn new(local_identity: Option<String>) -> Self {
        Self {
            local_identity,
            seat: None,
            round: RoundState::new(),
            roster: Roster::new(),
            standings: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.round.phase
    }

    /// Applies one authoritative notification and returns the phase it entered, if any.
    pub fn apply_notification(&mut self, notification: &Notification) -> Option<Phase> {
        if self.round.phase == Phase::GameOver {
            debug!(
                "Ignoring {} notification after game over",
                notification.kind()
            );
            return None;
        }

        match notification {
            Notification::Connected { identity } => {
                self.local_identity = Some(identity.clone());
                None
            }
            Notification::Players { players } => {
                self.roster.replace(players.clone());
                None
            }
            Notification::Drawer { identity } => {
                self.round.drawer = Some(identity.clone());
                match self.round.phase {
                    Phase::Lobby | Phase::Ended => self.enter(Phase::Active),
                    _ => None,
                }
            }
            Notification::Word { text } => {
                self.round.word = Some(text.clone());
                self.activate_from_lobby()
            }
            Notification::Hint { text } => {
                self.round.hint = Some(text.clone());
                self.activate_from_lobby()
            }
            Notification::RoundClock {
                remaining_seconds,
                hint,
            } => {
                self.round.remaining_seconds = *remaining_seconds;
                self.round.hint = Some(hint.clone());
                self.activate_from_lobby()
            }
            Notification::Time { remaining_seconds } => {
                self.round.remaining_seconds = *remaining_seconds;
                None
            }
            Notification::Role { role } => {
                self.seat = Some(*role);
                None
            }
            Notification::NewRound => {
                self.round.drawer = None;
                self.round.word = None;
                self.round.hint = None;
                self.round.remaining_seconds = DEFAULT_ROUND_SECONDS;
                self.enter(Phase::Ended)
            }
            Notification::GameOver { standings } => {
                self.standings = rank_standings(standings.clone());
                self.enter(Phase::GameOver)
            }
            Notification::Message { .. }
            | Notification::Draw { .. }
            | Notification::Typing { .. }
            | Notification::Disconnected { .. } => None,
        }
    }

    /// Local role, recomputed from the current snapshot on every call.
    pub fn role(&self) -> Role {
        resolve_role(
            self.local_identity.as_deref(),
            self.round.drawer.as_deref(),
            self.seat,
            &self.roster,
        )
    }

    /// The secret word for the drawer, the masked hint for everyone else.
    pub fn word_or_hint(&self) -> Option<&str> {
        if self.role() == Role::Drawer {
            self.round.word.as_deref()
        } else {
            self.round.hint.as_deref()
        }
    }

    pub fn can_guess(&self) -> bool {
        self.round.phase == Phase::Active && self.role() == Role::Guesser
    }

    pub fn can_draw(&self) -> bool {
        self.round.phase != Phase::GameOver && self.role() == Role::Drawer
    }

    pub fn winner(&self) -> Option<&Participant> {
        self.standings.first()
    }

    pub fn drawer_name(&self) -> Option<&str> {
        let drawer = self.round.drawer.as_deref()?;
        self.roster.get(drawer).map(|p| p.name.as_str())
    }

    fn activate_from_lobby(&mut self) -> Option<Phase> {
        if self.round.phase == Phase::Lobby {
            self.enter(Phase::Active)
        } else {
            None
        }
    }

    fn enter(&mut self, phase: Phase) -> Option<Phase> {
        info!("Phase {:?} -> {:?}", self.round.phase, phase);
        self.round.phase = phase;
        Some(phase)
    }
}
