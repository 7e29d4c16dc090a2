//! Serialized event core for one joined room
//!
//! Inbound notifications and local input both arrive here as [`Event`]s and are
//! applied strictly one at a time, in arrival order. That ordering is what keeps a
//! `NewRound` clear ahead of any stroke segment queued behind it. Every handler
//! returns the intents to publish; permission failures simply return nothing.

use crate::canvas::Surface;
use crate::chat::{ChatEntry, ChatLog, GuessComposer, TypingPresence};
use crate::game::{GameState, Phase};
use crate::network::ChannelEvent;
use crate::session::Session;
use crate::strokes::{Brush, StrokeEngine};
use log::{debug, info};
use shared::{ChatKind, Intent, Notification, Participant, Role};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    /// Surface coordinates, not window coordinates.
    PointerDown {
        x: f32,
        y: f32,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp,
    SetColor(String),
    SetBrushSize(f32),
    TypeChar(char),
    Backspace,
    SubmitGuess,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Notification(Notification),
    Input(UserInput),
    ChannelClosed { reason: String },
}

impl From<ChannelEvent> for Event {
    fn from(event: ChannelEvent) -> Self {
        match event {
            ChannelEvent::Notification(notification) => Event::Notification(notification),
            ChannelEvent::Closed { reason } => Event::ChannelClosed { reason },
        }
    }
}

pub struct RoomClient {
    session: Session,
    game: GameState,
    surface: Surface,
    strokes: StrokeEngine,
    chat: ChatLog,
    typing: TypingPresence,
    guess: GuessComposer,
}

impl RoomClient {
    pub fn new(session: Session) -> Self {
        let game = GameState::new(session.local_identity.clone());
        Self {
            session,
            game,
            surface: Surface::default(),
            strokes: StrokeEngine::new(),
            chat: ChatLog::new(),
            typing: TypingPresence::default(),
            guess: GuessComposer::new(),
        }
    }

    /// Applies one event and returns the intents it produced.
    pub fn handle(&mut self, event: Event, now: Instant) -> Vec<Intent> {
        match event {
            Event::Notification(notification) => {
                self.apply_notification(notification, now);
                Vec::new()
            }
            Event::Input(input) => {
                if !self.session.is_open() {
                    debug!("Channel closed; ignoring {:?}", input);
                    return Vec::new();
                }
                self.apply_input(input).into_iter().collect()
            }
            Event::ChannelClosed { reason } => {
                info!("Session lost: {}", reason);
                self.session.close(&reason);
                self.strokes.pointer_up();
                self.chat.push(
                    "",
                    &format!("Disconnected: {}", reason),
                    ChatKind::SystemNotice,
                );
                Vec::new()
            }
        }
    }

    /// Expires typing indicators whose window has passed.
    pub fn tick(&mut self, now: Instant) {
        self.typing.expire(now);
    }

    fn apply_notification(&mut self, notification: Notification, now: Instant) {
        if let Notification::Draw { segment } = &notification {
            // Stray segments are painted in any phase; the coordinator's stream wins.
            self.strokes.apply_remote(segment, &mut self.surface);
            return;
        }

        // Identity belongs to the channel, not the round, so it is taken in any phase.
        if let Notification::Connected { identity } = &notification {
            self.session.local_identity = Some(identity.clone());
            self.game.local_identity = Some(identity.clone());
        }

        if self.game.phase() == Phase::GameOver {
            debug!("Game over; ignoring {}", notification.kind());
            return;
        }

        let entered = self.game.apply_notification(&notification);

        match notification {
            Notification::Message { author, text, kind } => self.chat.push(&author, &text, kind),
            Notification::Typing { author } => {
                // Pulses carry only a display name, so a peer sharing ours is hidden too.
                if author != self.session.display_name {
                    self.typing.pulse(&author, now);
                }
            }
            Notification::Disconnected { reason } => {
                self.handle(Event::ChannelClosed { reason }, now);
            }
            _ => {}
        }

        match entered {
            Some(Phase::Ended) => {
                self.chat.clear();
                self.typing.clear();
                self.strokes.reset(&mut self.surface);
            }
            Some(Phase::GameOver) => self.strokes.pointer_up(),
            _ => {}
        }

        if !self.game.can_draw() && self.strokes.is_stroking() {
            self.strokes.pointer_up();
        }
    }

    fn apply_input(&mut self, input: UserInput) -> Option<Intent> {
        let can_draw = self.game.can_draw();
        let can_guess = self.game.can_guess();

        match input {
            UserInput::PointerDown { x, y } => {
                self.strokes.pointer_down(can_draw, x, y);
                None
            }
            UserInput::PointerMove { x, y } => self.strokes.pointer_move(
                can_draw,
                x,
                y,
                &self.session.room_code,
                &mut self.surface,
            ),
            UserInput::PointerUp => {
                self.strokes.pointer_up();
                None
            }
            UserInput::SetColor(color) => {
                self.strokes.set_color(&color);
                None
            }
            UserInput::SetBrushSize(size) => {
                self.strokes.set_size(size);
                None
            }
            UserInput::TypeChar(c) => self.guess.type_char(c, can_guess, &self.session.display_name),
            UserInput::Backspace => self.guess.backspace(can_guess, &self.session.display_name),
            UserInput::SubmitGuess => self.guess.submit(can_guess),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn phase(&self) -> Phase {
        self.game.phase()
    }

    pub fn role(&self) -> Role {
        self.game.role()
    }

    pub fn can_draw(&self) -> bool {
        self.session.is_open() && self.game.can_draw()
    }

    pub fn can_guess(&self) -> bool {
        self.session.is_open() && self.game.can_guess()
    }

    pub fn ranked_roster(&self) -> Vec<&Participant> {
        self.game.roster.ranked()
    }

    pub fn standings(&self) -> &[Participant] {
        &self.game.standings
    }

    pub fn winner(&self) -> Option<&Participant> {
        self.game.winner()
    }

    pub fn word_or_hint(&self) -> Option<&str> {
        self.game.word_or_hint()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.game.round.remaining_seconds
    }

    pub fn chat(&self) -> &[ChatEntry] {
        self.chat.entries()
    }

    pub fn chat_tail(&self, count: usize) -> &[ChatEntry] {
        self.chat.tail(count)
    }

    pub fn typing_authors(&self, now: Instant) -> Vec<&str> {
        self.typing.typing_authors(now)
    }

    pub fn guess_text(&self) -> &str {
        self.guess.text()
    }

    pub fn brush(&self) -> &Brush {
        self.strokes.brush()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }
}
