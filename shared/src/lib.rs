use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const CANVAS_WIDTH: u32 = 900;
pub const CANVAS_HEIGHT: u32 = 500;
pub const DEFAULT_STROKE_COLOR: &str = "#000000";
pub const DEFAULT_BRUSH_SIZE: f32 = 4.0;
pub const MIN_BRUSH_SIZE: f32 = 2.0;
pub const MAX_BRUSH_SIZE: f32 = 12.0;
/// Remote segments are tolerated up to this width before being treated as malformed.
pub const MAX_REMOTE_BRUSH_SIZE: f32 = 64.0;
/// Segment endpoints beyond this magnitude are malformed; squared lengths stay finite.
pub const MAX_COORDINATE: f32 = 1.0e6;
pub const DEFAULT_ROUND_SECONDS: u32 = 60;
pub const TYPING_DISPLAY_WINDOW: Duration = Duration::from_millis(1500);
pub const MAX_FRAME_LEN: usize = 64 * 1024;
pub const FRAME_HEADER_LEN: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("codec failure: {0}")]
    Codec(#[from] bincode::Error),
    #[error("frame of {len} bytes exceeds the frame size limit")]
    FrameTooLarge { len: usize },
    #[error("invalid stroke color {0:?}")]
    InvalidColor(String),
    #[error("stroke segment has a non-finite coordinate")]
    NonFiniteCoordinate,
    #[error("stroke coordinate {0} is out of range")]
    CoordinateOutOfRange(f32),
    #[error("invalid brush size {0}")]
    InvalidBrushSize(f32),
    #[error("empty participant identity")]
    EmptyIdentity,
    #[error("duplicate participant identity {0:?}")]
    DuplicateIdentity(String),
    #[error("roster names more than one drawer")]
    MultipleDrawers,
}

/// Messages the client sends to the session coordinator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Intent {
    JoinRoom { name: String, room: String },
    Draw { room: String, segment: StrokeSegment },
    Guess { text: String },
    Typing { name: String },
    Leave,
}

/// Messages the session coordinator pushes to the client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Notification {
    Connected {
        identity: String,
    },
    Players {
        players: Vec<Participant>,
    },
    Message {
        author: String,
        text: String,
        kind: ChatKind,
    },
    Drawer {
        identity: String,
    },
    Word {
        text: String,
    },
    Hint {
        text: String,
    },
    Time {
        remaining_seconds: u32,
    },
    RoundClock {
        remaining_seconds: u32,
        hint: String,
    },
    Draw {
        segment: StrokeSegment,
    },
    Typing {
        author: String,
    },
    Role {
        role: SeatRole,
    },
    GameOver {
        standings: Vec<Participant>,
    },
    NewRound,
    Disconnected {
        reason: String,
    },
}

impl Notification {
    /// Rejects payloads that would corrupt local state derivation.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Notification::Connected { identity } | Notification::Drawer { identity } => {
                if identity.is_empty() {
                    return Err(ProtocolError::EmptyIdentity);
                }
                Ok(())
            }
            Notification::Players { players } => validate_roster(players),
            Notification::GameOver { standings } => validate_roster(standings),
            Notification::Draw { segment } => segment.validate(),
            _ => Ok(()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Connected { .. } => "connected",
            Notification::Players { .. } => "players",
            Notification::Message { .. } => "message",
            Notification::Drawer { .. } => "drawer",
            Notification::Word { .. } => "word",
            Notification::Hint { .. } => "hint",
            Notification::Time { .. } => "time",
            Notification::RoundClock { .. } => "round_clock",
            Notification::Draw { .. } => "draw",
            Notification::Typing { .. } => "typing",
            Notification::Role { .. } => "role",
            Notification::GameOver { .. } => "game_over",
            Notification::NewRound => "new_round",
            Notification::Disconnected { .. } => "disconnected",
        }
    }
}

fn validate_roster(players: &[Participant]) -> Result<(), ProtocolError> {
    let mut seen = HashSet::new();
    let mut drawers = 0;
    for player in players {
        if player.id.is_empty() {
            return Err(ProtocolError::EmptyIdentity);
        }
        if !seen.insert(player.id.as_str()) {
            return Err(ProtocolError::DuplicateIdentity(player.id.clone()));
        }
        if player.role == Role::Drawer {
            drawers += 1;
        }
    }
    if drawers > 1 {
        return Err(ProtocolError::MultipleDrawers);
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Drawer,
    Guesser,
    Spectator,
}

/// Seat assignment broadcast to a single identity: an active player or a spectator.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SeatRole {
    Player,
    Spectator,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Chat,
    SystemNotice,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub score: u32,
    pub role: Role,
}

impl Participant {
    pub fn new(id: &str, name: &str, score: u32, role: Role) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            score,
            role,
        }
    }
}

/// One straight line increment of a freehand stroke.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StrokeSegment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub color: String,
    pub size: f32,
}

impl StrokeSegment {
    pub fn new(from: (f32, f32), to: (f32, f32), color: &str, size: f32) -> Self {
        Self {
            x0: from.0,
            y0: from.1,
            x1: to.0,
            y1: to.1,
            color: color.to_string(),
            size,
        }
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        let coords = [self.x0, self.y0, self.x1, self.y1];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(ProtocolError::NonFiniteCoordinate);
        }
        if let Some(c) = coords.iter().find(|c| c.abs() > MAX_COORDINATE) {
            return Err(ProtocolError::CoordinateOutOfRange(*c));
        }
        if !self.size.is_finite() || self.size <= 0.0 || self.size > MAX_REMOTE_BRUSH_SIZE {
            return Err(ProtocolError::InvalidBrushSize(self.size));
        }
        self.rgb().map(|_| ())
    }

    pub fn rgb(&self) -> Result<Rgb, ProtocolError> {
        self.color.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
}

impl FromStr for Rgb {
    type Err = ProtocolError;

    /// Accepts `#rrggbb` and the short `#rgb` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Rgb {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            3 => Ok(Rgb {
                r: channel(&hex[0..1])? * 17,
                g: channel(&hex[1..2])? * 17,
                b: channel(&hex[2..3])? * 17,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Serializes a message into a length-prefixed frame.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    let body = bincode::serialize(message)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge { len: body.len() });
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Checks a received length prefix before the body is read.
pub fn frame_body_len(header: [u8; FRAME_HEADER_LEN]) -> Result<usize, ProtocolError> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge { len });
    }
    Ok(len)
}

pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProtocolError> {
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge { len: body.len() });
    }
    Ok(bincode::deserialize(body)?)
}
