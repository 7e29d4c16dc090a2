//! Join validation and per-room connection state

use log::info;
use shared::Intent;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("display name must not be empty")]
    EmptyName,
    #[error("room code must not be empty")]
    EmptyRoom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Open,
    Closed { reason: String },
}

/// One joined room for the lifetime of a join, discarded on restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub room_code: String,
    pub display_name: String,
    pub local_identity: Option<String>,
    pub channel_state: ChannelState,
}

impl Session {
    /// Validates the join form and builds the join intent.
    ///
    /// Room state is not returned here: it arrives later as notifications.
    pub fn join(
        display_name: &str,
        room_code: &str,
        local_identity: Option<String>,
    ) -> Result<(Session, Intent), JoinError> {
        let display_name = display_name.trim();
        let room_code = room_code.trim();
        if display_name.is_empty() {
            return Err(JoinError::EmptyName);
        }
        if room_code.is_empty() {
            return Err(JoinError::EmptyRoom);
        }

        info!("Joining room {} as {}", room_code, display_name);
        let session = Session {
            room_code: room_code.to_string(),
            display_name: display_name.to_string(),
            local_identity,
            channel_state: ChannelState::Open,
        };
        let intent = Intent::JoinRoom {
            name: session.display_name.clone(),
            room: session.room_code.clone(),
        };
        Ok((session, intent))
    }

    pub fn is_open(&self) -> bool {
        self.channel_state == ChannelState::Open
    }

    pub fn close(&mut self, reason: &str) {
        self.channel_state = ChannelState::Closed {
            reason: reason.to_string(),
        };
    }
}
