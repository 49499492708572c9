use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::{Millis, PlayerId};

pub const MIN_PLAYERS: u8 = 2;
pub const MAX_PLAYERS: u8 = 8;

/// Room identifier. Rooms are addressed by the slug of their group name, so the id doubles
/// as the directory key and the deep-link parameter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an already-slugified value. Callers go through `slugify` first.
    pub fn from_slug(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RoomStatus {
    Lobby,   // Gathering players
    Playing, // Sheets are being written
    Reveal,  // Sheets are read aloud
}

impl RoomStatus {
    /// Valid phase changes. `Playing -> Playing` is a turn advance; starting a game is allowed
    /// from every phase because a restart re-runs the start side effects.
    pub fn can_transition_to(self, next: RoomStatus) -> bool {
        matches!(
            (self, next),
            (_, RoomStatus::Playing) | (RoomStatus::Playing, RoomStatus::Reveal)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Lobby => "lobby",
            RoomStatus::Playing => "playing",
            RoomStatus::Reveal => "reveal",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Room {
    pub id: RoomId,
    pub group_name: String,
    pub max_players: u8,
    pub max_words: u32,
    pub status: RoomStatus,
    pub current_turn: u32,
    pub host_id: Option<PlayerId>,
    pub only_host_starts: bool,
    pub prompts: Vec<String>,
    /// Roster order pinned when the current game started. Empty until the first start.
    pub seating: Vec<PlayerId>,
    pub created_at: Millis,
    pub started_at: Option<Millis>,
    pub finished_at: Option<Millis>,
}

/// Options chosen by whoever creates a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoomSettings {
    pub group_name: String,
    pub max_players: u8,
    pub max_words: u32,
    pub only_host_starts: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            group_name: String::new(),
            max_players: 6,
            max_words: 12,
            only_host_starts: true,
        }
    }
}

/// Partial room update. Every `Some` field is written as-is; `None` fields are left alone.
/// Transitions are expressed as patches so that replaying one is a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomPatch {
    pub status: Option<RoomStatus>,
    pub current_turn: Option<u32>,
    pub host_id: Option<PlayerId>,
    pub seating: Option<Vec<PlayerId>>,
    pub started_at: Option<Millis>,
    pub finished_at: Option<Millis>,
}

impl RoomPatch {
    pub fn host(host_id: PlayerId) -> Self {
        Self {
            host_id: Some(host_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the patch to a local copy, mirroring what the replica converges to.
    pub fn apply_to(&self, room: &mut Room) {
        if let Some(status) = self.status {
            room.status = status;
        }
        if let Some(turn) = self.current_turn {
            room.current_turn = turn;
        }
        if let Some(host_id) = self.host_id {
            room.host_id = Some(host_id);
        }
        if let Some(seating) = &self.seating {
            room.seating = seating.clone();
        }
        if let Some(started_at) = self.started_at {
            room.started_at = Some(started_at);
        }
        if let Some(finished_at) = self.finished_at {
            room.finished_at = Some(finished_at);
        }
    }
}

/// Lightweight pointer kept in the room index for discovery and slug collision checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DirectoryEntry {
    pub id: RoomId,
    pub group_name: String,
    pub created_at: Millis,
}

impl From<&Room> for DirectoryEntry {
    fn from(room: &Room) -> Self {
        DirectoryEntry {
            id: room.id.clone(),
            group_name: room.group_name.clone(),
            created_at: room.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(RoomStatus::Lobby.can_transition_to(RoomStatus::Playing));
        assert!(RoomStatus::Playing.can_transition_to(RoomStatus::Playing));
        assert!(RoomStatus::Playing.can_transition_to(RoomStatus::Reveal));
        assert!(RoomStatus::Reveal.can_transition_to(RoomStatus::Playing));

        assert!(!RoomStatus::Lobby.can_transition_to(RoomStatus::Reveal));
        assert!(!RoomStatus::Reveal.can_transition_to(RoomStatus::Lobby));
        assert!(!RoomStatus::Playing.can_transition_to(RoomStatus::Lobby));
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&RoomStatus::Reveal).unwrap();
        assert_eq!(json, "\"reveal\"");
        let parsed: RoomStatus = serde_json::from_str("\"playing\"").unwrap();
        assert_eq!(parsed, RoomStatus::Playing);
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut room = Room {
            id: RoomId::from_slug("friday"),
            group_name: "Friday".to_string(),
            max_players: 6,
            max_words: 12,
            status: RoomStatus::Playing,
            current_turn: 3,
            host_id: None,
            only_host_starts: true,
            prompts: Vec::new(),
            seating: Vec::new(),
            created_at: 1,
            started_at: Some(2),
            finished_at: None,
        };

        let patch = RoomPatch {
            current_turn: Some(4),
            ..RoomPatch::default()
        };
        patch.apply_to(&mut room);

        assert_eq!(room.current_turn, 4);
        assert_eq!(room.status, RoomStatus::Playing);
        assert_eq!(room.started_at, Some(2));
        assert!(RoomPatch::default().is_empty());
        assert!(!patch.is_empty());
    }
}
