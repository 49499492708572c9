use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DirectoryEntry, Player, PlayerId, Room, RoomError, RoomId, RoomSettings};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PeerCommand {
    CreateRoom { settings: RoomSettings },
    OpenRoom { slug: String },
    JoinRoom { name: String },
    LeaveRoom,
    StartGame,
    SubmitAnswer { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PeerNotice {
    RoomsChanged { rooms: Vec<DirectoryEntry> },
    RoomCreated { room_id: RoomId, share_link: String },
    RoomUpdate { view: RoomView },
    RoomClosed { room_id: RoomId },
    Error { error: RoomError },
}

/// Everything a front end needs to draw one room for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoomView {
    pub room: Room,
    pub players: Vec<Player>,
    pub me: PlayerId,
    pub joined: bool,
    pub is_host: bool,
    pub total_turns: u32,
    pub prompt: Option<String>,
    /// Sheet this player writes on during the current turn.
    pub my_sheet: Option<u32>,
    /// Submitted for the current turn and waiting for the others.
    pub waiting: bool,
    pub completed: u32,
    pub reveal: Option<RevealSheet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RevealSheet {
    pub sheet_index: u32,
    pub lines: Vec<String>,
}
