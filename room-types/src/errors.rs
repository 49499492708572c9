use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::RoomStatus;

/// Failures surfaced to the person who triggered an action. Replication anomalies never
/// appear here; they are absorbed where they are observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum RoomError {
    #[error("name is empty or has no usable characters")]
    InvalidName,
    #[error("a room named '{slug}' already exists")]
    AlreadyExists { slug: String },
    #[error("no room named '{slug}'")]
    NotFound { slug: String },
    #[error("room is full ({max_players} players)")]
    RoomFull { max_players: u8 },
    #[error("join the room first")]
    NotJoined,
    #[error("only the host can start the game")]
    NotHost,
    #[error("need at least {required} players, have {present}")]
    NotEnoughPlayers { required: u8, present: u8 },
    #[error("action not available while the room is {current}")]
    InvalidPhase { current: RoomStatus },
    #[error("you joined after this game started; wait for the next one")]
    NotSeated,
    #[error("write something before confirming")]
    EmptyAnswer,
    #[error("no room is open")]
    NoOpenRoom,
    #[error("store rejected the write: {message}")]
    Store { message: String },
}
