use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Millis, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TurnState {
    Done,
}

/// Marker that a player has submitted for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TurnStatusEntry {
    pub state: TurnState,
    pub timestamp: Millis,
}

impl TurnStatusEntry {
    pub fn done(timestamp: Millis) -> Self {
        Self {
            state: TurnState::Done,
            timestamp,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == TurnState::Done
    }
}

/// One line written on one sheet during one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Answer {
    pub text: String,
    pub player_id: PlayerId,
    pub turn: u32,
    pub sheet_index: u32,
    pub timestamp: Millis,
}

/// Which finished sheet a player reads aloud during the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Assignment {
    pub sheet_index: u32,
    pub assigned_at: Millis,
}
