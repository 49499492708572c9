use std::fmt;
use std::str::FromStr;

use crate::PlayerId;

/// Ledger key: one answer per `(turn, sheet)`. Rendered `"{turn}_{sheet}"` in the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnswerKey {
    pub turn: u32,
    pub sheet_index: u32,
}

impl AnswerKey {
    pub fn new(turn: u32, sheet_index: u32) -> Self {
        Self { turn, sheet_index }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.turn, self.sheet_index)
    }
}

impl FromStr for AnswerKey {
    type Err = KeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (turn, sheet) = split_key(value)?;
        let sheet_index = sheet.parse().map_err(|_| KeyError::Malformed {
            key: value.to_string(),
        })?;
        Ok(Self { turn, sheet_index })
    }
}

/// Completion marker key: `"{turn}_{player_id}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnStatusKey {
    pub turn: u32,
    pub player_id: PlayerId,
}

impl TurnStatusKey {
    pub fn new(turn: u32, player_id: PlayerId) -> Self {
        Self { turn, player_id }
    }
}

impl fmt::Display for TurnStatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.turn, self.player_id)
    }
}

impl FromStr for TurnStatusKey {
    type Err = KeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (turn, player) = split_key(value)?;
        let player_id = player.parse().map_err(|_| KeyError::Malformed {
            key: value.to_string(),
        })?;
        Ok(Self { turn, player_id })
    }
}

fn split_key(value: &str) -> Result<(u32, &str), KeyError> {
    let malformed = || KeyError::Malformed {
        key: value.to_string(),
    };
    let (turn, rest) = value.split_once('_').ok_or_else(malformed)?;
    let turn = turn.parse().map_err(|_| malformed())?;
    Ok((turn, rest))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("malformed collection key '{key}'")]
    Malformed { key: String },
}
