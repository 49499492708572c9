use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Millis, PlayerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: Millis,
    pub last_active: Millis,
}

/// The identity this device plays under, restored from local storage at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LocalIdentity {
    pub player_id: PlayerId,
    pub display_name: Option<String>,
}

impl LocalIdentity {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            display_name: None,
        }
    }

    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4())
    }
}
