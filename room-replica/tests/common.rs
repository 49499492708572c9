#![allow(dead_code)]

use room_replica::{MemoryReplica, RoomReplica};
use room_types::{Player, Room, RoomId, RoomStatus};
use std::sync::Arc;
use uuid::Uuid;

/// Creates a typed replica over a fresh in-memory store
pub fn create_test_replica() -> (MemoryReplica, RoomReplica<MemoryReplica>) {
    let store = MemoryReplica::new();
    let replica = RoomReplica::new(Arc::new(store.clone()));
    (store, replica)
}

/// Creates a lobby room with default settings
pub fn create_test_room(slug: &str) -> Room {
    Room {
        id: RoomId::from_slug(slug),
        group_name: slug.to_string(),
        max_players: 6,
        max_words: 12,
        status: RoomStatus::Lobby,
        current_turn: 0,
        host_id: None,
        only_host_starts: true,
        prompts: vec!["Who?".to_string(), "Where?".to_string()],
        seating: Vec::new(),
        created_at: 1_000,
        started_at: None,
        finished_at: None,
    }
}

/// Creates a player who joined at the given instant
pub fn create_test_player(name: &str, joined_at: i64) -> Player {
    Player {
        id: Uuid::new_v4(),
        name: name.to_string(),
        joined_at,
        last_active: joined_at,
    }
}
