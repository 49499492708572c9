use room_types::{PlayerId, RoomId};

/// Transitions and elections this peer drove. Changes written by other peers are not
/// reported here; they only show up as updated room state.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    RoomReserved {
        room_id: RoomId,
    },
    PlayerJoined {
        room_id: RoomId,
        player_id: PlayerId,
    },
    PlayerLeft {
        room_id: RoomId,
        player_id: PlayerId,
    },
    HostElected {
        room_id: RoomId,
        host_id: PlayerId,
    },
    GameStarted {
        room_id: RoomId,
        players: usize,
    },
    AnswerSubmitted {
        room_id: RoomId,
        player_id: PlayerId,
        turn: u32,
        sheet_index: u32,
    },
    TurnAdvanced {
        room_id: RoomId,
        turn: u32,
    },
    GameFinalized {
        room_id: RoomId,
        assignments: usize,
    },
}

impl RoomEvent {
    pub fn room_id(&self) -> &RoomId {
        match self {
            RoomEvent::RoomReserved { room_id }
            | RoomEvent::PlayerJoined { room_id, .. }
            | RoomEvent::PlayerLeft { room_id, .. }
            | RoomEvent::HostElected { room_id, .. }
            | RoomEvent::GameStarted { room_id, .. }
            | RoomEvent::AnswerSubmitted { room_id, .. }
            | RoomEvent::TurnAdvanced { room_id, .. }
            | RoomEvent::GameFinalized { room_id, .. } => room_id,
        }
    }
}

/// Event handler trait for processing room events
pub trait RoomEventHandler: Send {
    fn handle_event(&mut self, event: RoomEvent);
}

/// Simple event bus for distributing room events
#[derive(Default)]
pub struct RoomEventBus {
    handlers: Vec<Box<dyn RoomEventHandler>>,
}

impl RoomEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn RoomEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: RoomEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}
