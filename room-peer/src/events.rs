use room_core::{RoomEvent, RoomEventHandler};
use tokio::sync::mpsc;
use tracing::info;

/// Writes every driven event to the log.
pub struct EventLog;

impl RoomEventHandler for EventLog {
    fn handle_event(&mut self, event: RoomEvent) {
        match &event {
            RoomEvent::GameFinalized { room_id, assignments } => {
                info!("Room {} finalized with {} reveal sheets", room_id, assignments)
            }
            RoomEvent::TurnAdvanced { room_id, turn } => {
                info!("Room {} advanced to turn {}", room_id, turn + 1)
            }
            other => info!("{:?}", other),
        }
    }
}

/// Forwards events to a channel, for callers that want to observe transitions.
pub struct EventForwarder {
    sender: mpsc::UnboundedSender<RoomEvent>,
}

impl EventForwarder {
    pub fn new(sender: mpsc::UnboundedSender<RoomEvent>) -> Self {
        Self { sender }
    }
}

impl RoomEventHandler for EventForwarder {
    fn handle_event(&mut self, event: RoomEvent) {
        let _ = self.sender.send(event);
    }
}
