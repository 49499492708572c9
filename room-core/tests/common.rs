#![allow(dead_code)]

use room_core::{ClearScope, RoomEvent, RoomEventHandler, RoomState, TransitionPlan};
use room_types::{
    Answer, AnswerKey, Entry, Millis, Player, PlayerId, Room, RoomChange, RoomId, RoomStatus,
    TurnStatusEntry, TurnStatusKey,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Creates a test player who joined at `joined_at`
pub fn create_test_player(name: &str, joined_at: Millis) -> Player {
    Player {
        id: Uuid::new_v4(),
        name: name.to_string(),
        joined_at,
        last_active: joined_at,
    }
}

/// Creates a lobby room hosted by `host_id`
pub fn create_test_room(slug: &str, host_id: Option<PlayerId>) -> Room {
    Room {
        id: RoomId::from_slug(slug),
        group_name: slug.to_string(),
        max_players: 8,
        max_words: 12,
        status: RoomStatus::Lobby,
        current_turn: 0,
        host_id,
        only_host_starts: true,
        prompts: Vec::new(),
        seating: Vec::new(),
        created_at: 0,
        started_at: None,
        finished_at: None,
    }
}

/// Replays plans and submissions as the change events a replica would deliver
pub struct TestTable {
    pub state: RoomState,
    pub log: Vec<RoomChange>,
}

impl TestTable {
    pub fn new(room: Room, players: &[Player]) -> Self {
        let mut table = Self {
            state: RoomState::new(),
            log: Vec::new(),
        };
        table.push(RoomChange::Room(Entry::Present(room)));
        for player in players {
            table.push(RoomChange::Player(player.id, Entry::Present(player.clone())));
        }
        table
    }

    pub fn push(&mut self, change: RoomChange) {
        self.state.apply(change.clone());
        self.log.push(change);
    }

    pub fn room(&self) -> Room {
        self.state.room().cloned().expect("room is known")
    }

    /// One line plus its completion marker
    pub fn submit(&mut self, player_id: PlayerId, sheet_index: u32, text: &str) {
        let turn = self.room().current_turn;
        let answer = Answer {
            text: text.to_string(),
            player_id,
            turn,
            sheet_index,
            timestamp: 0,
        };
        self.push(RoomChange::Answer(
            AnswerKey::new(turn, sheet_index),
            Entry::Present(answer),
        ));
        self.push(RoomChange::TurnStatus(
            TurnStatusKey::new(turn, player_id),
            Entry::Present(TurnStatusEntry::done(0)),
        ));
    }

    /// Write a plan the way the coordinator does: clears, then assignments, then the patch
    pub fn apply(&mut self, plan: &TransitionPlan) {
        plan.check_from(self.room().status)
            .expect("plan follows the phase table");
        for scope in &plan.clears {
            let removals: Vec<RoomChange> = match *scope {
                ClearScope::Answers => self
                    .state
                    .answers()
                    .keys()
                    .map(|key| RoomChange::Answer(*key, Entry::Removed))
                    .collect(),
                ClearScope::Assignments => self
                    .state
                    .assignments()
                    .keys()
                    .map(|id| RoomChange::Assignment(*id, Entry::Removed))
                    .collect(),
                ClearScope::TurnStatus => self
                    .state
                    .turn_status()
                    .keys()
                    .map(|key| RoomChange::TurnStatus(*key, Entry::Removed))
                    .collect(),
                ClearScope::TurnStatusThrough(turn) => self
                    .state
                    .turn_status()
                    .keys()
                    .filter(|key| key.turn <= turn)
                    .map(|key| RoomChange::TurnStatus(*key, Entry::Removed))
                    .collect(),
            };
            for change in removals {
                self.push(change);
            }
        }
        for (player_id, assignment) in &plan.assignments {
            self.push(RoomChange::Assignment(
                *player_id,
                Entry::Present(assignment.clone()),
            ));
        }
        let mut room = self.room();
        plan.patch.apply_to(&mut room);
        self.push(RoomChange::Room(Entry::Present(room)));
    }
}

/// Event collector for testing event emissions
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<RoomEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<RoomEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&RoomEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl RoomEventHandler for EventCollector {
    fn handle_event(&mut self, event: RoomEvent) {
        self.events.lock().unwrap().push(event);
    }
}
