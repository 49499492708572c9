use room_types::{
    Answer, AnswerKey, Assignment, Entry, Player, PlayerId, RevealSheet, Room, RoomChange,
    RoomStatus, RoomView, TurnStatusEntry, TurnStatusKey,
};
use std::collections::BTreeMap;

use crate::{
    PromptDeck, Roster, Seating, SeatingPolicy, TurnBarrier, is_host, reveal_lines, sheet_index,
};

/// A peer's local picture of one room, folded from replica change events.
///
/// Events may arrive duplicated or out of order; each one overwrites or removes a single
/// keyed value, so folding the same set of final values always yields the same state.
#[derive(Debug, Clone, Default)]
pub struct RoomState {
    room: Option<Room>,
    players: BTreeMap<PlayerId, Player>,
    answers: BTreeMap<AnswerKey, Answer>,
    turn_status: BTreeMap<TurnStatusKey, TurnStatusEntry>,
    assignments: BTreeMap<PlayerId, Assignment>,
}

fn fold<K: Ord, V: PartialEq>(map: &mut BTreeMap<K, V>, key: K, entry: Entry<V>) -> bool {
    match entry {
        Entry::Present(value) => {
            if map.get(&key) == Some(&value) {
                return false;
            }
            map.insert(key, value);
            true
        }
        Entry::Removed => map.remove(&key).is_some(),
    }
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one change in. Returns false when the change was already reflected.
    pub fn apply(&mut self, change: RoomChange) -> bool {
        match change {
            RoomChange::Room(entry) => {
                let next = entry.present();
                if self.room == next {
                    return false;
                }
                self.room = next;
                true
            }
            RoomChange::Player(id, entry) => fold(&mut self.players, id, entry),
            RoomChange::Answer(key, entry) => fold(&mut self.answers, key, entry),
            RoomChange::TurnStatus(key, entry) => fold(&mut self.turn_status, key, entry),
            RoomChange::Assignment(id, entry) => fold(&mut self.assignments, id, entry),
        }
    }

    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub fn roster(&self) -> Roster {
        Roster::new(self.players.values().cloned())
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn answers(&self) -> &BTreeMap<AnswerKey, Answer> {
        &self.answers
    }

    pub fn turn_status(&self) -> &BTreeMap<TurnStatusKey, TurnStatusEntry> {
        &self.turn_status
    }

    pub fn assignments(&self) -> &BTreeMap<PlayerId, Assignment> {
        &self.assignments
    }

    pub fn seating(&self, policy: SeatingPolicy) -> Option<Seating> {
        let room = self.room.as_ref()?;
        Some(Seating::resolve(room, &self.roster(), policy))
    }

    /// Whether `player_id` already marked the current turn done.
    pub fn has_submitted(&self, player_id: PlayerId) -> bool {
        let Some(room) = &self.room else {
            return false;
        };
        room.status == RoomStatus::Playing
            && self
                .turn_status
                .get(&TurnStatusKey::new(room.current_turn, player_id))
                .is_some_and(TurnStatusEntry::is_done)
    }

    /// Sheet `player_id` writes on this turn, if they hold a seat in a running game.
    pub fn sheet_for(&self, player_id: PlayerId, policy: SeatingPolicy) -> Option<u32> {
        let room = self.room.as_ref()?;
        if room.status != RoomStatus::Playing {
            return None;
        }
        let seating = Seating::resolve(room, &self.roster(), policy);
        let position = seating.position(player_id)?;
        Some(sheet_index(position, room.current_turn, seating.len()))
    }

    pub fn view(
        &self,
        me: PlayerId,
        policy: SeatingPolicy,
        barrier: &TurnBarrier,
    ) -> Option<RoomView> {
        let room = self.room.as_ref()?;
        let roster = self.roster();
        let seating = Seating::resolve(room, &roster, policy);
        let playing = room.status == RoomStatus::Playing;

        let completed = if playing {
            let participants = seating.participants(&roster);
            barrier.completed(room.current_turn, &participants, &self.turn_status) as u32
        } else {
            0
        };

        let reveal = match room.status {
            RoomStatus::Reveal => self.assignments.get(&me).map(|assignment| RevealSheet {
                sheet_index: assignment.sheet_index,
                lines: reveal_lines(&self.answers, assignment.sheet_index, barrier.total_turns()),
            }),
            _ => None,
        };

        Some(RoomView {
            room: room.clone(),
            players: roster.players().to_vec(),
            me,
            joined: roster.contains(me),
            is_host: is_host(room, me),
            total_turns: barrier.total_turns(),
            prompt: playing.then(|| {
                PromptDeck::for_room(room)
                    .prompt_for(room.current_turn)
                    .to_string()
            }),
            my_sheet: self.sheet_for(me, policy),
            waiting: self.has_submitted(me),
            completed,
            reveal,
        })
    }
}
