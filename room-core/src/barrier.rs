use room_types::{Player, Room, RoomStatus, TurnStatusEntry, TurnStatusKey};
use std::collections::BTreeMap;

use crate::TOTAL_TURNS;

/// What the turn barrier concluded for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierOutcome {
    /// Nothing to decide: the room is not playing or nobody is seated.
    Idle,
    Waiting { completed: usize, expected: usize },
    Advance { next_turn: u32 },
    Finalize,
}

/// Completion detection for the current turn. The outcome depends only on the room's
/// current turn, the participants and their markers, never on who evaluates it.
#[derive(Debug, Clone, Copy)]
pub struct TurnBarrier {
    total_turns: u32,
}

impl TurnBarrier {
    pub fn new(total_turns: u32) -> Self {
        Self {
            total_turns: total_turns.max(1),
        }
    }

    pub fn total_turns(&self) -> u32 {
        self.total_turns
    }

    pub fn completed(
        &self,
        turn: u32,
        participants: &[&Player],
        statuses: &BTreeMap<TurnStatusKey, TurnStatusEntry>,
    ) -> usize {
        participants
            .iter()
            .filter(|player| {
                statuses
                    .get(&TurnStatusKey::new(turn, player.id))
                    .is_some_and(TurnStatusEntry::is_done)
            })
            .count()
    }

    pub fn evaluate(
        &self,
        room: &Room,
        participants: &[&Player],
        statuses: &BTreeMap<TurnStatusKey, TurnStatusEntry>,
    ) -> BarrierOutcome {
        if room.status != RoomStatus::Playing || participants.is_empty() {
            return BarrierOutcome::Idle;
        }

        let expected = participants.len();
        let completed = self.completed(room.current_turn, participants, statuses);
        if completed < expected {
            return BarrierOutcome::Waiting {
                completed,
                expected,
            };
        }

        if room.current_turn + 1 >= self.total_turns {
            BarrierOutcome::Finalize
        } else {
            BarrierOutcome::Advance {
                next_turn: room.current_turn + 1,
            }
        }
    }
}

impl Default for TurnBarrier {
    fn default() -> Self {
        Self::new(TOTAL_TURNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use room_types::RoomId;
    use uuid::Uuid;

    fn player(joined_at: i64) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: format!("P{}", joined_at),
            joined_at,
            last_active: joined_at,
        }
    }

    fn playing_room(turn: u32) -> Room {
        Room {
            id: RoomId::from_slug("barrier"),
            group_name: "Barrier".to_string(),
            max_players: 8,
            max_words: 12,
            status: RoomStatus::Playing,
            current_turn: turn,
            host_id: None,
            only_host_starts: true,
            prompts: Vec::new(),
            seating: Vec::new(),
            created_at: 0,
            started_at: Some(0),
            finished_at: None,
        }
    }

    fn mark(
        statuses: &mut BTreeMap<TurnStatusKey, TurnStatusEntry>,
        turn: u32,
        player: &Player,
    ) {
        statuses.insert(TurnStatusKey::new(turn, player.id), TurnStatusEntry::done(1));
    }

    #[test]
    fn test_waits_until_everyone_is_done() {
        let players: Vec<Player> = (0..4).map(player).collect();
        let refs: Vec<&Player> = players.iter().collect();
        let barrier = TurnBarrier::default();
        let room = playing_room(2);
        let mut statuses = BTreeMap::new();

        for (done, p) in players.iter().enumerate() {
            assert_eq!(
                barrier.evaluate(&room, &refs, &statuses),
                BarrierOutcome::Waiting {
                    completed: done,
                    expected: 4
                }
            );
            mark(&mut statuses, 2, p);
        }

        assert_eq!(
            barrier.evaluate(&room, &refs, &statuses),
            BarrierOutcome::Advance { next_turn: 3 }
        );
    }

    #[test]
    fn test_markers_for_other_turns_do_not_count() {
        let players: Vec<Player> = (0..2).map(player).collect();
        let refs: Vec<&Player> = players.iter().collect();
        let mut statuses = BTreeMap::new();
        mark(&mut statuses, 0, &players[0]);
        mark(&mut statuses, 0, &players[1]);
        mark(&mut statuses, 1, &players[0]);

        let outcome = TurnBarrier::default().evaluate(&playing_room(1), &refs, &statuses);
        assert_eq!(
            outcome,
            BarrierOutcome::Waiting {
                completed: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn test_last_turn_finalizes() {
        let players: Vec<Player> = (0..2).map(player).collect();
        let refs: Vec<&Player> = players.iter().collect();
        let mut statuses = BTreeMap::new();
        for p in &players {
            mark(&mut statuses, TOTAL_TURNS - 1, p);
        }

        let outcome =
            TurnBarrier::default().evaluate(&playing_room(TOTAL_TURNS - 1), &refs, &statuses);
        assert_eq!(outcome, BarrierOutcome::Finalize);
    }

    #[test]
    fn test_idle_outside_play_or_without_players() {
        let players: Vec<Player> = (0..2).map(player).collect();
        let refs: Vec<&Player> = players.iter().collect();
        let statuses = BTreeMap::new();
        let barrier = TurnBarrier::default();

        let mut lobby = playing_room(0);
        lobby.status = RoomStatus::Lobby;
        assert_eq!(barrier.evaluate(&lobby, &refs, &statuses), BarrierOutcome::Idle);
        assert_eq!(
            barrier.evaluate(&playing_room(0), &[], &statuses),
            BarrierOutcome::Idle
        );
    }

    #[test]
    fn test_outcome_is_a_function_of_state() {
        let players: Vec<Player> = (0..3).map(player).collect();
        let refs: Vec<&Player> = players.iter().collect();
        let mut statuses = BTreeMap::new();
        for p in &players {
            mark(&mut statuses, 0, p);
        }
        let room = playing_room(0);

        let first = TurnBarrier::default().evaluate(&room, &refs, &statuses);
        let second = TurnBarrier::new(TOTAL_TURNS).evaluate(&room, &refs, &statuses);
        assert_eq!(first, second);
    }
}
