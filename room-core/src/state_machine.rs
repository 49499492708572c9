use room_types::{
    Assignment, Millis, MIN_PLAYERS, PlayerId, Room, RoomError, RoomPatch, RoomStatus,
};

use crate::{BarrierOutcome, Roster, Seating, final_assignments};

/// Which replicated collection a transition wipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    Answers,
    Assignments,
    /// Every completion marker.
    TurnStatus,
    /// Markers for turns up to and including this one. Markers already written for later
    /// turns survive a late duplicate of an earlier advance.
    TurnStatusThrough(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Start,
    Advance { from: u32, to: u32 },
    Finalize,
}

/// Desired state for one transition: what to wipe, what to assign, and the room fields to
/// overwrite. Applying a plan twice leaves the replica as applying it once does.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub kind: TransitionKind,
    pub clears: Vec<ClearScope>,
    pub assignments: Vec<(PlayerId, Assignment)>,
    pub patch: RoomPatch,
}

impl TransitionPlan {
    /// Status the room ends up in.
    pub fn target_status(&self) -> RoomStatus {
        self.patch.status.unwrap_or(RoomStatus::Playing)
    }

    /// Refuse a plan whose target phase cannot follow `current`, such as finalizing a
    /// room that never left the lobby.
    pub fn check_from(&self, current: RoomStatus) -> Result<(), RoomError> {
        if current.can_transition_to(self.target_status()) {
            Ok(())
        } else {
            Err(RoomError::InvalidPhase { current })
        }
    }
}

/// "Start game", from the lobby or as a restart from any later phase.
pub fn plan_start(
    room: &Room,
    roster: &Roster,
    requester: PlayerId,
    now: Millis,
) -> Result<TransitionPlan, RoomError> {
    if !roster.contains(requester) {
        return Err(RoomError::NotJoined);
    }
    if room.only_host_starts && room.host_id != Some(requester) {
        return Err(RoomError::NotHost);
    }
    if roster.len() < MIN_PLAYERS as usize {
        return Err(RoomError::NotEnoughPlayers {
            required: MIN_PLAYERS,
            present: roster.len() as u8,
        });
    }

    Ok(TransitionPlan {
        kind: TransitionKind::Start,
        clears: vec![
            ClearScope::Answers,
            ClearScope::TurnStatus,
            ClearScope::Assignments,
        ],
        assignments: Vec::new(),
        patch: RoomPatch {
            status: Some(RoomStatus::Playing),
            current_turn: Some(0),
            seating: Some(roster.ids()),
            started_at: Some(now),
            ..RoomPatch::default()
        },
    })
}

/// Translate a barrier outcome into the transition the host should write.
pub fn plan_for_outcome(
    outcome: BarrierOutcome,
    room: &Room,
    seating: &Seating,
    total_turns: u32,
    now: Millis,
) -> Option<TransitionPlan> {
    match outcome {
        BarrierOutcome::Idle | BarrierOutcome::Waiting { .. } => None,
        BarrierOutcome::Advance { next_turn } => Some(TransitionPlan {
            kind: TransitionKind::Advance {
                from: room.current_turn,
                to: next_turn,
            },
            clears: vec![ClearScope::TurnStatusThrough(room.current_turn)],
            assignments: Vec::new(),
            patch: RoomPatch {
                current_turn: Some(next_turn),
                ..RoomPatch::default()
            },
        }),
        BarrierOutcome::Finalize => Some(TransitionPlan {
            kind: TransitionKind::Finalize,
            clears: vec![ClearScope::TurnStatus],
            assignments: final_assignments(seating.seats(), now),
            patch: RoomPatch {
                status: Some(RoomStatus::Reveal),
                current_turn: Some(total_turns.saturating_sub(1)),
                finished_at: Some(now),
                ..RoomPatch::default()
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SeatingPolicy, TOTAL_TURNS};
    use room_types::{Player, RoomId};
    use uuid::Uuid;

    fn player(joined_at: i64) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: format!("P{}", joined_at),
            joined_at,
            last_active: joined_at,
        }
    }

    fn room(host_id: Option<PlayerId>) -> Room {
        Room {
            id: RoomId::from_slug("machine"),
            group_name: "Machine".to_string(),
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

    #[test]
    fn test_host_starts_game() {
        let a = player(1);
        let b = player(2);
        let roster = Roster::new(vec![a.clone(), b.clone()]);
        let plan = plan_start(&room(Some(a.id)), &roster, a.id, 99).unwrap();

        assert_eq!(plan.kind, TransitionKind::Start);
        assert_eq!(plan.target_status(), RoomStatus::Playing);
        assert_eq!(plan.patch.current_turn, Some(0));
        assert_eq!(plan.patch.started_at, Some(99));
        assert_eq!(plan.patch.seating, Some(vec![a.id, b.id]));
        assert!(plan.clears.contains(&ClearScope::Answers));
        assert!(plan.clears.contains(&ClearScope::TurnStatus));
        assert!(plan.clears.contains(&ClearScope::Assignments));
    }

    #[test]
    fn test_plans_respect_phase_table() {
        let a = player(1);
        let b = player(2);
        let roster = Roster::new(vec![a.clone(), b.clone()]);
        let lobby = room(Some(a.id));
        let seating = Seating::resolve(&lobby, &roster, SeatingPolicy::Live);

        let finalize =
            plan_for_outcome(BarrierOutcome::Finalize, &lobby, &seating, TOTAL_TURNS, 5).unwrap();
        assert_eq!(
            finalize.check_from(RoomStatus::Lobby),
            Err(RoomError::InvalidPhase {
                current: RoomStatus::Lobby
            })
        );
        assert!(finalize.check_from(RoomStatus::Playing).is_ok());

        let advance = plan_for_outcome(
            BarrierOutcome::Advance { next_turn: 1 },
            &lobby,
            &seating,
            TOTAL_TURNS,
            5,
        )
        .unwrap();
        assert!(advance.check_from(RoomStatus::Playing).is_ok());

        let restart = plan_start(&lobby, &roster, a.id, 9).unwrap();
        assert!(restart.check_from(RoomStatus::Reveal).is_ok());
        assert!(restart.check_from(RoomStatus::Lobby).is_ok());
    }

    #[test]
    fn test_start_guards() {
        let a = player(1);
        let b = player(2);
        let stranger = Uuid::new_v4();
        let pair = Roster::new(vec![a.clone(), b.clone()]);
        let alone = Roster::new(vec![a.clone()]);

        assert_eq!(
            plan_start(&room(Some(a.id)), &pair, stranger, 0),
            Err(RoomError::NotJoined)
        );
        assert_eq!(
            plan_start(&room(Some(a.id)), &pair, b.id, 0),
            Err(RoomError::NotHost)
        );
        assert_eq!(
            plan_start(&room(Some(a.id)), &alone, a.id, 0),
            Err(RoomError::NotEnoughPlayers {
                required: 2,
                present: 1
            })
        );

        let mut open = room(Some(a.id));
        open.only_host_starts = false;
        assert!(plan_start(&open, &pair, b.id, 0).is_ok());
    }

    #[test]
    fn test_restart_from_reveal() {
        let a = player(1);
        let b = player(2);
        let roster = Roster::new(vec![a.clone(), b.clone()]);
        let mut finished = room(Some(a.id));
        finished.status = RoomStatus::Reveal;
        finished.current_turn = TOTAL_TURNS - 1;

        let plan = plan_start(&finished, &roster, a.id, 5).unwrap();
        let mut next = finished.clone();
        plan.patch.apply_to(&mut next);
        assert_eq!(next.status, RoomStatus::Playing);
        assert_eq!(next.current_turn, 0);
    }

    #[test]
    fn test_advance_plan() {
        let mut playing = room(None);
        playing.status = RoomStatus::Playing;
        playing.current_turn = 2;
        let seating = Seating::new(vec![Uuid::new_v4(), Uuid::new_v4()]);

        let plan = plan_for_outcome(
            BarrierOutcome::Advance { next_turn: 3 },
            &playing,
            &seating,
            TOTAL_TURNS,
            7,
        )
        .unwrap();

        assert_eq!(plan.kind, TransitionKind::Advance { from: 2, to: 3 });
        assert_eq!(plan.clears, vec![ClearScope::TurnStatusThrough(2)]);
        assert_eq!(plan.patch.current_turn, Some(3));
        assert_eq!(plan.patch.status, None);
        assert!(plan.assignments.is_empty());
    }

    #[test]
    fn test_finalize_plan_is_reproducible() {
        let a = player(1);
        let b = player(2);
        let c = player(3);
        let roster = Roster::new(vec![a.clone(), b.clone(), c.clone()]);
        let mut playing = room(None);
        playing.status = RoomStatus::Playing;
        playing.current_turn = TOTAL_TURNS - 1;
        let seating = Seating::resolve(&playing, &roster, SeatingPolicy::Pinned);

        let first =
            plan_for_outcome(BarrierOutcome::Finalize, &playing, &seating, TOTAL_TURNS, 50)
                .unwrap();
        let second =
            plan_for_outcome(BarrierOutcome::Finalize, &playing, &seating, TOTAL_TURNS, 50)
                .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.target_status(), RoomStatus::Reveal);
        assert_eq!(first.patch.current_turn, Some(TOTAL_TURNS - 1));
        assert_eq!(first.patch.finished_at, Some(50));
        let sheets: Vec<(PlayerId, u32)> = first
            .assignments
            .iter()
            .map(|(id, a)| (*id, a.sheet_index))
            .collect();
        assert_eq!(sheets, vec![(a.id, 1), (b.id, 2), (c.id, 0)]);
    }

    #[test]
    fn test_waiting_produces_no_plan() {
        let seating = Seating::new(Vec::new());
        assert!(
            plan_for_outcome(
                BarrierOutcome::Waiting {
                    completed: 1,
                    expected: 2
                },
                &room(None),
                &seating,
                TOTAL_TURNS,
                0
            )
            .is_none()
        );
        assert!(plan_for_outcome(BarrierOutcome::Idle, &room(None), &seating, 8, 0).is_none());
    }
}
