use room_types::{Answer, AnswerKey, Assignment, Millis, PlayerId};
use std::collections::BTreeMap;

/// Placeholder for a line nobody wrote.
pub const MISSING_LINE: &str = "—";

/// Sheet written by the player in seat `position` during `turn`.
///
/// Authorship rotates one seat per turn in a fixed direction, so within a turn every sheet
/// receives exactly one line and across `players` turns every player visits every sheet.
pub fn sheet_index(position: usize, turn: u32, players: usize) -> u32 {
    if players == 0 {
        return 0;
    }
    let n = players as i64;
    let i = position as i64;
    let t = turn as i64;
    (((i - t) % n + n) % n) as u32
}

/// Sheet read aloud by the player in seat `position` once the game is over.
pub fn final_sheet_index(position: usize, players: usize) -> u32 {
    if players == 0 {
        return 0;
    }
    ((position + 1) % players) as u32
}

/// Reveal assignment for every seat. Depends only on the seat order, so two hosts computing
/// it from the same order write identical sheet indices.
pub fn final_assignments(seats: &[PlayerId], now: Millis) -> Vec<(PlayerId, Assignment)> {
    seats
        .iter()
        .enumerate()
        .map(|(position, player_id)| {
            (
                *player_id,
                Assignment {
                    sheet_index: final_sheet_index(position, seats.len()),
                    assigned_at: now,
                },
            )
        })
        .collect()
}

/// The finished sheet `sheet`, one line per turn.
pub fn reveal_lines(
    answers: &BTreeMap<AnswerKey, Answer>,
    sheet: u32,
    total_turns: u32,
) -> Vec<String> {
    (0..total_turns)
        .map(|turn| {
            answers
                .get(&AnswerKey::new(turn, sheet))
                .map(|answer| answer.text.clone())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| MISSING_LINE.to_string())
        })
        .collect()
}
