use room_types::{Player, PlayerId, Room, RoomStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the seat order used for sheet rotation is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatingPolicy {
    /// The roster order is written into the room when a game starts and used until the next
    /// start. Players who join mid-game wait for the next game.
    #[default]
    Pinned,
    /// The order is re-derived from the live roster on every evaluation. A roster change
    /// mid-game shifts positions, so authored sheets can desynchronize.
    Live,
}

impl FromStr for SeatingPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pinned" => Ok(SeatingPolicy::Pinned),
            "live" => Ok(SeatingPolicy::Live),
            other => Err(format!("unknown seating policy '{}'", other)),
        }
    }
}

impl fmt::Display for SeatingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatingPolicy::Pinned => f.write_str("pinned"),
            SeatingPolicy::Live => f.write_str("live"),
        }
    }
}

/// Snapshot of the active players ordered by `joined_at`, ties broken by id so that every
/// peer holding the same set derives the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new(players: impl IntoIterator<Item = Player>) -> Self {
        let mut players: Vec<Player> = players.into_iter().collect();
        players.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn first(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn position(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }
}

/// The ordered seats a game rotates sheets around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seating {
    seats: Vec<PlayerId>,
}

impl Seating {
    pub fn new(seats: Vec<PlayerId>) -> Self {
        Self { seats }
    }

    /// Seats in effect for `room`. A pinned room outside the lobby uses its stored order;
    /// rooms that never pinned one fall back to the live roster.
    pub fn resolve(room: &Room, roster: &Roster, policy: SeatingPolicy) -> Self {
        match policy {
            SeatingPolicy::Pinned if room.status != RoomStatus::Lobby && !room.seating.is_empty() => {
                Self::new(room.seating.clone())
            }
            _ => Self::new(roster.ids()),
        }
    }

    pub fn seats(&self) -> &[PlayerId] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn position(&self, player_id: PlayerId) -> Option<usize> {
        self.seats.iter().position(|id| *id == player_id)
    }

    pub fn is_seated(&self, player_id: PlayerId) -> bool {
        self.seats.contains(&player_id)
    }

    /// Roster members who hold a seat: the players a turn waits for.
    pub fn participants<'a>(&self, roster: &'a Roster) -> Vec<&'a Player> {
        roster
            .players()
            .iter()
            .filter(|p| self.is_seated(p.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use room_types::RoomId;
    use uuid::Uuid;

    fn player(name: &str, joined_at: i64) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: name.to_string(),
            joined_at,
            last_active: joined_at,
        }
    }

    fn room(status: RoomStatus, seating: Vec<PlayerId>) -> Room {
        Room {
            id: RoomId::from_slug("test"),
            group_name: "Test".to_string(),
            max_players: 8,
            max_words: 12,
            status,
            current_turn: 0,
            host_id: None,
            only_host_starts: true,
            prompts: Vec::new(),
            seating,
            created_at: 0,
            started_at: None,
            finished_at: None,
        }
    }

    #[test]
    fn test_roster_orders_by_join_time() {
        let c = player("C", 3);
        let a = player("A", 1);
        let b = player("B", 2);
        let roster = Roster::new(vec![c.clone(), a.clone(), b.clone()]);

        assert_eq!(roster.ids(), vec![a.id, b.id, c.id]);
        assert_eq!(roster.position(c.id), Some(2));
        assert_eq!(roster.first().map(|p| p.id), Some(a.id));
    }

    #[test]
    fn test_roster_ties_break_by_id() {
        let x = player("X", 5);
        let y = player("Y", 5);
        let forward = Roster::new(vec![x.clone(), y.clone()]);
        let backward = Roster::new(vec![y, x]);
        assert_eq!(forward.ids(), backward.ids());
    }

    #[test]
    fn test_pinned_seating_survives_roster_changes() {
        let a = player("A", 1);
        let b = player("B", 2);
        let late = player("Late", 0);
        let pinned = room(RoomStatus::Playing, vec![a.id, b.id]);
        let roster = Roster::new(vec![a.clone(), b.clone(), late.clone()]);

        let seating = Seating::resolve(&pinned, &roster, SeatingPolicy::Pinned);
        assert_eq!(seating.seats(), &[a.id, b.id]);
        assert!(!seating.is_seated(late.id));
        assert_eq!(seating.participants(&roster).len(), 2);

        let live = Seating::resolve(&pinned, &roster, SeatingPolicy::Live);
        assert_eq!(live.seats(), &[late.id, a.id, b.id]);
    }

    #[test]
    fn test_lobby_ignores_stale_seating() {
        let a = player("A", 1);
        let stale = room(RoomStatus::Lobby, vec![Uuid::new_v4()]);
        let roster = Roster::new(vec![a.clone()]);
        let seating = Seating::resolve(&stale, &roster, SeatingPolicy::Pinned);
        assert_eq!(seating.seats(), &[a.id]);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Pinned".parse::<SeatingPolicy>(), Ok(SeatingPolicy::Pinned));
        assert_eq!(" live ".parse::<SeatingPolicy>(), Ok(SeatingPolicy::Live));
        assert!("random".parse::<SeatingPolicy>().is_err());
    }
}
