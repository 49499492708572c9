use room_types::{PlayerId, Room, RoomPatch};

use crate::Roster;

/// Outcome of checking a room's designated host against the live roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostDecision {
    /// The designated host is still present.
    Keep(PlayerId),
    /// The designated host is gone or was never set; this player should be written instead.
    Elect(PlayerId),
    /// Nobody is left to host.
    Vacant,
}

impl HostDecision {
    pub fn host(&self) -> Option<PlayerId> {
        match self {
            HostDecision::Keep(id) | HostDecision::Elect(id) => Some(*id),
            HostDecision::Vacant => None,
        }
    }

    /// The write this decision calls for, if any. Every peer evaluating the same roster
    /// produces the same patch, so concurrent writers converge.
    pub fn patch(&self) -> Option<RoomPatch> {
        match self {
            HostDecision::Elect(id) => Some(RoomPatch::host(*id)),
            HostDecision::Keep(_) | HostDecision::Vacant => None,
        }
    }
}

/// Keep the current host while they are in the roster, otherwise pick the earliest joiner.
pub fn elect_host(current: Option<PlayerId>, roster: &Roster) -> HostDecision {
    match current {
        Some(host_id) if roster.contains(host_id) => HostDecision::Keep(host_id),
        _ => match roster.first() {
            Some(first) => HostDecision::Elect(first.id),
            None => HostDecision::Vacant,
        },
    }
}

/// Local belief only; it can be stale until the replica converges.
pub fn is_host(room: &Room, player_id: PlayerId) -> bool {
    room.host_id == Some(player_id)
}

/// A player joining a room without a host claims it straight away.
pub fn claim_on_join(room: &Room, player_id: PlayerId) -> Option<RoomPatch> {
    match room.host_id {
        None => Some(RoomPatch::host(player_id)),
        Some(_) => None,
    }
}
