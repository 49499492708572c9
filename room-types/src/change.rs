use crate::{
    Answer, AnswerKey, Assignment, Entry, Player, PlayerId, Room, TurnStatusEntry, TurnStatusKey,
};

/// One decoded change observed on a room's replicated subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomChange {
    Room(Entry<Room>),
    Player(PlayerId, Entry<Player>),
    Answer(AnswerKey, Entry<Answer>),
    TurnStatus(TurnStatusKey, Entry<TurnStatusEntry>),
    Assignment(PlayerId, Entry<Assignment>),
}
