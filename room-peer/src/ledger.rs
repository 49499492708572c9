use room_replica::{Collection, ReplicaError, ReplicaStore, RoomReplica};
use room_types::{Answer, AnswerKey, RoomId};

/// Answers of one room, one per `(turn, sheet)`.
///
/// Writes are blind and the last one for a key wins. Text is stored as given; word limits
/// are applied where the text is typed, not here.
pub struct AnswerLedger<S> {
    replica: RoomReplica<S>,
    room_id: RoomId,
}

impl<S: ReplicaStore> AnswerLedger<S> {
    pub fn new(replica: RoomReplica<S>, room_id: RoomId) -> Self {
        Self { replica, room_id }
    }

    /// Store `answer` under the key formed by its turn and sheet.
    pub async fn submit(&self, answer: &Answer) -> Result<AnswerKey, ReplicaError> {
        let key = AnswerKey::new(answer.turn, answer.sheet_index);
        self.replica.put_answer(&self.room_id, answer).await?;
        Ok(key)
    }

    pub async fn read(&self, turn: u32, sheet_index: u32) -> Result<Option<Answer>, ReplicaError> {
        self.replica
            .answer(&self.room_id, AnswerKey::new(turn, sheet_index))
            .await
    }

    /// Tombstone every answer currently visible. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize, ReplicaError> {
        self.replica.clear(&self.room_id, Collection::Answers).await
    }
}
