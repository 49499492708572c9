use room_types::RoomError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicaError {
    #[error("write to {path} rejected: {reason}")]
    Rejected { path: String, reason: String },
    #[error("malformed payload at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

impl From<ReplicaError> for RoomError {
    fn from(err: ReplicaError) -> Self {
        RoomError::Store {
            message: err.to_string(),
        }
    }
}
