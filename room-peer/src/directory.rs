use futures_util::Stream;
use futures_util::stream;
use room_core::{default_prompts, room_id_for, slugify};
use room_replica::{DirectoryFeed, ReplicaStore, RoomReplica};
use room_types::{
    DirectoryEntry, Entry, MAX_PLAYERS, MIN_PLAYERS, Millis, Room, RoomError, RoomId,
    RoomSettings, RoomStatus,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

const DEFAULT_MAX_WORDS: u32 = 12;

/// Slug reservation and the list of known rooms.
pub struct RoomDirectory<S> {
    replica: RoomReplica<S>,
}

impl<S: ReplicaStore> RoomDirectory<S> {
    pub fn new(replica: RoomReplica<S>) -> Self {
        Self { replica }
    }

    /// Claim the slug derived from the group name and write the room and its index entry.
    ///
    /// The check and the two writes are separate store operations, so two peers reserving
    /// the same slug at the same instant can both succeed; they then write the same room id
    /// and the replica converges on one record.
    pub async fn reserve(&self, settings: &RoomSettings, now: Millis) -> Result<RoomId, RoomError> {
        let room_id = room_id_for(&settings.group_name)?;
        if self
            .replica
            .directory_entry(room_id.as_str())
            .await?
            .is_some()
        {
            return Err(RoomError::AlreadyExists {
                slug: room_id.to_string(),
            });
        }

        let room = Room {
            id: room_id.clone(),
            group_name: settings.group_name.trim().to_string(),
            max_players: match settings.max_players {
                0 => MAX_PLAYERS,
                n => n.clamp(MIN_PLAYERS, MAX_PLAYERS),
            },
            max_words: match settings.max_words {
                0 => DEFAULT_MAX_WORDS,
                n => n,
            },
            status: RoomStatus::Lobby,
            current_turn: 0,
            host_id: None,
            only_host_starts: settings.only_host_starts,
            prompts: default_prompts(),
            seating: Vec::new(),
            created_at: now,
            started_at: None,
            finished_at: None,
        };

        self.replica.put_room(&room).await?;
        self.replica
            .put_directory_entry(&DirectoryEntry::from(&room))
            .await?;

        info!("Reserved room '{}' for {}", room_id, room.group_name);
        Ok(room_id)
    }

    /// Resolve a user-typed name or slug to an existing room.
    pub async fn lookup(&self, name: &str) -> Result<Room, RoomError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(RoomError::InvalidName);
        }
        let not_found = || RoomError::NotFound { slug: slug.clone() };

        let entry = self
            .replica
            .directory_entry(&slug)
            .await?
            .ok_or_else(not_found)?;
        self.replica.room(&entry.id).await?.ok_or_else(not_found)
    }

    /// Room summaries, newest first, re-emitted on every change to the index. The stream
    /// holds a live subscription; drop it to unsubscribe.
    pub fn watch(&self) -> impl Stream<Item = Vec<DirectoryEntry>> + Send + use<S> {
        let feed = self.replica.watch_directory();
        stream::unfold(
            (feed, BTreeMap::new()),
            |(mut feed, mut rooms): (DirectoryFeed, BTreeMap<String, DirectoryEntry>)| async move {
                let (key, entry) = feed.next().await?;
                match entry {
                    Entry::Present(entry) => {
                        rooms.insert(key, entry);
                    }
                    Entry::Removed => {
                        rooms.remove(&key);
                    }
                }
                debug!("Directory now lists {} rooms", rooms.len());
                let listing = newest_first(&rooms);
                Some((listing, (feed, rooms)))
            },
        )
    }
}

fn newest_first(rooms: &BTreeMap<String, DirectoryEntry>) -> Vec<DirectoryEntry> {
    let mut listing: Vec<DirectoryEntry> = rooms.values().cloned().collect();
    listing.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    listing
}
