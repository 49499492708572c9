use room_types::{
    Answer, AnswerKey, Assignment, DirectoryEntry, Entry, Millis, Player, PlayerId, Room,
    RoomChange, RoomId, RoomPatch, RoomStatus, TurnStatusEntry, TurnStatusKey,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{Node, NodePath, ReplicaError, ReplicaStore, Subscription};

const ROOMS_ROOT: &str = "rooms";
const INDEX_ROOT: &str = "rooms_index";

/// Per-room child collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Players,
    Answers,
    TurnStatus,
    Assignments,
}

impl Collection {
    fn key(self) -> &'static str {
        match self {
            Collection::Players => "players",
            Collection::Answers => "answers",
            Collection::TurnStatus => "turnStatus",
            Collection::Assignments => "finalAssignments",
        }
    }
}

fn default_max_players() -> u8 {
    8
}

fn default_max_words() -> u32 {
    12
}

fn default_true() -> bool {
    true
}

/// Room record as stored. The store keeps scalar leaves only, so the prompt list and the
/// pinned seating travel as JSON-encoded strings.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomNode {
    #[serde(default)]
    id: Option<RoomId>,
    #[serde(default)]
    group_name: String,
    #[serde(default = "default_max_players")]
    max_players: u8,
    #[serde(default = "default_max_words")]
    max_words: u32,
    #[serde(default)]
    status: Option<RoomStatus>,
    #[serde(default)]
    current_turn: u32,
    #[serde(default)]
    host_id: Option<PlayerId>,
    #[serde(default = "default_true")]
    only_host_starts: bool,
    #[serde(default)]
    prompts: Option<String>,
    #[serde(default)]
    seating: Option<String>,
    #[serde(default)]
    created_at: Millis,
    #[serde(default)]
    started_at: Option<Millis>,
    #[serde(default)]
    finished_at: Option<Millis>,
}

impl RoomNode {
    fn from_room(room: &Room) -> Self {
        RoomNode {
            id: Some(room.id.clone()),
            group_name: room.group_name.clone(),
            max_players: room.max_players,
            max_words: room.max_words,
            status: Some(room.status),
            current_turn: room.current_turn,
            host_id: room.host_id,
            only_host_starts: room.only_host_starts,
            prompts: Some(encode_list(&room.prompts)),
            seating: Some(encode_list(&room.seating)),
            created_at: room.created_at,
            started_at: room.started_at,
            finished_at: room.finished_at,
        }
    }

    fn into_room(self, room_id: &RoomId, path: &NodePath) -> Room {
        Room {
            id: self.id.unwrap_or_else(|| room_id.clone()),
            group_name: self.group_name,
            max_players: self.max_players,
            max_words: self.max_words,
            status: self.status.unwrap_or(RoomStatus::Lobby),
            current_turn: self.current_turn,
            host_id: self.host_id,
            only_host_starts: self.only_host_starts,
            prompts: decode_list(path, "prompts", self.prompts.as_deref()),
            seating: decode_list(path, "seating", self.seating.as_deref()),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerNode {
    #[serde(default)]
    name: String,
    #[serde(default)]
    joined_at: Millis,
    #[serde(default)]
    last_active: Millis,
}

fn encode_list<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Unreadable lists decode as empty; consumers substitute their defaults.
fn decode_list<T: DeserializeOwned>(path: &NodePath, field: &str, raw: Option<&str>) -> Vec<T> {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(err) => {
            warn!("Malformed {} list at {}, using defaults: {}", field, path, err);
            Vec::new()
        }
    }
}

fn to_node<T: Serialize>(path: &NodePath, value: &T) -> Result<Node, ReplicaError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(node)) => Ok(node),
        Ok(_) => Err(ReplicaError::Malformed {
            path: path.to_string(),
            reason: "expected an object".to_string(),
        }),
        Err(err) => Err(ReplicaError::Malformed {
            path: path.to_string(),
            reason: err.to_string(),
        }),
    }
}

fn from_node<T: DeserializeOwned>(path: &NodePath, node: Node) -> Option<T> {
    match serde_json::from_value(Value::Object(node)) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Ignoring malformed payload at {}: {}", path, err);
            None
        }
    }
}

fn parse_key<K: std::str::FromStr>(path: &NodePath, key: &str) -> Option<K> {
    match key.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring unexpected key '{}' under {}", key, path);
            None
        }
    }
}

/// Decode a child entry. Removals need only the key; present values must also parse.
fn decode_child<K: std::str::FromStr, V: DeserializeOwned>(
    path: &NodePath,
    key: &str,
    entry: Entry<Node>,
) -> Option<(K, Entry<V>)> {
    let parsed = parse_key(path, key)?;
    match entry {
        Entry::Present(node) => Some((parsed, Entry::Present(from_node(&path.child(key), node)?))),
        Entry::Removed => Some((parsed, Entry::Removed)),
    }
}

fn patch_node(patch: &RoomPatch) -> Node {
    let mut node = Node::new();
    if let Some(status) = patch.status {
        node.insert("status".to_string(), Value::from(status.as_str()));
    }
    if let Some(turn) = patch.current_turn {
        node.insert("currentTurn".to_string(), Value::from(turn));
    }
    if let Some(host_id) = patch.host_id {
        node.insert("hostId".to_string(), Value::from(host_id.to_string()));
    }
    if let Some(seating) = &patch.seating {
        node.insert("seating".to_string(), Value::from(encode_list(seating)));
    }
    if let Some(started_at) = patch.started_at {
        node.insert("startedAt".to_string(), Value::from(started_at));
    }
    if let Some(finished_at) = patch.finished_at {
        node.insert("finishedAt".to_string(), Value::from(finished_at));
    }
    node
}

/// Typed façade over a [`ReplicaStore`] for everything a room keeps in the graph.
pub struct RoomReplica<S> {
    store: Arc<S>,
}

impl<S> Clone for RoomReplica<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: ReplicaStore> RoomReplica<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn room_path(room_id: &RoomId) -> NodePath {
        NodePath::root(ROOMS_ROOT).child(room_id)
    }

    fn collection_path(room_id: &RoomId, collection: Collection) -> NodePath {
        Self::room_path(room_id).child(collection.key())
    }

    fn index_path() -> NodePath {
        NodePath::root(INDEX_ROOT)
    }

    pub async fn directory_entry(&self, slug: &str) -> Result<Option<DirectoryEntry>, ReplicaError> {
        let path = Self::index_path().child(slug);
        Ok(self
            .store
            .once(&path)
            .await?
            .and_then(|node| from_node(&path, node)))
    }

    pub async fn put_directory_entry(&self, entry: &DirectoryEntry) -> Result<(), ReplicaError> {
        let path = Self::index_path().child(&entry.id);
        self.store.put(&path, Some(to_node(&path, entry)?)).await
    }

    pub fn watch_directory(&self) -> DirectoryFeed {
        let path = Self::index_path();
        DirectoryFeed {
            entries: self.store.map_on(&path),
            path,
        }
    }

    pub async fn room(&self, room_id: &RoomId) -> Result<Option<Room>, ReplicaError> {
        let path = Self::room_path(room_id);
        Ok(self
            .store
            .once(&path)
            .await?
            .and_then(|node| from_node::<RoomNode>(&path, node))
            .map(|node| node.into_room(room_id, &path)))
    }

    pub async fn put_room(&self, room: &Room) -> Result<(), ReplicaError> {
        let path = Self::room_path(&room.id);
        let node = to_node(&path, &RoomNode::from_room(room))?;
        self.store.put(&path, Some(node)).await
    }

    /// Blind overwrite of the patched fields.
    pub async fn patch_room(&self, room_id: &RoomId, patch: &RoomPatch) -> Result<(), ReplicaError> {
        if patch.is_empty() {
            return Ok(());
        }
        let path = Self::room_path(room_id);
        debug!("Patching {}: {:?}", path, patch);
        self.store.put(&path, Some(patch_node(patch))).await
    }

    pub async fn put_player(&self, room_id: &RoomId, player: &Player) -> Result<(), ReplicaError> {
        let path = Self::collection_path(room_id, Collection::Players).child(player.id);
        let node = PlayerNode {
            name: player.name.clone(),
            joined_at: player.joined_at,
            last_active: player.last_active,
        };
        self.store.put(&path, Some(to_node(&path, &node)?)).await
    }

    pub async fn remove_player(&self, room_id: &RoomId, player_id: PlayerId) -> Result<(), ReplicaError> {
        let path = Self::collection_path(room_id, Collection::Players).child(player_id);
        self.store.put(&path, None).await
    }

    pub async fn players(&self, room_id: &RoomId) -> Result<Vec<Player>, ReplicaError> {
        let path = Self::collection_path(room_id, Collection::Players);
        let children = self.store.children_once(&path).await?;
        Ok(children
            .into_iter()
            .filter_map(|(key, node)| decode_player(&path, &key, Entry::Present(node)))
            .filter_map(|(_, entry)| entry.present())
            .collect())
    }

    pub async fn put_answer(&self, room_id: &RoomId, answer: &Answer) -> Result<(), ReplicaError> {
        let key = AnswerKey::new(answer.turn, answer.sheet_index);
        let path = Self::collection_path(room_id, Collection::Answers).child(key);
        self.store.put(&path, Some(to_node(&path, answer)?)).await
    }

    pub async fn answer(&self, room_id: &RoomId, key: AnswerKey) -> Result<Option<Answer>, ReplicaError> {
        let path = Self::collection_path(room_id, Collection::Answers).child(key);
        Ok(self
            .store
            .once(&path)
            .await?
            .and_then(|node| from_node(&path, node)))
    }

    pub async fn put_turn_status(
        &self,
        room_id: &RoomId,
        key: TurnStatusKey,
        entry: &TurnStatusEntry,
    ) -> Result<(), ReplicaError> {
        let path = Self::collection_path(room_id, Collection::TurnStatus).child(key);
        self.store.put(&path, Some(to_node(&path, entry)?)).await
    }

    pub async fn put_assignment(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        assignment: &Assignment,
    ) -> Result<(), ReplicaError> {
        let path = Self::collection_path(room_id, Collection::Assignments).child(player_id);
        self.store.put(&path, Some(to_node(&path, assignment)?)).await
    }

    /// Tombstone every current child of `collection` whose key satisfies `predicate`.
    /// Returns how many were removed.
    pub async fn clear_where(
        &self,
        room_id: &RoomId,
        collection: Collection,
        predicate: impl Fn(&str) -> bool + Send,
    ) -> Result<usize, ReplicaError> {
        let path = Self::collection_path(room_id, collection);
        let keys: Vec<String> = self
            .store
            .children_once(&path)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| predicate(key))
            .collect();

        for key in &keys {
            self.store.put(&path.child(key), None).await?;
        }
        debug!("Cleared {} entries under {}", keys.len(), path);
        Ok(keys.len())
    }

    pub async fn clear(&self, room_id: &RoomId, collection: Collection) -> Result<usize, ReplicaError> {
        self.clear_where(room_id, collection, |_| true).await
    }

    /// Subscribe to the room record and all of its collections.
    pub fn feed(&self, room_id: &RoomId) -> RoomFeed {
        let path = Self::room_path(room_id);
        RoomFeed {
            room_id: room_id.clone(),
            room: self.store.on(&path),
            players: self.store.map_on(&Self::collection_path(room_id, Collection::Players)),
            answers: self.store.map_on(&Self::collection_path(room_id, Collection::Answers)),
            turn_status: self
                .store
                .map_on(&Self::collection_path(room_id, Collection::TurnStatus)),
            assignments: self
                .store
                .map_on(&Self::collection_path(room_id, Collection::Assignments)),
            path,
        }
    }
}

fn decode_player(path: &NodePath, key: &str, entry: Entry<Node>) -> Option<(PlayerId, Entry<Player>)> {
    let (player_id, entry) = decode_child::<PlayerId, PlayerNode>(path, key, entry)?;
    Some((
        player_id,
        entry.map(|node| Player {
            id: player_id,
            name: node.name,
            joined_at: node.joined_at,
            last_active: node.last_active,
        }),
    ))
}

/// Decoded subscription over the room index.
pub struct DirectoryFeed {
    path: NodePath,
    entries: Subscription<(String, Entry<Node>)>,
}

impl DirectoryFeed {
    pub async fn next(&mut self) -> Option<(String, Entry<DirectoryEntry>)> {
        loop {
            let (key, entry) = self.entries.next().await?;
            match entry {
                Entry::Removed => return Some((key, Entry::Removed)),
                Entry::Present(node) => {
                    if let Some(entry) = from_node(&self.path.child(&key), node) {
                        return Some((key, Entry::Present(entry)));
                    }
                }
            }
        }
    }

    pub fn off(self) {
        self.entries.off();
    }
}

/// All live subscriptions for one room, decoded into [`RoomChange`]s.
///
/// Malformed values are logged and skipped; the feed keeps running. Dropping the feed or
/// calling [`RoomFeed::off`] releases every underlying subscription.
pub struct RoomFeed {
    room_id: RoomId,
    path: NodePath,
    room: Subscription<Entry<Node>>,
    players: Subscription<(String, Entry<Node>)>,
    answers: Subscription<(String, Entry<Node>)>,
    turn_status: Subscription<(String, Entry<Node>)>,
    assignments: Subscription<(String, Entry<Node>)>,
}

impl RoomFeed {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    fn decode_room(&self, entry: Entry<Node>) -> Option<RoomChange> {
        match entry {
            Entry::Removed => Some(RoomChange::Room(Entry::Removed)),
            Entry::Present(node) => {
                let node: RoomNode = from_node(&self.path, node)?;
                Some(RoomChange::Room(Entry::Present(
                    node.into_room(&self.room_id, &self.path),
                )))
            }
        }
    }

    fn decode(&self, collection: Collection, key: &str, entry: Entry<Node>) -> Option<RoomChange> {
        let path = self.path.child(collection.key());
        match collection {
            Collection::Players => {
                decode_player(&path, key, entry).map(|(id, entry)| RoomChange::Player(id, entry))
            }
            Collection::Answers => decode_child::<AnswerKey, Answer>(&path, key, entry)
                .map(|(key, entry)| RoomChange::Answer(key, entry)),
            Collection::TurnStatus => decode_child::<TurnStatusKey, TurnStatusEntry>(&path, key, entry)
                .map(|(key, entry)| RoomChange::TurnStatus(key, entry)),
            Collection::Assignments => decode_child::<PlayerId, Assignment>(&path, key, entry)
                .map(|(id, entry)| RoomChange::Assignment(id, entry)),
        }
    }

    /// Wait for the next decodable change. `None` once every subscription has closed.
    pub async fn next(&mut self) -> Option<RoomChange> {
        loop {
            let raw = tokio::select! {
                Some(entry) = self.room.next() => Raw::Room(entry),
                Some((key, entry)) = self.players.next() => Raw::Child(Collection::Players, key, entry),
                Some((key, entry)) = self.answers.next() => Raw::Child(Collection::Answers, key, entry),
                Some((key, entry)) = self.turn_status.next() => Raw::Child(Collection::TurnStatus, key, entry),
                Some((key, entry)) = self.assignments.next() => Raw::Child(Collection::Assignments, key, entry),
                else => return None,
            };
            if let Some(change) = self.decode_raw(raw) {
                return Some(change);
            }
        }
    }

    /// Next change that has already been delivered, without waiting.
    pub fn try_next(&mut self) -> Option<RoomChange> {
        loop {
            let raw = if let Some(entry) = self.room.try_next() {
                Raw::Room(entry)
            } else if let Some((key, entry)) = self.players.try_next() {
                Raw::Child(Collection::Players, key, entry)
            } else if let Some((key, entry)) = self.answers.try_next() {
                Raw::Child(Collection::Answers, key, entry)
            } else if let Some((key, entry)) = self.turn_status.try_next() {
                Raw::Child(Collection::TurnStatus, key, entry)
            } else if let Some((key, entry)) = self.assignments.try_next() {
                Raw::Child(Collection::Assignments, key, entry)
            } else {
                return None;
            };
            if let Some(change) = self.decode_raw(raw) {
                return Some(change);
            }
        }
    }

    fn decode_raw(&self, raw: Raw) -> Option<RoomChange> {
        match raw {
            Raw::Room(entry) => self.decode_room(entry),
            Raw::Child(collection, key, entry) => self.decode(collection, &key, entry),
        }
    }

    pub fn off(self) {
        debug!("Unsubscribing from {}", self.path);
        self.room.off();
        self.players.off();
        self.answers.off();
        self.turn_status.off();
        self.assignments.off();
    }
}

enum Raw {
    Room(Entry<Node>),
    Child(Collection, String, Entry<Node>),
}
