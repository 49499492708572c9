#![allow(dead_code)]

use room_core::{RoomEvent, SeatingPolicy};
use room_peer::{PeerSession, Route, SessionOptions};
use async_trait::async_trait;
use room_replica::{MemoryReplica, Node, NodePath, ReplicaError, ReplicaStore, Subscription};
use room_types::{
    Entry, LocalIdentity, PeerCommand, PeerNotice, PlayerId, RoomError, RoomId, RoomSettings,
    RoomView,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const WAIT: Duration = Duration::from_secs(5);

/// A session plus the channels a front end would read
pub struct TestPeer {
    pub session: PeerSession<MemoryReplica>,
    pub notices: UnboundedReceiver<PeerNotice>,
    pub events: UnboundedReceiver<RoomEvent>,
}

impl TestPeer {
    pub fn id(&self) -> PlayerId {
        self.session.player_id()
    }

    pub async fn command(&mut self, command: PeerCommand) -> Result<(), RoomError> {
        self.session.handle_command(command).await
    }

    pub async fn open(&mut self, room_id: &RoomId) {
        self.session
            .follow(Route::Room(room_id.clone()))
            .await
            .unwrap();
    }

    pub async fn join(&mut self, name: &str) {
        self.command(PeerCommand::JoinRoom {
            name: name.to_string(),
        })
        .await
        .unwrap();
    }

    pub async fn submit(&mut self, text: &str) -> Result<(), RoomError> {
        self.command(PeerCommand::SubmitAnswer {
            text: text.to_string(),
        })
        .await
    }

    /// Wait until this peer's view satisfies `check`
    pub async fn wait_for(&mut self, check: impl Fn(&RoomView) -> bool) -> RoomView {
        if let Some(view) = self.session.current_view().await {
            if check(&view) {
                return view;
            }
        }
        let found = tokio::time::timeout(WAIT, async {
            while let Some(notice) = self.notices.recv().await {
                if let PeerNotice::RoomUpdate { view } = notice {
                    if check(&view) {
                        return Some(view);
                    }
                }
            }
            None
        })
        .await;
        match found {
            Ok(Some(view)) => view,
            _ => panic!("view never reached the expected state"),
        }
    }

    /// Drain notices and return the last error published, if any
    pub fn last_error(&mut self) -> Option<RoomError> {
        let mut last = None;
        while let Ok(notice) = self.notices.try_recv() {
            if let PeerNotice::Error { error } = notice {
                last = Some(error);
            }
        }
        last
    }

    pub fn drained_events(&mut self) -> Vec<RoomEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn create_test_store() -> Arc<MemoryReplica> {
    Arc::new(MemoryReplica::new())
}

pub fn create_test_peer(store: &Arc<MemoryReplica>, seating: SeatingPolicy) -> TestPeer {
    let options = SessionOptions {
        seating,
        ..SessionOptions::default()
    };
    let (session, notices) = PeerSession::new(store.clone(), LocalIdentity::generate(), options);
    let (sink, events) = tokio::sync::mpsc::unbounded_channel();
    TestPeer {
        session: session.with_event_sink(sink),
        notices,
        events,
    }
}

pub fn room_settings(name: &str, max_players: u8) -> RoomSettings {
    RoomSettings {
        group_name: name.to_string(),
        max_players,
        ..RoomSettings::default()
    }
}

/// Creates a room through `creator` and returns its id
pub async fn create_room(creator: &mut TestPeer, name: &str, max_players: u8) -> RoomId {
    creator
        .command(PeerCommand::CreateRoom {
            settings: room_settings(name, max_players),
        })
        .await
        .unwrap();
    loop {
        match creator.notices.recv().await {
            Some(PeerNotice::RoomCreated { room_id, .. }) => return room_id,
            Some(_) => continue,
            None => panic!("notice channel closed"),
        }
    }
}

/// Creates `count` peers that open and join one room, in order
pub async fn seat_table(
    store: &Arc<MemoryReplica>,
    name: &str,
    count: usize,
    seating: SeatingPolicy,
) -> (RoomId, Vec<TestPeer>) {
    let mut peers: Vec<TestPeer> = (0..count).map(|_| create_test_peer(store, seating)).collect();
    let room_id = create_room(&mut peers[0], name, 8).await;
    for (index, peer) in peers.iter_mut().enumerate() {
        peer.open(&room_id).await;
        peer.join(&format!("Player {}", index + 1)).await;
    }
    for peer in peers.iter_mut() {
        peer.wait_for(|view| view.players.len() == count && view.room.host_id.is_some())
            .await;
    }
    (room_id, peers)
}

/// Roster order as every peer derives it
pub fn seat_order(view: &RoomView) -> Vec<PlayerId> {
    view.players.iter().map(|player| player.id).collect()
}

pub fn position_of(order: &[PlayerId], player_id: PlayerId) -> usize {
    order
        .iter()
        .position(|id| *id == player_id)
        .expect("player is seated")
}

/// Store whose point reads yield to the scheduler after reading, so concurrent callers all
/// observe the state from before any of them writes
pub struct SlowReadStore {
    pub inner: MemoryReplica,
}

#[async_trait]
impl ReplicaStore for SlowReadStore {
    async fn once(&self, path: &NodePath) -> Result<Option<Node>, ReplicaError> {
        let node = self.inner.once(path).await;
        tokio::task::yield_now().await;
        node
    }

    async fn children_once(&self, path: &NodePath) -> Result<Vec<(String, Node)>, ReplicaError> {
        self.inner.children_once(path).await
    }

    async fn put(&self, path: &NodePath, fields: Option<Node>) -> Result<(), ReplicaError> {
        self.inner.put(path, fields).await
    }

    fn on(&self, path: &NodePath) -> Subscription<Entry<Node>> {
        self.inner.on(path)
    }

    fn map_on(&self, path: &NodePath) -> Subscription<(String, Entry<Node>)> {
        self.inner.map_on(path)
    }
}
