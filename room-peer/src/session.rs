use futures_util::StreamExt;
use room_core::{RoomEvent, RoomEventBus, SeatingPolicy, now_millis, sanitize_name};
use room_persistence::IdentityRepository;
use room_replica::{ReplicaStore, RoomReplica};
use room_types::{
    LocalIdentity, PeerCommand, PeerNotice, PlayerId, RoomError, RoomSettings, RoomView,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coordinator::{RoomCoordinator, RoomHandle};
use crate::directory::RoomDirectory;
use crate::events::{EventForwarder, EventLog};
use crate::route::Route;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub seating: SeatingPolicy,
    /// Base URL share links are built on.
    pub link_base: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seating: SeatingPolicy::default(),
            link_base: "http://localhost:5173/".to_string(),
        }
    }
}

/// One local identity's view of the game: handles its commands, keeps at most one room
/// open and publishes everything it learns as [`PeerNotice`]s.
pub struct PeerSession<S: ReplicaStore> {
    identity: LocalIdentity,
    replica: RoomReplica<S>,
    directory: RoomDirectory<S>,
    options: SessionOptions,
    notices: mpsc::UnboundedSender<PeerNotice>,
    open: Option<RoomHandle>,
    identity_store: Option<(Arc<IdentityRepository>, String)>,
    event_sink: Option<mpsc::UnboundedSender<RoomEvent>>,
    directory_task: Option<JoinHandle<()>>,
}

impl<S: ReplicaStore> PeerSession<S> {
    pub fn new(
        store: Arc<S>,
        identity: LocalIdentity,
        options: SessionOptions,
    ) -> (Self, mpsc::UnboundedReceiver<PeerNotice>) {
        let (notices, receiver) = mpsc::unbounded_channel();
        let replica = RoomReplica::new(store);
        let session = Self {
            identity,
            directory: RoomDirectory::new(replica.clone()),
            replica,
            options,
            notices,
            open: None,
            identity_store: None,
            event_sink: None,
            directory_task: None,
        };
        (session, receiver)
    }

    /// Remember the display name under `profile` whenever this session joins a room.
    pub fn with_identity_store(
        mut self,
        repository: Arc<IdentityRepository>,
        profile: impl Into<String>,
    ) -> Self {
        self.identity_store = Some((repository, profile.into()));
        self
    }

    /// Receive the events this session's coordinators drive.
    pub fn with_event_sink(mut self, sink: mpsc::UnboundedSender<RoomEvent>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn player_id(&self) -> PlayerId {
        self.identity.player_id
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    pub fn open_room(&self) -> Option<&RoomHandle> {
        self.open.as_ref()
    }

    /// Handle one command. Failures are also published as [`PeerNotice::Error`].
    pub async fn handle_command(&mut self, command: PeerCommand) -> Result<(), RoomError> {
        let result = match command {
            PeerCommand::CreateRoom { settings } => self.handle_create_room(settings).await,
            PeerCommand::OpenRoom { slug } => self.handle_open_room(slug).await,
            PeerCommand::JoinRoom { name } => self.handle_join_room(name).await,
            PeerCommand::LeaveRoom => self.handle_leave_room().await,
            PeerCommand::StartGame => self.handle_start_game().await,
            PeerCommand::SubmitAnswer { text } => self.handle_submit_answer(text).await,
        };

        if let Err(error) = &result {
            warn!("Command from {} failed: {}", self.identity.player_id, error);
            self.send_notice(PeerNotice::Error {
                error: error.clone(),
            });
        }
        result
    }

    /// Open whatever the deep link points at. Discovery just starts the room listing.
    pub async fn follow(&mut self, route: Route) -> Result<(), RoomError> {
        match route {
            Route::Discovery => {
                self.watch_rooms();
                Ok(())
            }
            Route::Room(room_id) => {
                self.handle_command(PeerCommand::OpenRoom {
                    slug: room_id.to_string(),
                })
                .await
            }
        }
    }

    /// Publish [`PeerNotice::RoomsChanged`] on every directory change until shutdown.
    pub fn watch_rooms(&mut self) {
        if self.directory_task.is_some() {
            return;
        }
        let mut rooms = Box::pin(self.directory.watch());
        let notices = self.notices.clone();
        self.directory_task = Some(tokio::spawn(async move {
            while let Some(rooms) = rooms.next().await {
                if notices.send(PeerNotice::RoomsChanged { rooms }).is_err() {
                    break;
                }
            }
        }));
    }

    pub async fn current_view(&self) -> Option<RoomView> {
        match &self.open {
            Some(room) => room.view().await,
            None => None,
        }
    }

    fn send_notice(&self, notice: PeerNotice) {
        if self.notices.send(notice).is_err() {
            debug!("Notice for {} dropped, receiver gone", self.identity.player_id);
        }
    }

    fn event_bus(&self) -> RoomEventBus {
        let mut events = RoomEventBus::new();
        events.add_handler(Box::new(EventLog));
        if let Some(sink) = &self.event_sink {
            events.add_handler(Box::new(EventForwarder::new(sink.clone())));
        }
        events
    }

    fn room(&self) -> Result<&RoomHandle, RoomError> {
        self.open.as_ref().ok_or(RoomError::NoOpenRoom)
    }

    async fn handle_create_room(&mut self, settings: RoomSettings) -> Result<(), RoomError> {
        let room_id = self.directory.reserve(&settings, now_millis()).await?;
        let share_link = Route::share_link(&self.options.link_base, &room_id);
        info!("Room '{}' ready, share {}", room_id, share_link);
        self.event_bus().publish(RoomEvent::RoomReserved {
            room_id: room_id.clone(),
        });
        self.send_notice(PeerNotice::RoomCreated {
            room_id,
            share_link,
        });
        Ok(())
    }

    async fn handle_open_room(&mut self, slug: String) -> Result<(), RoomError> {
        let room = self.directory.lookup(&slug).await?;
        self.close_room().await;

        let coordinator = RoomCoordinator::new(
            self.replica.clone(),
            room.id.clone(),
            self.identity.player_id,
            self.options.seating,
            self.notices.clone(),
            self.event_bus(),
        );
        self.open = Some(coordinator.spawn());
        info!("Opened room {}", room.id);
        Ok(())
    }

    async fn handle_join_room(&mut self, name: String) -> Result<(), RoomError> {
        self.room()?.join(name.clone()).await?;

        let name = sanitize_name(&name)?;
        self.identity.display_name = Some(name.clone());
        if let Some((repository, profile)) = &self.identity_store {
            if let Err(err) = repository.remember_name(profile, &name).await {
                warn!("Could not remember display name: {}", err);
            }
        }
        Ok(())
    }

    async fn handle_leave_room(&mut self) -> Result<(), RoomError> {
        let room_id = self.room()?.room_id().clone();
        self.room()?.leave().await?;
        self.close_room().await;
        self.send_notice(PeerNotice::RoomClosed { room_id });
        Ok(())
    }

    async fn handle_start_game(&mut self) -> Result<(), RoomError> {
        self.room()?.start().await
    }

    async fn handle_submit_answer(&mut self, text: String) -> Result<(), RoomError> {
        self.room()?.submit(text).await.map(|_| ())
    }

    async fn close_room(&mut self) {
        if let Some(room) = self.open.take() {
            let room_id = room.room_id().clone();
            room.close().await;
            debug!("Closed room {}", room_id);
        }
    }

    /// Close the open room and stop the room listing.
    pub async fn shutdown(mut self) {
        self.close_room().await;
        if let Some(task) = self.directory_task.take() {
            task.abort();
        }
    }
}
