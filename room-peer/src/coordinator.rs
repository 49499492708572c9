use room_core::{
    BarrierOutcome, ClearScope, HostDecision, RoomEvent, RoomEventBus, RoomState, Roster, Seating,
    SeatingPolicy, TransitionKind, TransitionPlan, TurnBarrier, claim_on_join, clamp_words,
    elect_host, is_host, now_millis, plan_for_outcome, plan_start, sanitize_name, sheet_index,
};
use room_replica::{Collection, ReplicaStore, RoomFeed, RoomReplica};
use room_types::{
    Answer, AnswerKey, Millis, PeerNotice, Player, PlayerId, Room, RoomError, RoomId, RoomStatus,
    RoomView, TurnStatusEntry, TurnStatusKey,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ledger::AnswerLedger;

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Requests a session sends to the coordinator of its open room.
#[derive(Debug)]
pub enum RoomCommand {
    Join { name: String, reply: Reply<()> },
    Leave { reply: Reply<()> },
    Start { reply: Reply<()> },
    Submit { text: String, reply: Reply<AnswerKey> },
    View { reply: oneshot::Sender<Option<RoomView>> },
}

/// One transition of one game, remembered so the same step is not rewritten on every
/// change event while the replica converges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Driven {
    started_at: Option<Millis>,
    kind: TransitionKind,
}

/// Per-room actor. It folds the room's change feed into local state, answers commands,
/// and reconciles: every peer repairs a missing host, and a peer that believes itself host
/// drives the turn barrier. All writes are desired-state patches, so two peers driving the
/// same step write the same values.
pub struct RoomCoordinator<S> {
    room_id: RoomId,
    me: PlayerId,
    policy: SeatingPolicy,
    barrier: TurnBarrier,
    replica: RoomReplica<S>,
    ledger: AnswerLedger<S>,
    state: RoomState,
    notices: mpsc::UnboundedSender<PeerNotice>,
    events: RoomEventBus,
    last_driven: Option<Driven>,
    last_election: Option<PlayerId>,
    last_view: Option<RoomView>,
}

impl<S: ReplicaStore> RoomCoordinator<S> {
    pub fn new(
        replica: RoomReplica<S>,
        room_id: RoomId,
        me: PlayerId,
        policy: SeatingPolicy,
        notices: mpsc::UnboundedSender<PeerNotice>,
        events: RoomEventBus,
    ) -> Self {
        Self {
            ledger: AnswerLedger::new(replica.clone(), room_id.clone()),
            room_id,
            me,
            policy,
            barrier: TurnBarrier::default(),
            replica,
            state: RoomState::new(),
            notices,
            events,
            last_driven: None,
            last_election: None,
            last_view: None,
        }
    }

    /// Subscribe to the room and run the coordinator on its own task.
    pub fn spawn(self) -> RoomHandle {
        let feed = self.replica.feed(&self.room_id);
        let (commands, receiver) = mpsc::unbounded_channel();
        let room_id = self.room_id.clone();
        let task = tokio::spawn(self.run(feed, receiver));
        RoomHandle {
            room_id,
            commands,
            task,
        }
    }

    async fn run(mut self, mut feed: RoomFeed, mut commands: mpsc::UnboundedReceiver<RoomCommand>) {
        info!("Watching room {} as {}", self.room_id, self.me);

        loop {
            // Changes already delivered are folded in before the next command is served.
            tokio::select! {
                biased;
                change = feed.next() => {
                    let Some(change) = change else {
                        warn!("Change feed for {} closed", self.room_id);
                        break;
                    };
                    let mut changed = self.state.apply(change);
                    while let Some(change) = feed.try_next() {
                        changed |= self.state.apply(change);
                    }
                    if changed {
                        self.reconcile().await;
                        self.publish_view();
                    }
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    self.handle_command(command).await;
                }
            }
        }

        feed.off();
        info!("Stopped watching room {}", self.room_id);
    }

    async fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join { name, reply } => {
                let _ = reply.send(self.join(name).await);
            }
            RoomCommand::Leave { reply } => {
                let _ = reply.send(self.leave().await);
            }
            RoomCommand::Start { reply } => {
                let _ = reply.send(self.start().await);
            }
            RoomCommand::Submit { text, reply } => {
                let _ = reply.send(self.submit(text).await);
            }
            RoomCommand::View { reply } => {
                let _ = reply.send(self.view());
            }
        }
    }

    /// The room as last observed, or a point read if the feed has not delivered it yet.
    async fn known_room(&mut self) -> Result<Room, RoomError> {
        if let Some(room) = self.state.room() {
            return Ok(room.clone());
        }
        self.replica
            .room(&self.room_id)
            .await?
            .ok_or_else(|| RoomError::NotFound {
                slug: self.room_id.to_string(),
            })
    }

    async fn join(&mut self, name: String) -> Result<(), RoomError> {
        let name = sanitize_name(&name)?;
        let room = self.known_room().await?;
        let roster = self.state.roster();
        if roster.contains(self.me) {
            return Ok(());
        }
        if roster.len() >= room.max_players as usize {
            return Err(RoomError::RoomFull {
                max_players: room.max_players,
            });
        }

        let now = now_millis();
        let player = Player {
            id: self.me,
            name,
            joined_at: now,
            last_active: now,
        };
        self.replica.put_player(&self.room_id, &player).await?;
        if let Some(patch) = claim_on_join(&room, self.me) {
            self.replica.patch_room(&self.room_id, &patch).await?;
        }

        info!("{} joined room {} as '{}'", self.me, self.room_id, player.name);
        self.events.publish(RoomEvent::PlayerJoined {
            room_id: self.room_id.clone(),
            player_id: self.me,
        });
        Ok(())
    }

    async fn leave(&mut self) -> Result<(), RoomError> {
        self.replica.remove_player(&self.room_id, self.me).await?;
        info!("{} left room {}", self.me, self.room_id);
        self.events.publish(RoomEvent::PlayerLeft {
            room_id: self.room_id.clone(),
            player_id: self.me,
        });
        Ok(())
    }

    async fn start(&mut self) -> Result<(), RoomError> {
        let room = self.known_room().await?;
        let roster = self.state.roster();
        let plan = plan_start(&room, &roster, self.me, now_millis())?;
        self.apply_plan(&room, &plan).await?;

        info!("Started a game in {} with {} players", self.room_id, roster.len());
        self.events.publish(RoomEvent::GameStarted {
            room_id: self.room_id.clone(),
            players: roster.len(),
        });
        Ok(())
    }

    async fn submit(&mut self, text: String) -> Result<AnswerKey, RoomError> {
        let room = self.known_room().await?;
        let roster = self.state.roster();
        if !roster.contains(self.me) {
            return Err(RoomError::NotJoined);
        }
        if room.status != RoomStatus::Playing {
            return Err(RoomError::InvalidPhase {
                current: room.status,
            });
        }
        let seating = Seating::resolve(&room, &roster, self.policy);
        let position = seating.position(self.me).ok_or(RoomError::NotSeated)?;

        let text = clamp_words(&text, room.max_words);
        if text.is_empty() {
            return Err(RoomError::EmptyAnswer);
        }

        let turn = room.current_turn;
        let sheet = sheet_index(position, turn, seating.len());
        let now = now_millis();
        let key = self
            .ledger
            .submit(&Answer {
                text,
                player_id: self.me,
                turn,
                sheet_index: sheet,
                timestamp: now,
            })
            .await?;
        self.replica
            .put_turn_status(
                &self.room_id,
                TurnStatusKey::new(turn, self.me),
                &TurnStatusEntry::done(now),
            )
            .await?;

        debug!("{} wrote sheet {} for turn {}", self.me, sheet, turn);
        self.events.publish(RoomEvent::AnswerSubmitted {
            room_id: self.room_id.clone(),
            player_id: self.me,
            turn,
            sheet_index: sheet,
        });
        Ok(key)
    }

    async fn reconcile(&mut self) {
        let Some(room) = self.state.room().cloned() else {
            return;
        };
        let roster = self.state.roster();

        self.repair_host(&room, &roster).await;
        if is_host(&room, self.me) {
            self.drive_barrier(&room, &roster).await;
        }
    }

    /// Any peer may write the election; every peer holding the same roster picks the same id.
    async fn repair_host(&mut self, room: &Room, roster: &Roster) {
        let decision = elect_host(room.host_id, roster);
        let HostDecision::Elect(host_id) = decision else {
            self.last_election = None;
            return;
        };
        if self.last_election == Some(host_id) {
            return;
        }
        let Some(patch) = decision.patch() else {
            return;
        };

        match self.replica.patch_room(&self.room_id, &patch).await {
            Ok(()) => {
                info!("Elected {} as host of {}", host_id, self.room_id);
                self.last_election = Some(host_id);
                self.events.publish(RoomEvent::HostElected {
                    room_id: self.room_id.clone(),
                    host_id,
                });
            }
            Err(err) => warn!("Host election in {} not written: {}", self.room_id, err),
        }
    }

    async fn drive_barrier(&mut self, room: &Room, roster: &Roster) {
        let seating = Seating::resolve(room, roster, self.policy);
        let participants = seating.participants(roster);
        let outcome = self
            .barrier
            .evaluate(room, &participants, self.state.turn_status());
        if let BarrierOutcome::Waiting {
            completed,
            expected,
        } = outcome
        {
            debug!(
                "Turn {} in {}: {}/{} done",
                room.current_turn, self.room_id, completed, expected
            );
        }

        let Some(plan) = plan_for_outcome(
            outcome,
            room,
            &seating,
            self.barrier.total_turns(),
            now_millis(),
        ) else {
            return;
        };

        let driven = Driven {
            started_at: room.started_at,
            kind: plan.kind,
        };
        if self.last_driven == Some(driven) {
            debug!("{:?} in {} already written", plan.kind, self.room_id);
            return;
        }
        if let Err(err) = self.apply_plan(room, &plan).await {
            warn!("{:?} in {} not written: {}", plan.kind, self.room_id, err);
            return;
        }
        self.last_driven = Some(driven);

        match plan.kind {
            TransitionKind::Advance { to, .. } => {
                self.events.publish(RoomEvent::TurnAdvanced {
                    room_id: self.room_id.clone(),
                    turn: to,
                });
            }
            TransitionKind::Finalize => {
                self.events.publish(RoomEvent::GameFinalized {
                    room_id: self.room_id.clone(),
                    assignments: plan.assignments.len(),
                });
            }
            TransitionKind::Start => {}
        }
    }

    /// Clears first, then assignments, then the room patch. Peers only act on the patch, so
    /// by the time they see the new turn or status the old markers are already gone.
    async fn apply_plan(&mut self, room: &Room, plan: &TransitionPlan) -> Result<(), RoomError> {
        plan.check_from(room.status)?;
        for scope in &plan.clears {
            let removed = match *scope {
                ClearScope::Answers => self.ledger.clear().await?,
                ClearScope::Assignments => {
                    self.replica
                        .clear(&self.room_id, Collection::Assignments)
                        .await?
                }
                ClearScope::TurnStatus => {
                    self.replica
                        .clear(&self.room_id, Collection::TurnStatus)
                        .await?
                }
                ClearScope::TurnStatusThrough(turn) => {
                    self.replica
                        .clear_where(&self.room_id, Collection::TurnStatus, move |key| {
                            !matches!(key.parse::<TurnStatusKey>(), Ok(key) if key.turn > turn)
                        })
                        .await?
                }
            };
            debug!("{:?} removed {} entries in {}", scope, removed, self.room_id);
        }

        for (player_id, assignment) in &plan.assignments {
            self.replica
                .put_assignment(&self.room_id, *player_id, assignment)
                .await?;
        }
        self.replica.patch_room(&self.room_id, &plan.patch).await?;
        Ok(())
    }

    fn view(&self) -> Option<RoomView> {
        self.state.view(self.me, self.policy, &self.barrier)
    }

    fn publish_view(&mut self) {
        let view = self.view();
        if view == self.last_view {
            return;
        }
        let closed = view.is_none() && self.last_view.is_some();
        self.last_view = view.clone();

        let notice = match view {
            Some(view) => PeerNotice::RoomUpdate { view },
            None if closed => PeerNotice::RoomClosed {
                room_id: self.room_id.clone(),
            },
            None => return,
        };
        if self.notices.send(notice).is_err() {
            debug!("Nobody is listening for updates to {}", self.room_id);
        }
    }
}

/// Session-side handle to a running coordinator. Dropping it stops the coordinator and
/// releases the room's subscriptions.
pub struct RoomHandle {
    room_id: RoomId,
    commands: mpsc::UnboundedSender<RoomCommand>,
    task: JoinHandle<()>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| RoomError::NoOpenRoom)?;
        response.await.map_err(|_| RoomError::NoOpenRoom)
    }

    pub async fn join(&self, name: impl Into<String>) -> Result<(), RoomError> {
        let name = name.into();
        self.request(|reply| RoomCommand::Join { name, reply }).await?
    }

    pub async fn leave(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave { reply }).await?
    }

    pub async fn start(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { reply }).await?
    }

    pub async fn submit(&self, text: impl Into<String>) -> Result<AnswerKey, RoomError> {
        let text = text.into();
        self.request(|reply| RoomCommand::Submit { text, reply }).await?
    }

    pub async fn view(&self) -> Option<RoomView> {
        self.request(|reply| RoomCommand::View { reply })
            .await
            .ok()
            .flatten()
    }

    /// Stop the coordinator and wait for it to release its subscriptions.
    pub async fn close(self) {
        let RoomHandle {
            room_id,
            commands,
            task,
        } = self;
        drop(commands);
        if let Err(err) = task.await {
            warn!("Coordinator for {} ended abnormally: {}", room_id, err);
        }
    }
}
