use futures_util::future::join_all;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use room_core::room_id_for;
use room_peer::{PeerConfig, PeerSession, Route, SessionOptions};
use room_persistence::{IdentityRepository, connect_and_migrate};
use room_replica::MemoryReplica;
use room_types::{LocalIdentity, Millis, PeerCommand, PeerNotice, RoomSettings, RoomStatus};

const SAMPLE_LINES: [&str; 8] = [
    "The lighthouse keeper",
    "a retired tango instructor",
    "on the last night ferry",
    "just before the fireworks",
    "counting umbrellas in silence",
    "Have you seen my other glove?",
    "Only on Tuesdays, sadly.",
    "They opened a bakery together.",
];

/// One simulated player at the local table.
struct Seat {
    index: usize,
    name: String,
    session: PeerSession<MemoryReplica>,
    notices: UnboundedReceiver<PeerNotice>,
    table_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting foldline local table...");
    let config = PeerConfig::new();

    let db = connect_and_migrate(&config.database_url).await?;
    let identities = Arc::new(IdentityRepository::new(db));
    let local = identities.load_or_create(&config.profile).await?;
    info!("Playing as {} (profile '{}')", local.player_id, config.profile);

    let store = Arc::new(MemoryReplica::new());
    let options = SessionOptions {
        seating: config.seating,
        link_base: config.link_base.clone(),
    };

    let mut seats = Vec::with_capacity(config.table_size);
    for index in 0..config.table_size {
        let (identity, name) = if index == 0 {
            let name = config
                .player_name
                .clone()
                .or_else(|| local.display_name.clone())
                .unwrap_or_else(|| "Player 1".to_string());
            (local.clone(), name)
        } else {
            (LocalIdentity::generate(), format!("Player {}", index + 1))
        };

        let (session, notices) = PeerSession::new(store.clone(), identity, options.clone());
        let session = if index == 0 {
            session.with_identity_store(identities.clone(), config.profile.clone())
        } else {
            session
        };
        seats.push(Seat {
            index,
            name,
            session,
            notices,
            table_size: config.table_size,
        });
    }

    // The replica starts empty, so a deep-linked room is created under its own slug.
    let settings = match Route::from_query(config.room_link.as_deref().unwrap_or_default()) {
        Route::Room(room_id) => RoomSettings {
            group_name: room_id.to_string(),
            ..config.room_settings()
        },
        Route::Discovery => config.room_settings(),
    };
    let room_id = room_id_for(&settings.group_name)?;

    if let Some(first) = seats.first_mut() {
        first.session.watch_rooms();
        first
            .session
            .handle_command(PeerCommand::CreateRoom { settings })
            .await?;
    }

    // Join one after another so the first seat is the earliest joiner and claims host.
    for seat in seats.iter_mut() {
        seat.session.follow(Route::Room(room_id.clone())).await?;
        seat.session
            .handle_command(PeerCommand::JoinRoom {
                name: seat.name.clone(),
            })
            .await?;
    }

    let tasks: Vec<_> = seats.into_iter().map(|seat| tokio::spawn(play(seat))).collect();

    tokio::select! {
        results = join_all(tasks) => {
            for result in results {
                if let Err(e) = result {
                    error!("A seat stopped unexpectedly: {}", e);
                }
            }
            info!("Table finished.");
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, leaving the table...");
        }
    }

    Ok(())
}

/// Answer every turn with a canned line, start the game when hosting, and log the reveal.
async fn play(mut seat: Seat) {
    let mut started = false;
    let mut answered: Option<(Option<Millis>, u32)> = None;

    while let Some(notice) = seat.notices.recv().await {
        let view = match notice {
            PeerNotice::RoomUpdate { view } => view,
            PeerNotice::RoomsChanged { rooms } => {
                info!("{} rooms listed", rooms.len());
                continue;
            }
            PeerNotice::Error { error } => {
                warn!("{}: {}", seat.name, error);
                continue;
            }
            other => {
                debug!("{}: {:?}", seat.name, other);
                continue;
            }
        };

        if let Some(reveal) = &view.reveal {
            info!("{} reads sheet {}:", seat.name, reveal.sheet_index + 1);
            for (turn, line) in reveal.lines.iter().enumerate() {
                info!("  {}. {}", turn + 1, line);
            }
            break;
        }

        match view.room.status {
            RoomStatus::Lobby
                if view.is_host && !started && view.players.len() >= seat.table_size =>
            {
                started = true;
                if let Err(e) = seat.session.handle_command(PeerCommand::StartGame).await {
                    error!("{} could not start the game: {}", seat.name, e);
                    break;
                }
            }
            RoomStatus::Playing if view.my_sheet.is_some() && !view.waiting => {
                let step = (view.room.started_at, view.room.current_turn);
                if answered == Some(step) {
                    continue;
                }
                answered = Some(step);

                let pick = (seat.index + view.room.current_turn as usize) % SAMPLE_LINES.len();
                let text = format!("{} ({})", SAMPLE_LINES[pick], seat.name);
                if let Some(prompt) = &view.prompt {
                    debug!("{} answers '{}'", seat.name, prompt);
                }
                // Failures are published as notices and logged above.
                let _ = seat
                    .session
                    .handle_command(PeerCommand::SubmitAnswer { text })
                    .await;
            }
            _ => {}
        }
    }

    seat.session.shutdown().await;
}
