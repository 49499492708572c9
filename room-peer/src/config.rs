use room_core::SeatingPolicy;
use room_types::{MAX_PLAYERS, MIN_PLAYERS, RoomSettings};
use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub database_url: String,
    /// Device profile the stored identity is kept under.
    pub profile: String,
    /// Query string carrying the deep link, e.g. `room=friday-night`.
    pub room_link: Option<String>,
    pub link_base: String,
    pub group_name: String,
    pub table_size: usize,
    pub max_players: u8,
    pub max_words: u32,
    pub seating: SeatingPolicy,
    pub player_name: Option<String>,
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} '{}', using the default", key, raw);
            default
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl PeerConfig {
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_players: u8 = parse_or(&lookup, "MAX_PLAYERS", 6);
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&max_players) {
            warn!(
                "MAX_PLAYERS {} outside {}..={}, clamping",
                max_players, MIN_PLAYERS, MAX_PLAYERS
            );
        }

        let mut max_words: u32 = parse_or(&lookup, "MAX_WORDS", 12);
        if max_words == 0 {
            warn!("MAX_WORDS must be at least 1, using the default");
            max_words = 12;
        }

        let mut table_size: usize = parse_or(&lookup, "TABLE_SIZE", 3);
        if table_size < MIN_PLAYERS as usize {
            warn!("TABLE_SIZE {} too small, seating {}", table_size, MIN_PLAYERS);
            table_size = MIN_PLAYERS as usize;
        }

        Self {
            database_url: non_empty(lookup("DATABASE_URL"))
                .unwrap_or_else(|| "sqlite://foldline.db?mode=rwc".to_string()),
            profile: non_empty(lookup("PEER_PROFILE")).unwrap_or_else(|| "default".to_string()),
            room_link: non_empty(lookup("ROOM_LINK")),
            link_base: non_empty(lookup("LINK_BASE"))
                .unwrap_or_else(|| "http://localhost:5173/".to_string()),
            group_name: non_empty(lookup("GROUP_NAME"))
                .unwrap_or_else(|| "Friday Night".to_string()),
            table_size,
            max_players: max_players.clamp(MIN_PLAYERS, MAX_PLAYERS),
            max_words,
            seating: parse_or(&lookup, "SEATING", SeatingPolicy::default()),
            player_name: non_empty(lookup("PLAYER_NAME")),
        }
    }

    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            group_name: self.group_name.clone(),
            max_players: self.max_players,
            max_words: self.max_words,
            only_host_starts: true,
        }
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self::new()
    }
}
