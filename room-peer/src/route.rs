use room_core::slugify;
use room_types::RoomId;

const ROOM_PARAM: &str = "room";

/// Where a peer lands on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Discovery,
    Room(RoomId),
}

impl Route {
    /// Read the deep link out of a query string. A missing or unusable `room` parameter
    /// lands on discovery.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let slug = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == ROOM_PARAM)
            .map(|(_, value)| slugify(value))
            .unwrap_or_default();

        if slug.is_empty() {
            Route::Discovery
        } else {
            Route::Room(RoomId::from_slug(slug))
        }
    }

    /// Link that opens `room_id` directly.
    pub fn share_link(base: &str, room_id: &RoomId) -> String {
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{}{}{}={}", base, separator, ROOM_PARAM, room_id)
    }
}
