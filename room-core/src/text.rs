use regex::Regex;
use room_types::{RoomError, RoomId};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Turn a human-chosen group name into the slug rooms are keyed by.
/// Accents are folded, everything else outside `[a-z0-9]` becomes a single dash.
pub fn slugify(text: &str) -> String {
    let folded: String = text
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    NON_SLUG
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// Slugify and reject names that leave nothing behind.
pub fn room_id_for(group_name: &str) -> Result<RoomId, RoomError> {
    let slug = slugify(group_name);
    if slug.is_empty() {
        return Err(RoomError::InvalidName);
    }
    Ok(RoomId::from_slug(slug))
}

fn collapse_whitespace(input: &str) -> String {
    WHITESPACE.replace_all(input, " ").trim().to_string()
}

/// Collapse whitespace and keep at most `max_words` words. Zero means no limit.
pub fn clamp_words(input: &str, max_words: u32) -> String {
    let cleaned = collapse_whitespace(input);
    if max_words == 0 {
        return cleaned;
    }
    let words: Vec<&str> = cleaned.split(' ').collect();
    if words.len() <= max_words as usize {
        return cleaned;
    }
    words[..max_words as usize].join(" ")
}

/// Display names are trimmed and whitespace-collapsed; an empty result is rejected.
pub fn sanitize_name(name: &str) -> Result<String, RoomError> {
    let cleaned = collapse_whitespace(name);
    if cleaned.is_empty() {
        return Err(RoomError::InvalidName);
    }
    Ok(cleaned)
}
