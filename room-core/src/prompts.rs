use room_types::Room;

/// Authorship rounds per game. Every game runs this many turns regardless of roster size.
pub const TOTAL_TURNS: u32 = 8;

/// Shown when a room carries fewer prompts than turns.
pub const FALLBACK_PROMPT: &str = "Question";

const DEFAULT_PROMPTS: [&str; TOTAL_TURNS as usize] = [
    "Who?",
    "With whom?",
    "Where?",
    "When?",
    "What were they doing?",
    "What did one say?",
    "What did the other answer?",
    "How did it end?",
];

pub fn default_prompts() -> Vec<String> {
    DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect()
}

/// The prompts a room plays with. Rooms whose stored list was missing or unreadable
/// arrive here with an empty list and get the built-in deck.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDeck {
    prompts: Vec<String>,
}

impl PromptDeck {
    pub fn for_room(room: &Room) -> Self {
        if room.prompts.is_empty() {
            Self::default()
        } else {
            Self {
                prompts: room.prompts.clone(),
            }
        }
    }

    pub fn prompt_for(&self, turn: u32) -> &str {
        self.prompts
            .get(turn as usize)
            .map(String::as_str)
            .unwrap_or(FALLBACK_PROMPT)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl Default for PromptDeck {
    fn default() -> Self {
        Self {
            prompts: default_prompts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deck_covers_every_turn() {
        let deck = PromptDeck::default();
        assert_eq!(deck.len(), TOTAL_TURNS as usize);
        for turn in 0..TOTAL_TURNS {
            assert_ne!(deck.prompt_for(turn), FALLBACK_PROMPT);
        }
    }

    #[test]
    fn test_short_deck_falls_back() {
        let deck = PromptDeck {
            prompts: vec!["Only one".to_string()],
        };
        assert_eq!(deck.prompt_for(0), "Only one");
        assert_eq!(deck.prompt_for(1), FALLBACK_PROMPT);
        assert_eq!(deck.prompt_for(TOTAL_TURNS + 3), FALLBACK_PROMPT);
    }
}
