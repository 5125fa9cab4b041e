use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::settings::LoreSettings;

// --------------------
// --- Lorebook Model ---
// --------------------

/// A named collection of lore entries, supplied to the engine as read-only
/// input. Books are already loaded and decrypted by the time they reach the
/// activation engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Lorebook {
    pub id: Uuid,
    pub name: String,
    pub entries: Vec<LorebookEntry>,
}

impl Lorebook {
    #[must_use]
    pub fn new(name: impl Into<String>, entries: Vec<LorebookEntry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            entries,
        }
    }
}

// -------------------------
// --- LorebookEntry Model ---
// -------------------------

/// Where an activated entry's content is spliced into the outgoing prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryPosition {
    #[default]
    BeforeCharacter,
    AfterCharacter,
    BeforeAuthorsNote,
    AfterAuthorsNote,
    BeforeExampleMessages,
    AfterExampleMessages,
    /// Injected into the message list at `LorebookEntry::depth`.
    AtDepth,
    /// Routed to the named outlet in `LorebookEntry::outlet_name`.
    Outlet,
}

/// How an entry's secondary keys combine with an established primary match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectiveLogic {
    /// At least one secondary key must also match.
    #[default]
    AndAny,
    /// Every secondary key must also match.
    AndAll,
    /// At least one secondary key must fail to match.
    NotAll,
    /// No secondary key may match.
    NotAny,
}

/// A single triggerable lore snippet.
///
/// Entries are immutable inputs: the engine reads them during a processing
/// call and never writes them back. `uid` is unique within the owning book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LorebookEntry {
    pub uid: i32,
    /// Human-facing label; plays no part in activation.
    pub title: Option<String>,
    /// Primary trigger strings. An entry with no keys and `constant` unset
    /// can never activate.
    pub keys: Vec<String>,
    /// Secondary trigger strings, consulted only when `selective` is set.
    pub secondary_keys: Vec<String>,
    pub content: String,
    /// Ascending priority and tie-break for budget allocation and output
    /// ordering.
    pub order: i32,
    pub position: EntryPosition,
    /// Message-list insertion depth, used only with `EntryPosition::AtDepth`.
    pub depth: u32,
    /// Target outlet, used only with `EntryPosition::Outlet`.
    pub outlet_name: Option<String>,

    // --- Activation flags ---
    /// Always a candidate, bypassing key matching (still budgeted).
    pub constant: bool,
    /// Never a candidate.
    pub disable: bool,
    /// Secondary-key requirement applies.
    pub selective: bool,
    pub selective_logic: SelectiveLogic,
    /// Exempt from the token budget cap.
    pub ignore_budget: bool,
    /// Content is not fed back into later scan rounds.
    pub prevent_recursion: bool,
    /// Gate activation on a percentage roll of `probability`.
    pub use_probability: bool,
    /// Chance to activate once otherwise eligible, 0-100.
    pub probability: u32,

    // --- Per-entry overrides of global matching settings ---
    pub case_sensitive: Option<bool>,
    pub match_whole_words: Option<bool>,
    pub scan_depth: Option<usize>,

    // --- Auxiliary scan-window inclusions ---
    pub match_character_description: bool,
    pub match_character_personality: bool,
    pub match_character_depth_prompt: bool,
    pub match_creator_notes: bool,
    pub match_scenario: bool,
    pub match_persona_description: bool,
}

impl LorebookEntry {
    /// The number of recent history messages scanned for this entry.
    #[must_use]
    pub fn effective_scan_depth(&self, settings: &LoreSettings) -> usize {
        self.scan_depth.unwrap_or(settings.scan_depth)
    }

    #[must_use]
    pub fn is_case_sensitive(&self, settings: &LoreSettings) -> bool {
        self.case_sensitive.unwrap_or(settings.case_sensitive)
    }

    #[must_use]
    pub fn matches_whole_words(&self, settings: &LoreSettings) -> bool {
        self.match_whole_words.unwrap_or(settings.match_whole_words)
    }

    /// True when the secondary-key requirement actually constrains this
    /// entry: `selective` set and at least one secondary key present.
    #[must_use]
    pub fn has_secondary_requirement(&self) -> bool {
        self.selective && !self.secondary_keys.is_empty()
    }
}
