use std::collections::HashMap;

use crate::models::characters::CharacterMetadata;
use crate::models::chats::ChatMessage;
use crate::models::lorebooks::LorebookEntry;
use crate::models::settings::LoreSettings;
use crate::models::user_personas::Persona;

/// Builds the text an entry's keys are tested against.
///
/// The window is a depth-bounded slice of recent history (newest first),
/// plus whichever auxiliary character/persona fields the entry opts into,
/// plus everything the recursion buffer has accumulated so far. Case
/// handling belongs to the key matcher, so the window is never folded here.
pub(crate) struct ScanWindowBuilder<'a> {
    history: &'a [ChatMessage],
    character: Option<&'a CharacterMetadata>,
    persona: Option<&'a Persona>,
    settings: &'a LoreSettings,
    // Base windows memoized per scan depth; the cache is purely an
    // optimization and entries sharing the global depth hit one slot.
    base_cache: HashMap<usize, String>,
    recursion_buffer: Vec<String>,
    recursion_suffix: Option<String>,
}

impl<'a> ScanWindowBuilder<'a> {
    pub(crate) fn new(
        history: &'a [ChatMessage],
        character: Option<&'a CharacterMetadata>,
        persona: Option<&'a Persona>,
        settings: &'a LoreSettings,
    ) -> Self {
        Self {
            history,
            character,
            persona,
            settings,
            base_cache: HashMap::new(),
            recursion_buffer: Vec::new(),
            recursion_suffix: None,
        }
    }

    /// Assembles the scan window for one entry.
    pub(crate) fn window_for(&mut self, entry: &LorebookEntry) -> String {
        let depth = entry.effective_scan_depth(self.settings);
        let mut window = self.base_window(depth).to_string();

        for value in self.aux_fields(entry) {
            window.push('\n');
            window.push_str(value);
        }

        if !self.recursion_buffer.is_empty() {
            let suffix = self
                .recursion_suffix
                .get_or_insert_with(|| self.recursion_buffer.join("\n"));
            window.push('\n');
            window.push_str(suffix);
        }

        window
    }

    /// Feeds an activated entry's content back for later rounds. Only the
    /// cached recursion suffix is invalidated; base windows stay valid.
    pub(crate) fn push_recursion(&mut self, content: String) {
        self.recursion_buffer.push(content);
        self.recursion_suffix = None;
    }

    fn base_window(&mut self, depth: usize) -> &str {
        let history = self.history;
        self.base_cache.entry(depth).or_insert_with(|| {
            history
                .iter()
                .rev()
                .take(depth)
                .map(|message| message.content.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    /// Auxiliary fields in their fixed inclusion order, as an explicit
    /// (flag, field) table so new fields slot in without touching the
    /// window assembly above.
    fn aux_fields(&self, entry: &LorebookEntry) -> Vec<&'a str> {
        let character = self.character;
        let persona = self.persona;
        let table: [(bool, Option<&'a str>); 6] = [
            (
                entry.match_character_description,
                character.and_then(|c| c.description.as_deref()),
            ),
            (
                entry.match_character_personality,
                character.and_then(|c| c.personality.as_deref()),
            ),
            (
                entry.match_character_depth_prompt,
                character.and_then(|c| c.depth_prompt.as_deref()),
            ),
            (
                entry.match_creator_notes,
                character.and_then(|c| c.creator_notes.as_deref()),
            ),
            (
                entry.match_scenario,
                character.and_then(|c| c.scenario.as_deref()),
            ),
            (
                entry.match_persona_description,
                persona.and_then(|p| p.description.as_deref()),
            ),
        ];

        table
            .into_iter()
            .filter_map(|(enabled, value)| if enabled { value } else { None })
            .collect()
    }
}
