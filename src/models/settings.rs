use serde::Deserialize;

use crate::models::chats::MessageRole;

/// Global scan defaults, supplied read-only per processing call.
///
/// Deserializable so a caller can load the block straight out of its JSON
/// config; every field carries a default so partial blobs work.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoreSettings {
    /// How many recent messages an entry scans unless it overrides the depth.
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,

    /// Token budget as a percentage of the call's max context size.
    #[serde(default = "default_budget_percent")]
    pub budget_percent: u32,

    /// Absolute ceiling on the token budget; 0 disables the cap.
    #[serde(default)]
    pub budget_cap: usize,

    #[serde(default = "default_match_whole_words")]
    pub match_whole_words: bool,

    #[serde(default)]
    pub case_sensitive: bool,

    /// Feed activated content back into later scan rounds.
    #[serde(default = "default_recursive_scan")]
    pub recursive_scan: bool,

    /// Hard bound on scan rounds. `None` falls back to
    /// [`LoreSettings::DEFAULT_MAX_RECURSION_STEPS`].
    #[serde(default)]
    pub max_recursion_steps: Option<u32>,

    /// Role attached to at-depth injections. The source data carries no
    /// per-entry role, so this is a caller-level choice.
    #[serde(default = "default_depth_injection_role")]
    pub depth_injection_role: MessageRole,
}

impl LoreSettings {
    pub const DEFAULT_MAX_RECURSION_STEPS: u32 = 10;

    #[must_use]
    pub fn effective_max_recursion_steps(&self) -> u32 {
        self.max_recursion_steps
            .unwrap_or(Self::DEFAULT_MAX_RECURSION_STEPS)
    }
}

impl Default for LoreSettings {
    fn default() -> Self {
        Self {
            scan_depth: default_scan_depth(),
            budget_percent: default_budget_percent(),
            budget_cap: 0,
            match_whole_words: default_match_whole_words(),
            case_sensitive: false,
            recursive_scan: default_recursive_scan(),
            max_recursion_steps: None,
            depth_injection_role: MessageRole::System,
        }
    }
}

fn default_scan_depth() -> usize {
    2
}

fn default_budget_percent() -> u32 {
    25
}

fn default_match_whole_words() -> bool {
    true
}

fn default_recursive_scan() -> bool {
    true
}

fn default_depth_injection_role() -> MessageRole {
    MessageRole::System
}
