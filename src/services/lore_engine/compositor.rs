use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::chats::MessageRole;
use crate::models::lorebooks::{EntryPosition, Lorebook, LorebookEntry};
use crate::models::settings::LoreSettings;

use super::ActivationRecord;

/// A fragment destined for a fixed depth in the outgoing message list.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DepthInjection {
    pub depth: u32,
    pub role: MessageRole,
    pub entries: Vec<String>,
}

/// The final artifact of one processing call: every activated fragment,
/// grouped by target position, plus per-book activation bookkeeping.
/// Immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedLore {
    /// Accumulated text spliced ahead of the character block.
    pub world_info_before: String,
    /// Accumulated text spliced after the character block.
    pub world_info_after: String,
    pub an_before: Vec<String>,
    pub an_after: Vec<String>,
    pub em_before: Vec<String>,
    pub em_after: Vec<String>,
    pub depth_injections: Vec<DepthInjection>,
    /// Fragments routed to named outlets, in activation order per outlet.
    pub outlets: HashMap<String, Vec<String>>,
    /// Which entries fired, per book name, in activation order.
    pub triggered_entries: HashMap<String, Vec<LorebookEntry>>,
    /// True when any non-exempt candidate was rejected for budget.
    pub budget_overflowed: bool,
    /// Number of scan rounds the call ran.
    pub rounds: u32,
    pub generated_at: DateTime<Utc>,
}

impl ProcessedLore {
    fn empty() -> Self {
        Self {
            world_info_before: String::new(),
            world_info_after: String::new(),
            an_before: Vec::new(),
            an_after: Vec::new(),
            em_before: Vec::new(),
            em_after: Vec::new(),
            depth_injections: Vec::new(),
            outlets: HashMap::new(),
            triggered_entries: HashMap::new(),
            budget_overflowed: false,
            rounds: 0,
            generated_at: Utc::now(),
        }
    }
}

/// Folds the final activated set into the output bundle.
///
/// Entries are walked in ascending `order` (ties by original enumeration
/// sequence), so every fragment list and the per-book triggered lists come
/// out in that order. Entries whose substituted content is empty are still
/// recorded as triggered but contribute no fragment.
pub(crate) fn compose(
    books: &[Lorebook],
    mut activated: Vec<ActivationRecord>,
    settings: &LoreSettings,
) -> ProcessedLore {
    activated.sort_by_key(|record| (record.order, record.seq));

    let mut bundle = ProcessedLore::empty();
    let mut before = String::new();
    let mut after = String::new();

    for record in activated {
        let book = &books[record.book_idx];
        let entry = &book.entries[record.entry_idx];

        bundle
            .triggered_entries
            .entry(book.name.clone())
            .or_default()
            .push(entry.clone());

        if record.content.is_empty() {
            continue;
        }

        match entry.position {
            EntryPosition::BeforeCharacter => {
                before.push_str(&record.content);
                before.push('\n');
            }
            EntryPosition::AfterCharacter => {
                after.push_str(&record.content);
                after.push('\n');
            }
            EntryPosition::BeforeAuthorsNote => bundle.an_before.push(record.content),
            EntryPosition::AfterAuthorsNote => bundle.an_after.push(record.content),
            EntryPosition::BeforeExampleMessages => bundle.em_before.push(record.content),
            EntryPosition::AfterExampleMessages => bundle.em_after.push(record.content),
            EntryPosition::AtDepth => bundle.depth_injections.push(DepthInjection {
                depth: entry.depth,
                role: settings.depth_injection_role,
                entries: vec![record.content],
            }),
            EntryPosition::Outlet => match entry.outlet_name.as_deref() {
                Some(name) if !name.is_empty() => {
                    bundle
                        .outlets
                        .entry(name.to_string())
                        .or_default()
                        .push(record.content);
                }
                _ => {
                    debug!(uid = entry.uid, "Dropping outlet entry with no outlet name");
                }
            },
        }
    }

    bundle.world_info_before = before.trim_end().to_string();
    bundle.world_info_after = after.trim_end().to_string();
    bundle
}
