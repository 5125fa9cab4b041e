use crate::models::lorebooks::LorebookEntry;

use super::compositor::ProcessedLore;
use super::ResolvedScanOptions;

/// Observer for engine lifecycle notifications.
///
/// Notifications are one-way and fire-and-forget: the sink receives shared
/// references only and cannot alter the scan. Implementations must return
/// promptly (enqueue and move on) since they run inline with the scan loop.
pub trait LoreEventSink: Send + Sync {
    /// Emitted once at call start with the resolved options.
    fn on_scan_started(&self, options: &ResolvedScanOptions) {
        let _ = options;
    }

    /// Emitted once per entry at the moment the budget allocator keeps it.
    fn on_entry_activated(&self, book_name: &str, entry: &LorebookEntry) {
        let _ = (book_name, entry);
    }

    /// Emitted once at call end with the final bundle.
    fn on_scan_complete(&self, bundle: &ProcessedLore) {
        let _ = bundle;
    }
}

/// Default sink that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl LoreEventSink for NoopEventSink {}
