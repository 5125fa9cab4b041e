//! Keyword-triggered lorebook activation.
//!
//! One call to [`LoreEngine::process`] scans the recent chat history (plus
//! any character/persona fields individual entries opt into) against every
//! supplied book, recursively re-scans as activated content introduces new
//! trigger text, enforces the token budget, and folds the surviving entries
//! into a [`ProcessedLore`] bundle grouped by prompt position.

mod budget;
mod compositor;
mod events;
mod key_matcher;
mod scan_window;
mod selective;

pub use compositor::{DepthInjection, ProcessedLore};
pub use events::{LoreEventSink, NoopEventSink};

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::errors::Result;
use crate::models::characters::CharacterMetadata;
use crate::models::chats::ChatMessage;
use crate::models::lorebooks::Lorebook;
use crate::models::settings::LoreSettings;
use crate::models::user_personas::Persona;
use crate::services::token_counter::TokenCounter;
use crate::text_processing::substitute_params;

use budget::BudgetAllocator;
use key_matcher::KeyMatcher;
use scan_window::ScanWindowBuilder;

/// Read-only inputs for one processing call.
#[derive(Clone, Copy)]
pub struct LoreScanParams<'a> {
    pub history: &'a [ChatMessage],
    pub character: Option<&'a CharacterMetadata>,
    pub persona: Option<&'a Persona>,
    pub books: &'a [Lorebook],
    pub settings: &'a LoreSettings,
    pub max_context_tokens: usize,
}

/// The options a call actually runs with after defaults are resolved,
/// reported once through [`LoreEventSink::on_scan_started`].
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedScanOptions {
    pub scan_depth: usize,
    pub total_budget: usize,
    pub recursive_scan: bool,
    pub max_recursion_steps: u32,
    pub case_sensitive: bool,
    pub match_whole_words: bool,
    pub book_count: usize,
    pub entry_count: usize,
}

/// An entry that passed key matching in the current round, carrying just
/// enough to survive the probability and budget gates without re-borrowing
/// the books.
pub(crate) struct RoundCandidate {
    pub(crate) book_idx: usize,
    pub(crate) entry_idx: usize,
    pub(crate) seq: usize,
    pub(crate) order: i32,
    pub(crate) uid: i32,
    pub(crate) ignore_budget: bool,
    pub(crate) use_probability: bool,
    pub(crate) probability: u32,
    pub(crate) content: String,
}

/// A kept entry. Once recorded, it is never re-evaluated or removed for the
/// rest of the call.
pub(crate) struct ActivationRecord {
    pub(crate) book_idx: usize,
    pub(crate) entry_idx: usize,
    pub(crate) seq: usize,
    pub(crate) order: i32,
    pub(crate) content: String,
}

/// The activation engine. Cheap to clone; holds only its injected
/// capabilities. Each call owns its own scan state, so one engine may serve
/// concurrent calls for different chats.
#[derive(Clone)]
pub struct LoreEngine {
    token_counter: Arc<dyn TokenCounter>,
    event_sink: Arc<dyn LoreEventSink>,
}

impl LoreEngine {
    #[must_use]
    pub fn new(token_counter: Arc<dyn TokenCounter>) -> Self {
        Self::with_event_sink(token_counter, Arc::new(NoopEventSink))
    }

    #[must_use]
    pub fn with_event_sink(
        token_counter: Arc<dyn TokenCounter>,
        event_sink: Arc<dyn LoreEventSink>,
    ) -> Self {
        Self {
            token_counter,
            event_sink,
        }
    }

    /// Runs one full scan with a fresh entropy-seeded RNG for probability
    /// rolls.
    ///
    /// # Errors
    ///
    /// Fails only when the injected token counter fails; every other
    /// anomaly (invalid regex keys, unroutable positions, runaway
    /// recursion) resolves into an entry simply not contributing.
    pub async fn process(&self, params: LoreScanParams<'_>) -> Result<ProcessedLore> {
        let mut rng = StdRng::from_entropy();
        self.process_with_rng(params, &mut rng).await
    }

    /// Like [`LoreEngine::process`], but drawing probability rolls from the
    /// caller's RNG. For a fixed input and RNG state the result is
    /// reproducible bit for bit.
    ///
    /// # Errors
    ///
    /// See [`LoreEngine::process`].
    #[instrument(skip_all, fields(
        books = params.books.len(),
        history_len = params.history.len(),
        max_context_tokens = params.max_context_tokens,
    ))]
    pub async fn process_with_rng<R: Rng + Send>(
        &self,
        params: LoreScanParams<'_>,
        rng: &mut R,
    ) -> Result<ProcessedLore> {
        let settings = params.settings;
        let char_name = params.character.map_or("Character", |c| c.name.as_str());
        let user_name = params.persona.map_or("User", |p| p.name.as_str());

        // Entries are considered in ascending `order` in every round, ties
        // broken by book/entry enumeration order.
        let mut scan_order: Vec<(usize, usize, usize)> = Vec::new();
        for (book_idx, book) in params.books.iter().enumerate() {
            for entry_idx in 0..book.entries.len() {
                scan_order.push((book_idx, entry_idx, scan_order.len()));
            }
        }
        scan_order.sort_by_key(|&(book_idx, entry_idx, seq)| {
            (params.books[book_idx].entries[entry_idx].order, seq)
        });

        let mut windows =
            ScanWindowBuilder::new(params.history, params.character, params.persona, settings);
        let matcher = KeyMatcher::new(settings);
        let mut allocator = BudgetAllocator::new(settings, params.max_context_tokens);
        let max_steps = settings.effective_max_recursion_steps();

        self.event_sink.on_scan_started(&ResolvedScanOptions {
            scan_depth: settings.scan_depth,
            total_budget: allocator.total_budget(),
            recursive_scan: settings.recursive_scan,
            max_recursion_steps: max_steps,
            case_sensitive: settings.case_sensitive,
            match_whole_words: settings.match_whole_words,
            book_count: params.books.len(),
            entry_count: scan_order.len(),
        });

        let mut activated: Vec<ActivationRecord> = Vec::new();
        let mut activated_keys: HashSet<(usize, usize)> = HashSet::new();
        let mut rounds = 0u32;

        loop {
            rounds += 1;

            // Step 1: collect this round's candidates via key matching.
            let mut candidates: Vec<RoundCandidate> = Vec::new();
            for &(book_idx, entry_idx, seq) in &scan_order {
                if activated_keys.contains(&(book_idx, entry_idx)) {
                    continue;
                }
                let entry = &params.books[book_idx].entries[entry_idx];
                if entry.disable {
                    continue;
                }

                let eligible = if entry.constant {
                    true
                } else if entry.keys.is_empty() {
                    false
                } else {
                    let window = windows.window_for(entry);
                    let primary = entry.keys.iter().any(|key| {
                        let key = substitute_params(key, char_name, user_name);
                        matcher.matches(&window, &key, entry)
                    });
                    if !primary {
                        false
                    } else if entry.has_secondary_requirement() {
                        let secondary: Vec<String> = entry
                            .secondary_keys
                            .iter()
                            .map(|key| substitute_params(key, char_name, user_name))
                            .collect();
                        selective::secondary_match(&matcher, &window, entry, &secondary)
                    } else {
                        true
                    }
                };

                if eligible {
                    candidates.push(RoundCandidate {
                        book_idx,
                        entry_idx,
                        seq,
                        order: entry.order,
                        uid: entry.uid,
                        ignore_budget: entry.ignore_budget,
                        use_probability: entry.use_probability,
                        probability: entry.probability,
                        content: substitute_params(&entry.content, char_name, user_name),
                    });
                }
            }

            // Step 2: overflow rejection from earlier rounds, then the
            // probability gate.
            candidates.retain(|candidate| {
                if allocator.overflowed() && !candidate.ignore_budget {
                    debug!(
                        uid = candidate.uid,
                        "Skipping candidate: budget already overflowed"
                    );
                    return false;
                }
                if candidate.use_probability {
                    let roll = rng.gen::<f64>() * 100.0;
                    if roll >= f64::from(candidate.probability) {
                        debug!(
                            uid = candidate.uid,
                            roll,
                            probability = candidate.probability,
                            "Probability roll failed"
                        );
                        return false;
                    }
                }
                true
            });

            // Step 3: budget allocation for the round.
            let kept = allocator
                .allocate(candidates, self.token_counter.as_ref())
                .await?;

            // Step 4: record keeps, notify, and feed recursion.
            let kept_any = !kept.is_empty();
            let mut recursion_added = false;
            for candidate in kept {
                activated_keys.insert((candidate.book_idx, candidate.entry_idx));
                let book = &params.books[candidate.book_idx];
                let entry = &book.entries[candidate.entry_idx];
                self.event_sink.on_entry_activated(&book.name, entry);

                if settings.recursive_scan
                    && !entry.prevent_recursion
                    && !candidate.content.is_empty()
                {
                    windows.push_recursion(candidate.content.clone());
                    recursion_added = true;
                }

                activated.push(ActivationRecord {
                    book_idx: candidate.book_idx,
                    entry_idx: candidate.entry_idx,
                    seq: candidate.seq,
                    order: candidate.order,
                    content: candidate.content,
                });
            }

            // Steps 5 and 6: another round only while fresh recursion
            // content exists, bounded by the hard step limit.
            if !(kept_any && recursion_added) {
                debug!(rounds, activated = activated.len(), "Scan settled");
                break;
            }
            if rounds >= max_steps {
                debug!(rounds, "Recursion step bound reached");
                break;
            }
        }

        let mut bundle = compositor::compose(params.books, activated, settings);
        bundle.budget_overflowed = allocator.overflowed();
        bundle.rounds = rounds;
        self.event_sink.on_scan_complete(&bundle);
        Ok(bundle)
    }
}
