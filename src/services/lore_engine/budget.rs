use futures::future::try_join_all;
use tracing::debug;

use crate::errors::Result;
use crate::models::settings::LoreSettings;
use crate::services::token_counter::TokenCounter;

use super::RoundCandidate;

/// Enforces the token ceiling across all rounds of one processing call.
///
/// The overflow flag is monotonic: once any non-exempt candidate fails to
/// fit, every later non-exempt candidate is rejected for the rest of the
/// call regardless of remaining headroom.
pub(crate) struct BudgetAllocator {
    total_budget: usize,
    used_budget: usize,
    overflowed: bool,
}

impl BudgetAllocator {
    pub(crate) fn new(settings: &LoreSettings, max_context_tokens: usize) -> Self {
        let percent = f64::from(settings.budget_percent) / 100.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut total_budget = (percent * max_context_tokens as f64).round() as usize;
        if settings.budget_cap > 0 && total_budget > settings.budget_cap {
            debug!(
                total_budget,
                cap = settings.budget_cap,
                "Token budget capped"
            );
            total_budget = settings.budget_cap;
        }

        Self {
            total_budget: total_budget.max(1),
            used_budget: 0,
            overflowed: false,
        }
    }

    pub(crate) fn total_budget(&self) -> usize {
        self.total_budget
    }

    pub(crate) fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Decides which of a round's candidates are kept, in original relative
    /// order.
    ///
    /// Every candidate's cost (a separating newline plus its substituted
    /// content) is requested from the counter up front in one concurrent
    /// batch; keep/drop decisions then walk the candidates in order.
    /// Budget-exempt candidates are always kept and still consume from the
    /// running total, but never set the overflow flag.
    ///
    /// # Errors
    ///
    /// Propagates any token-counter failure, aborting the call.
    pub(crate) async fn allocate(
        &mut self,
        candidates: Vec<RoundCandidate>,
        counter: &dyn TokenCounter,
    ) -> Result<Vec<RoundCandidate>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let texts: Vec<String> = candidates
            .iter()
            .map(|candidate| format!("\n{}", candidate.content))
            .collect();
        let costs = try_join_all(texts.iter().map(|text| counter.count_tokens(text))).await?;

        let mut kept = Vec::with_capacity(candidates.len());
        for (candidate, cost) in candidates.into_iter().zip(costs) {
            if self.overflowed && !candidate.ignore_budget {
                debug!(uid = candidate.uid, "Dropping entry: budget overflowed");
                continue;
            }
            if !candidate.ignore_budget && self.used_budget + cost > self.total_budget {
                debug!(
                    uid = candidate.uid,
                    cost,
                    used = self.used_budget,
                    total = self.total_budget,
                    "Entry exceeds token budget; overflow set"
                );
                self.overflowed = true;
                continue;
            }

            self.used_budget += cost;
            kept.push(candidate);
        }

        Ok(kept)
    }
}
