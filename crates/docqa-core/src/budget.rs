//! Token-budgeted context selection.

use tracing::debug;

use crate::traits::Tokenizer;
use crate::types::{BudgetedContext, Candidate};

/// Keeps the longest prefix of `candidates` whose token total stays within
/// `token_budget`.
///
/// Candidates are taken in the order given. Selection stops at the first one
/// that would push the total over the budget; nothing after it is looked at,
/// even if a later, smaller candidate would still fit. If the first candidate is
/// already too large the context is empty.
pub fn select_context(candidates: &[Candidate], token_budget: usize, tokenizer: &dyn Tokenizer) -> BudgetedContext {
    let mut context = BudgetedContext::default();
    for (rank, candidate) in candidates.iter().enumerate() {
        let tokens = tokenizer.token_count(&candidate.text);
        let total = context.tokens_used.saturating_add(tokens);
        if total > token_budget {
            debug!(rank, tokens, used = context.tokens_used, token_budget, "context budget reached");
            break;
        }
        context.tokens_used = total;
        context.texts.push(candidate.text.clone());
        context.provenance.push(candidate.metadata.provenance());
    }
    context
}
