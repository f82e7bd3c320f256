//! Query-time orchestration: retrieve, budget, prompt, complete, assemble.

use tracing::{info, warn};

use crate::answer::{assemble, Answer};
use crate::budget::select_context;
use crate::config::QuerySettings;
use crate::error::{Error, Result};
use crate::prompt::build_prompt;
use crate::retriever::Retriever;
use crate::traits::{CompletionModel, Tokenizer, VectorStore};

pub struct QueryPipeline {
    store: Box<dyn VectorStore>,
    tokenizer: Box<dyn Tokenizer>,
    completion: Box<dyn CompletionModel>,
    settings: QuerySettings,
}

impl QueryPipeline {
    pub fn new(
        store: Box<dyn VectorStore>,
        tokenizer: Box<dyn Tokenizer>,
        completion: Box<dyn CompletionModel>,
        settings: QuerySettings,
    ) -> Self {
        Self { store, tokenizer, completion, settings }
    }

    /// Answers one question from the collection.
    ///
    /// Issues one similarity query and one completion call. A context that is
    /// empty because nothing fit the budget is not an error; the model is asked
    /// anyway and the answer carries no sources.
    pub fn answer_query(&self, query: &str) -> Result<Answer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let candidates = Retriever::new(self.store.as_ref()).retrieve(query, self.settings.k)?;
        let context = select_context(&candidates, self.settings.token_budget, self.tokenizer.as_ref());
        if context.is_empty() {
            warn!(candidates = candidates.len(), token_budget = self.settings.token_budget, "no context fits the token budget");
        }
        info!(
            candidates = candidates.len(),
            selected = context.len(),
            tokens = context.tokens_used,
            "assembled context"
        );

        let messages = build_prompt(query, &context.texts);
        let completion = self.completion.complete(&messages)?;
        Ok(assemble(completion, context.provenance))
    }
}
