use anyhow::Result;
use docqa_core::traits::Tokenizer;
use tiktoken_rs::CoreBPE;

/// BPE token counter matching the chat model's encoding.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Falls back to `cl100k_base` for models tiktoken does not know.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(_) => tiktoken_rs::cl100k_base()?,
        };
        Ok(Self { bpe })
    }
}

impl Tokenizer for TiktokenCounter {
    fn token_count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_tokens_for_known_models() {
        let counter = TiktokenCounter::for_model("gpt-3.5-turbo").expect("counter");
        assert_eq!(counter.token_count(""), 0);
        let n = counter.token_count("How do I purify water in the wild?");
        assert!(n > 5 && n < 15, "{n}");
    }

    #[test]
    fn unknown_models_fall_back() {
        let counter = TiktokenCounter::for_model("my-local-model").expect("counter");
        assert!(counter.token_count("hello world") > 0);
    }

    #[test]
    fn longer_text_costs_more() {
        let counter = TiktokenCounter::for_model("gpt-3.5-turbo").expect("counter");
        assert!(counter.token_count("one two three four") < counter.token_count("one two three four five six seven eight"));
    }
}
