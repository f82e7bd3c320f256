use docqa_core::budget::select_context;
use docqa_core::chunker::chunk;
use docqa_core::traits::Tokenizer;
use docqa_core::types::{Candidate, ChunkMetadata};
use proptest::prelude::*;

struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn token_count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

fn candidates(word_counts: &[usize]) -> Vec<Candidate> {
    word_counts
        .iter()
        .enumerate()
        .map(|(i, &n)| Candidate {
            id: i.to_string(),
            text: vec!["tok"; n].join(" "),
            metadata: ChunkMetadata::new("f.txt", i),
            distance: i as f32,
        })
        .collect()
}

fn separators() -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(vec!["\n\n".to_string(), "\n".to_string(), " ".to_string(), ".".to_string()], 0..=4)
}

proptest! {
    #[test]
    fn chunks_fit_and_reconstruct(
        text in "[a-z .\\n]{0,400}",
        max_size in 1usize..60,
        overlap_frac in 0.0f64..1.0,
        seps in separators(),
    ) {
        let overlap = ((max_size as f64) * overlap_frac) as usize;
        let overlap = overlap.min(max_size - 1);
        let chunks = chunk(&text, max_size, overlap, &seps);

        if text.is_empty() {
            prop_assert!(chunks.is_empty());
        }
        for c in &chunks {
            prop_assert!(!c.is_empty());
            prop_assert!(c.chars().count() <= max_size);
        }

        let mut rebuilt = String::new();
        let mut previous: Option<&String> = None;
        for c in &chunks {
            let skip = previous.map(|p| overlap.min(p.chars().count())).unwrap_or(0);
            if let Some(p) = previous {
                let tail: String = p.chars().skip(p.chars().count() - skip).collect();
                let head: String = c.chars().take(skip).collect();
                prop_assert_eq!(tail, head);
            }
            rebuilt.extend(c.chars().skip(skip));
            previous = Some(c);
        }
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn chunking_is_deterministic(text in "\\PC{0,200}", max_size in 2usize..40) {
        let seps = vec![" ".to_string()];
        prop_assert_eq!(chunk(&text, max_size, 1, &seps), chunk(&text, max_size, 1, &seps));
    }

    #[test]
    fn selection_is_a_prefix_within_budget(
        counts in prop::collection::vec(0usize..50, 0..12),
        budget in 0usize..300,
    ) {
        let cands = candidates(&counts);
        let ctx = select_context(&cands, budget, &WordTokenizer);

        prop_assert_eq!(ctx.texts.len(), ctx.provenance.len());
        prop_assert!(ctx.tokens_used <= budget);
        for (selected, original) in ctx.texts.iter().zip(&cands) {
            prop_assert_eq!(selected, &original.text);
        }
        let total: usize = counts[..ctx.len()].iter().sum();
        prop_assert_eq!(total, ctx.tokens_used);
        if ctx.len() < counts.len() {
            prop_assert!(total + counts[ctx.len()] > budget);
        }
    }

    #[test]
    fn selection_grows_with_the_budget(
        counts in prop::collection::vec(0usize..50, 0..12),
        budget in 0usize..300,
        extra in 0usize..300,
    ) {
        let cands = candidates(&counts);
        let smaller = select_context(&cands, budget, &WordTokenizer).len();
        let larger = select_context(&cands, budget + extra, &WordTokenizer).len();
        prop_assert!(smaller <= larger);
    }
}
