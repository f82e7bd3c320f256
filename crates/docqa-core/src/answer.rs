use std::fmt;

use crate::types::Provenance;

/// A completion together with the sources its context came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Provenance>,
}

impl Answer {
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// `Source pages: [12, 40]` when every source is a page, `Sources: [..]` otherwise.
    pub fn sources_line(&self) -> String {
        let label = if self.sources.iter().all(Provenance::is_page) { "Source pages" } else { "Sources" };
        let rendered: Vec<String> = self.sources.iter().map(ToString::to_string).collect();
        format!("{label}: [{}]", rendered.join(", "))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.text.trim_end(), self.sources_line())
    }
}

pub fn assemble(completion_text: impl Into<String>, provenance: Vec<Provenance>) -> Answer {
    Answer { text: completion_text.into(), sources: provenance }
}
