//! Priority chains of extraction strategies.
//!
//! A field that can be recovered several ways is described by an ordered
//! slice of `Extractor`s. `first_match` tries them in order and the first
//! `Some` wins, so each strategy stays small and testable on its own.

use crate::text::Outline;

/// A document prepared for extraction: its name, normalized text, and outline.
pub struct Document<'a> {
    pub name: &'a str,
    pub text: &'a str,
    pub outline: Outline<'a>,
}

impl<'a> Document<'a> {
    pub fn new(name: &'a str, text: &'a str) -> Self {
        Self {
            name,
            text,
            outline: Outline::new(text),
        }
    }
}

/// A fn-pointer strategy: no allocation, usable in `static` chains.
pub struct Extractor<T> {
    pub id: &'static str,
    pub extract: fn(&Document<'_>) -> Option<T>,
}

/// Run `chain` in order; return the id of the winning strategy and its value.
pub fn first_match<T>(chain: &[Extractor<T>], doc: &Document<'_>) -> Option<(&'static str, T)> {
    for extractor in chain {
        if let Some(value) = (extractor.extract)(doc) {
            tracing::debug!(document = doc.name, strategy = extractor.id, "extractor matched");
            return Some((extractor.id, value));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &Document<'_>) -> Option<u32> {
        None
    }

    fn line_count(doc: &Document<'_>) -> Option<u32> {
        Some(doc.outline.lines().len() as u32)
    }

    fn always_one(_: &Document<'_>) -> Option<u32> {
        Some(1)
    }

    static CHAIN: &[Extractor<u32>] = &[
        Extractor { id: "never", extract: never },
        Extractor { id: "lines", extract: line_count },
        Extractor { id: "one", extract: always_one },
    ];

    #[test]
    fn first_success_wins() {
        let doc = Document::new("x.md", "a\nb\nc");
        assert_eq!(first_match(CHAIN, &doc), Some(("lines", 3)));
    }

    #[test]
    fn empty_chain_is_none() {
        let doc = Document::new("x.md", "");
        assert_eq!(first_match::<u32>(&[], &doc), None);
    }
}
