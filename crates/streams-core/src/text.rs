//! Track-title normalisation.
//!
//! Two interchangeable [`TitleCaser`] strategies are available. The smart
//! one follows English title-casing rules and needs the `smart-titles`
//! feature; the plain one capitalises every word.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Normalises a piece of text to title case.
pub trait TitleCaser {
    fn title_case(&self, text: &str) -> String;

    /// Apply the strategy to an optional value; `None` stays `None`.
    fn title_case_opt(&self, text: Option<&str>) -> Option<String> {
        text.map(|t| self.title_case(t))
    }
}

// ── PlainTitleCase ────────────────────────────────────────────────────────────

/// Upper-cases the first letter of each whitespace-separated word and
/// lower-cases the rest. Whitespace is preserved as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTitleCase;

impl TitleCaser for PlainTitleCase {
    fn title_case(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut at_word_start = true;
        for ch in text.chars() {
            if ch.is_whitespace() {
                at_word_start = true;
                out.push(ch);
            } else if at_word_start {
                at_word_start = false;
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
        }
        out
    }
}

// ── SmartTitleCase ────────────────────────────────────────────────────────────

/// English title casing: small words ("of", "the", "a") stay lower-case
/// unless they open or close the title, and mixed-case words such as
/// "iPhone" are left alone.
#[cfg(feature = "smart-titles")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartTitleCase;

#[cfg(feature = "smart-titles")]
impl TitleCaser for SmartTitleCase {
    fn title_case(&self, text: &str) -> String {
        titlecase::titlecase(text)
    }
}

// ── TitleCaseMode ─────────────────────────────────────────────────────────────

/// Which title-casing strategy to use, chosen at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TitleCaseMode {
    #[default]
    Smart,
    Plain,
}

impl TitleCaseMode {
    /// Build the strategy for this mode.
    ///
    /// `Smart` degrades to [`PlainTitleCase`] (with a warning) when the
    /// `smart-titles` feature is disabled.
    pub fn caser(self) -> Box<dyn TitleCaser> {
        match self {
            TitleCaseMode::Plain => Box::new(PlainTitleCase),
            TitleCaseMode::Smart => smart_or_plain(),
        }
    }
}

#[cfg(feature = "smart-titles")]
fn smart_or_plain() -> Box<dyn TitleCaser> {
    Box::new(SmartTitleCase)
}

#[cfg(not(feature = "smart-titles"))]
fn smart_or_plain() -> Box<dyn TitleCaser> {
    tracing::warn!("smart title casing not compiled in; falling back to plain title casing");
    Box::new(PlainTitleCase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_capitalises_each_word() {
        assert_eq!(PlainTitleCase.title_case("song a"), "Song A");
        assert_eq!(
            PlainTitleCase.title_case("the lord of the rings"),
            "The Lord Of The Rings"
        );
        assert_eq!(PlainTitleCase.title_case("SHOUTING TRACK"), "Shouting Track");
    }

    #[test]
    fn test_plain_preserves_whitespace_and_punctuation() {
        assert_eq!(PlainTitleCase.title_case("  two  spaces "), "  Two  Spaces ");
        assert_eq!(PlainTitleCase.title_case("(live) - remix"), "(live) - Remix");
        assert_eq!(PlainTitleCase.title_case(""), "");
    }

    #[test]
    fn test_plain_handles_non_ascii() {
        assert_eq!(PlainTitleCase.title_case("éclair über"), "Éclair Über");
    }

    #[test]
    fn test_plain_is_idempotent() {
        for input in ["song a", "ANOTHER one bites", "déjà vu", "x", "  a  b  "] {
            let once = PlainTitleCase.title_case(input);
            let twice = PlainTitleCase.title_case(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_null_stays_null() {
        assert_eq!(PlainTitleCase.title_case_opt(None), None);
        assert_eq!(TitleCaseMode::Smart.caser().title_case_opt(None), None);
        assert_eq!(
            PlainTitleCase.title_case_opt(Some("song a")),
            Some("Song A".to_string())
        );
    }

    #[cfg(feature = "smart-titles")]
    #[test]
    fn test_smart_keeps_small_words_lower() {
        assert_eq!(
            SmartTitleCase.title_case("the lord of the rings"),
            "The Lord of the Rings"
        );
    }

    #[cfg(feature = "smart-titles")]
    #[test]
    fn test_smart_is_idempotent_on_simple_titles() {
        let once = SmartTitleCase.title_case("a sample title");
        assert_eq!(once, "A Sample Title");
        assert_eq!(SmartTitleCase.title_case(&once), once);
    }

    #[test]
    fn test_mode_plain_builds_plain() {
        let caser = TitleCaseMode::Plain.caser();
        assert_eq!(caser.title_case("of mice"), "Of Mice");
    }

    #[test]
    fn test_default_mode_is_smart() {
        assert_eq!(TitleCaseMode::default(), TitleCaseMode::Smart);
    }
}
