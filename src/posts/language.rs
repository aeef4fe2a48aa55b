use tracing::debug;

/// Tags longer than this are treated as unknown.
pub const MAX_TAG_LEN: usize = 5;
const UNKNOWN: &str = "UNKNOWN";

/// Best-effort natural-language guesser for post bodies.
pub trait LanguageGuesser: Send + Sync {
    /// Returns a language code, or `None` when nothing could be guessed.
    fn guess(&self, text: &str) -> Option<String>;
}

/// Guesser backed by `whatlang`, answering with ISO 639-3 codes.
pub struct WhatlangGuesser {
    min_confidence: f64,
}

impl WhatlangGuesser {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }
}

impl LanguageGuesser for WhatlangGuesser {
    fn guess(&self, text: &str) -> Option<String> {
        let info = whatlang::detect(text)?;
        debug!(
            lang = info.lang().code(),
            confidence = info.confidence(),
            reliable = info.is_reliable(),
            "language guessed"
        );
        if info.confidence() < self.min_confidence {
            return None;
        }
        Some(info.lang().code().to_string())
    }
}

/// Collapses unknown, empty or oversized guesses to the empty tag.
pub fn normalize_tag(guess: Option<String>) -> String {
    match guess {
        Some(tag) if !tag.is_empty() && tag != UNKNOWN && tag.len() <= MAX_TAG_LEN => tag,
        _ => String::new(),
    }
}

/// Language tag to store for `body`. Never fails.
pub fn tag_for(guesser: &dyn LanguageGuesser, body: &str) -> String {
    normalize_tag(guesser.guess(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    impl LanguageGuesser for Fixed {
        fn guess(&self, _text: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn unknown_and_oversized_tags_become_empty() {
        assert_eq!(tag_for(&Fixed(None), "x"), "");
        assert_eq!(tag_for(&Fixed(Some("UNKNOWN")), "x"), "");
        assert_eq!(tag_for(&Fixed(Some("toolong")), "x"), "");
        assert_eq!(tag_for(&Fixed(Some("")), "x"), "");
    }

    #[test]
    fn short_tags_are_kept() {
        assert_eq!(tag_for(&Fixed(Some("en")), "x"), "en");
        assert_eq!(tag_for(&Fixed(Some("pt-BR")), "x"), "pt-BR");
    }

    #[test]
    fn whatlang_tags_clear_prose() {
        let guesser = WhatlangGuesser::new(0.0);
        let tag = tag_for(
            &guesser,
            "The quick brown fox jumps over the lazy dog while the farmer watches from the porch.",
        );
        assert_eq!(tag, "eng");
    }

    #[test]
    fn whatlang_gives_up_on_noise() {
        let guesser = WhatlangGuesser::new(0.5);
        assert_eq!(tag_for(&guesser, "1234 !!!"), "");
    }
}
