use regex::RegexBuilder;
use tracing::warn;

use crate::models::lorebooks::LorebookEntry;
use crate::models::settings::LoreSettings;

/// Flag letters accepted after the closing slash of a `/pattern/flags` key.
/// Matches the flag alphabet of the ecosystem the books come from; only
/// `i`, `m` and `s` change how a boolean match evaluates.
const RECOGNIZED_REGEX_FLAGS: &str = "dgimsuvy";

/// Decides whether a single trigger key is present in a scan window.
pub(crate) struct KeyMatcher<'a> {
    settings: &'a LoreSettings,
}

impl<'a> KeyMatcher<'a> {
    pub(crate) fn new(settings: &'a LoreSettings) -> Self {
        Self { settings }
    }

    /// Tests one (already substituted) key against a window.
    ///
    /// Keys shaped like `/pattern/flags` are evaluated as regular
    /// expressions against the raw window; anything else is a literal,
    /// honoring the entry's case and whole-word overrides. A key that is
    /// empty or whitespace-only never matches, and a key whose pattern
    /// fails to compile is logged and treated as a non-match rather than
    /// failing the scan.
    pub(crate) fn matches(&self, window: &str, key: &str, entry: &LorebookEntry) -> bool {
        if key.trim().is_empty() {
            return false;
        }

        if let Some((pattern, flags)) = parse_regex_key(key) {
            return Self::matches_regex(window, pattern, flags);
        }

        let case_sensitive = entry.is_case_sensitive(self.settings);
        if entry.matches_whole_words(self.settings) {
            Self::matches_whole_word(window, key, case_sensitive)
        } else if case_sensitive {
            window.contains(key)
        } else {
            window.to_lowercase().contains(&key.to_lowercase())
        }
    }

    fn matches_regex(window: &str, pattern: &str, flags: &str) -> bool {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build();

        match compiled {
            Ok(regex) => regex.is_match(window),
            Err(e) => {
                warn!("Skipping invalid regex key '/{pattern}/{flags}': {e}");
                false
            }
        }
    }

    fn matches_whole_word(window: &str, key: &str, case_sensitive: bool) -> bool {
        let pattern = format!(r"\b{}\b", regex::escape(key.trim()));
        match RegexBuilder::new(&pattern)
            .case_insensitive(!case_sensitive)
            .build()
        {
            Ok(regex) => regex.is_match(window),
            Err(e) => {
                warn!("Skipping unmatchable whole-word key '{key}': {e}");
                false
            }
        }
    }
}

/// Splits `/pattern/flags` into its parts, or returns `None` for literal
/// keys. The pattern must be non-empty and every trailing flag letter must
/// be recognized, otherwise the key is handled literally.
fn parse_regex_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix('/')?;
    let closing = rest.rfind('/')?;
    let (pattern, flags) = (&rest[..closing], &rest[closing + 1..]);
    if pattern.is_empty() || !flags.chars().all(|c| RECOGNIZED_REGEX_FLAGS.contains(c)) {
        return None;
    }
    Some((pattern, flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LorebookEntry {
        LorebookEntry::default()
    }

    fn settings(case_sensitive: bool, match_whole_words: bool) -> LoreSettings {
        LoreSettings {
            case_sensitive,
            match_whole_words,
            ..LoreSettings::default()
        }
    }

    #[test]
    fn literal_substring_is_case_insensitive_by_default() {
        let settings = settings(false, false);
        let matcher = KeyMatcher::new(&settings);
        assert!(matcher.matches("say hello", "Hello", &entry()));
    }

    #[test]
    fn literal_substring_respects_case_sensitivity() {
        let settings = settings(true, false);
        let matcher = KeyMatcher::new(&settings);
        assert!(!matcher.matches("say hello", "Hello", &entry()));
        assert!(matcher.matches("say Hello", "Hello", &entry()));
    }

    #[test]
    fn whole_word_rejects_embedded_occurrences() {
        let settings = settings(false, true);
        let matcher = KeyMatcher::new(&settings);
        assert!(!matcher.matches("concatenate", "cat", &entry()));
        assert!(matcher.matches("the cat sat", "cat", &entry()));
    }

    #[test]
    fn entry_overrides_beat_global_settings() {
        let settings = settings(false, true);
        let matcher = KeyMatcher::new(&settings);
        let entry = LorebookEntry {
            match_whole_words: Some(false),
            ..LorebookEntry::default()
        };
        assert!(matcher.matches("concatenate", "cat", &entry));

        let entry = LorebookEntry {
            case_sensitive: Some(true),
            match_whole_words: Some(false),
            ..LorebookEntry::default()
        };
        assert!(!matcher.matches("concatenate", "CAT", &entry));
    }

    #[test]
    fn regex_key_with_flags() {
        let settings = settings(false, true);
        let matcher = KeyMatcher::new(&settings);
        assert!(matcher.matches("hello world", "/^Hello/i", &entry()));
        assert!(!matcher.matches("say hello", "/^Hello/i", &entry()));
    }

    #[test]
    fn regex_key_without_flags_is_case_sensitive() {
        let settings = settings(false, false);
        let matcher = KeyMatcher::new(&settings);
        assert!(!matcher.matches("hello world", "/^Hello/", &entry()));
        assert!(matcher.matches("Hello world", "/^Hello/", &entry()));
    }

    #[test]
    fn invalid_regex_key_never_matches() {
        let settings = settings(false, false);
        let matcher = KeyMatcher::new(&settings);
        assert!(!matcher.matches("anything", "/[unclosed/", &entry()));
    }

    #[test]
    fn slash_key_with_unrecognized_flags_is_literal() {
        let settings = settings(false, false);
        let matcher = KeyMatcher::new(&settings);
        // "/x/z" is not a regex key ('z' is unrecognized), so it only
        // matches windows containing the literal text.
        assert!(!matcher.matches("x marks the spot", "/x/z", &entry()));
        assert!(matcher.matches("path /x/z here", "/x/z", &entry()));
    }

    #[test]
    fn empty_and_whitespace_keys_never_match() {
        let settings = settings(false, false);
        let matcher = KeyMatcher::new(&settings);
        assert!(!matcher.matches("anything", "", &entry()));
        assert!(!matcher.matches("anything", "   ", &entry()));
    }
}
