use crate::models::lorebooks::{LorebookEntry, SelectiveLogic};

use super::key_matcher::KeyMatcher;

/// Resolves an entry's secondary-key requirement, assuming a primary match
/// is already established and `secondary_keys` is non-empty.
pub(crate) fn secondary_match(
    matcher: &KeyMatcher<'_>,
    window: &str,
    entry: &LorebookEntry,
    substituted_keys: &[String],
) -> bool {
    let mut has_any = false;
    let mut has_all = true;
    for key in substituted_keys {
        if matcher.matches(window, key, entry) {
            has_any = true;
        } else {
            has_all = false;
        }
    }

    match entry.selective_logic {
        SelectiveLogic::AndAny => has_any,
        SelectiveLogic::AndAll => has_all,
        SelectiveLogic::NotAll => !has_all,
        SelectiveLogic::NotAny => !has_any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::LoreSettings;

    fn entry_with(logic: SelectiveLogic) -> LorebookEntry {
        LorebookEntry {
            selective: true,
            selective_logic: logic,
            secondary_keys: vec!["a".into(), "b".into()],
            ..LorebookEntry::default()
        }
    }

    fn check(logic: SelectiveLogic, window: &str) -> bool {
        let settings = LoreSettings {
            match_whole_words: false,
            ..LoreSettings::default()
        };
        let matcher = KeyMatcher::new(&settings);
        let entry = entry_with(logic);
        let keys = entry.secondary_keys.clone();
        secondary_match(&matcher, window, &entry, &keys)
    }

    #[test]
    fn and_any_needs_one_secondary() {
        assert!(check(SelectiveLogic::AndAny, "only a here"));
        assert!(check(SelectiveLogic::AndAny, "a and b here"));
        assert!(!check(SelectiveLogic::AndAny, "nothing of note"));
    }

    #[test]
    fn and_all_needs_every_secondary() {
        assert!(check(SelectiveLogic::AndAll, "a and b here"));
        assert!(!check(SelectiveLogic::AndAll, "only one: (a)"));
    }

    #[test]
    fn not_all_blocks_only_a_full_set() {
        assert!(check(SelectiveLogic::NotAll, "only one: (a)"));
        assert!(check(SelectiveLogic::NotAll, "nothing of note"));
        assert!(!check(SelectiveLogic::NotAll, "a and b here"));
    }

    #[test]
    fn not_any_requires_no_secondary() {
        assert!(check(SelectiveLogic::NotAny, "nothing of note"));
        assert!(!check(SelectiveLogic::NotAny, "only one: (a)"));
    }
}
