//! Text utilities shared across the engine.

use std::sync::OnceLock;

use regex::Regex;

fn char_macro() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\{\{char\}\}").expect("static pattern compiles"))
}

fn user_macro() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\{\{user\}\}").expect("static pattern compiles"))
}

/// Replaces `{{char}}` and `{{user}}` macros (case-insensitively) with the
/// active character and persona names.
///
/// Applied to trigger keys and entry content before any matching, token
/// counting, or fragment assembly takes place.
#[must_use]
pub fn substitute_params(text: &str, char_name: &str, user_name: &str) -> String {
    if !text.contains("{{") {
        return text.to_string();
    }
    let text = char_macro().replace_all(text, char_name);
    user_macro().replace_all(&text, user_name).into_owned()
}
