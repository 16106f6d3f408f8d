//! Identifier case conversion used by the naming fixes.
//!
//! The two conversions are not inverses of each other: `to_camel_case(to_snake_case(x))` does
//! not always give back `x` (for example `"HTTPCode"` snake-cases to `"h_t_t_p_code"`).

/// Insert `_` before every ASCII uppercase letter except the first character, then lowercase.
///
/// Idempotent: the output contains no ASCII uppercase letters, so a second pass inserts nothing.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, ch) in name.chars().enumerate() {
        if idx > 0 && ch.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(ch);
    }
    out.to_lowercase()
}

/// Split on `_`, keep the first segment as-is and title-case the others.
pub fn to_camel_case(name: &str) -> String {
    let mut parts = name.split('_');
    let mut out = parts.next().unwrap_or_default().to_string();
    for part in parts {
        out.push_str(&title_case(part));
    }
    out
}

/// Uppercase letters that follow a non-letter (or start the word), lowercase the rest.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_word_start = true;
    for ch in word.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
