//! Company name canonicalization
//!
//! Every comparison in the matcher runs on the canonical form produced here.
//! The legal-entity pass keeps a token that ends the name and deletes every
//! other occurrence of it:
//!
//! - `"Acme Inc"` keeps its trailing `inc`
//! - `"Inc Holdings"` loses the leading `inc`
//!
//! Deletion is plain substring removal, so `"incorporated"` becomes
//! `"orporated"`.

/// Legal-entity tokens in the order they are applied
pub const LEGAL_TOKENS: [&str; 5] = ["llc", "inc", "ltd", "s.p.a.", "s.r.l."];

/// Canonicalize a raw company name.
///
/// `None` and empty input map to an empty string. The legal-token pass is
/// repeated until the string stops changing, because deleting one token can
/// splice together another (`"linclc x"` -> `"llc x"`).
pub fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let mut current = raw.to_lowercase().trim().to_string();
    loop {
        let next = strip_legal_tokens(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Shorthand for names that are always present
pub fn normalize_str(raw: &str) -> String {
    normalize(Some(raw))
}

fn strip_legal_tokens(name: &str) -> String {
    let mut name = name.to_string();
    for token in LEGAL_TOKENS {
        if name.ends_with(token) {
            continue;
        }
        name = name.replace(token, "").trim().to_string();
    }
    name
}
