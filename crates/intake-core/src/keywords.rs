//! Whole-word keyword matching over free text.
//!
//! Text is lower-cased and every character other than a letter, digit or
//! hyphen becomes a space, so "I-130," and "i-130" compare equal and `ice`
//! never fires inside "notice". A keyword ending in `*` matches any word that
//! starts with the stem (`deport*` matches "deported" and "deportation").

/// Lower-case, collapse punctuation to single spaces, pad both ends.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '-' {
            out.push(c);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

/// Does already-normalized `haystack` contain `keyword`?
fn matches_normalized(haystack: &str, keyword: &str) -> bool {
    match keyword.strip_suffix('*') {
        Some(stem) => {
            let stem = normalize(stem);
            let stem = stem.trim_end();
            !stem.trim().is_empty() && haystack.contains(stem)
        }
        None => {
            let needle = normalize(keyword);
            !needle.trim().is_empty() && haystack.contains(&needle)
        }
    }
}

pub fn matches(text: &str, keyword: &str) -> bool {
    matches_normalized(&normalize(text), keyword)
}

pub fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    let haystack = normalize(text);
    keywords.iter().any(|k| matches_normalized(&haystack, k))
}

/// Keywords that occur in `text`, in the order given.
pub fn matched<'a>(text: &str, keywords: &[&'a str]) -> Vec<&'a str> {
    let haystack = normalize(text);
    keywords
        .iter()
        .copied()
        .filter(|k| matches_normalized(&haystack, k))
        .collect()
}
