//! Canonical forms for titles and countries.
//!
//! All functions here are pure: the synonym and alias tables are built once
//! and read-only afterwards, so the same input always yields the same output.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Sentinel for countries we cannot resolve. Matching against it is still
/// deterministic; it just never collides with a real ISO-ish code.
pub const UNKNOWN_COUNTRY: &str = "??";

static COUNTRY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("deutschland", "DE"),
        ("germany", "DE"),
        ("deu", "DE"),
        ("de", "DE"),
        ("switzerland", "CH"),
        ("schweiz", "CH"),
        ("suisse", "CH"),
        ("svizzera", "CH"),
        ("ch", "CH"),
        ("austria", "AT"),
        ("österreich", "AT"),
        ("oesterreich", "AT"),
        ("at", "AT"),
        ("europe", "EU"),
        ("eu", "EU"),
        ("uk", "UK"),
        ("gb", "UK"),
        ("england", "UK"),
        ("united kingdom", "UK"),
        ("great britain", "UK"),
        ("usa", "US"),
        ("united states", "US"),
        ("america", "US"),
        ("us", "US"),
        ("spain", "ES"),
        ("españa", "ES"),
        ("es", "ES"),
        ("france", "FR"),
        ("fr", "FR"),
        ("italy", "IT"),
        ("italia", "IT"),
        ("it", "IT"),
        ("netherlands", "NL"),
        ("holland", "NL"),
        ("nl", "NL"),
        ("belgium", "BE"),
        ("be", "BE"),
        ("sweden", "SE"),
        ("se", "SE"),
    ])
});

// Longest keys first so "software eng" wins over "swe" etc.
static TITLE_SYNONYMS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    let mut table = vec![
        ("swe", "software engineer"),
        ("software eng", "software engineer"),
        ("sw eng", "software engineer"),
        ("frontend", "front end"),
        ("front-end", "front end"),
        ("backend", "back end"),
        ("back-end", "back end"),
        ("fullstack", "full stack"),
        ("full-stack", "full stack"),
        ("pm", "product manager"),
        ("prod mgr", "product manager"),
        ("product owner", "product manager"),
        ("ds", "data scientist"),
        ("mle", "machine learning engineer"),
        ("ml", "machine learning"),
        ("sre", "site reliability engineer"),
        ("sec eng", "security engineer"),
        ("infosec", "security"),
    ];
    table.sort_by_key(|(k, _)| std::cmp::Reverse(k.len()));
    table
});

/// Lowercase, fold diacritics, drop punctuation (keeping `-` and `/`),
/// collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut push = |c: char| {
        if c.is_alphanumeric() || c == '-' || c == '/' {
            out.push(c);
        } else {
            out.push(' ');
        }
    };
    for c in text.chars() {
        for lc in c.to_lowercase() {
            match fold_diacritic(lc) {
                Some(folded) => folded.chars().for_each(&mut push),
                None => push(lc),
            }
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_diacritic(c: char) -> Option<&'static str> {
    Some(match c {
        'ä' | 'à' | 'á' | 'â' | 'ã' | 'å' => "a",
        'ö' | 'ò' | 'ó' | 'ô' | 'õ' => "o",
        'ü' | 'ù' | 'ú' | 'û' => "u",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ç' => "c",
        'ñ' => "n",
        'ß' => "ss",
        _ => return None,
    })
}

/// Canonical title: cleaned text with synonyms expanded on token boundaries.
pub fn normalize_title(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let mut s = format!(" {} ", clean_text(text));
    for (from, to) in TITLE_SYNONYMS.iter() {
        let needle = format!(" {} ", from);
        if s.contains(&needle) {
            s = s.replace(&needle, &format!(" {} ", to));
        }
    }
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical country code. Unknown inputs map to [`UNKNOWN_COUNTRY`] rather
/// than failing.
pub fn normalize_country(text: &str) -> String {
    let t = text.trim().to_lowercase();
    if t.is_empty() {
        return UNKNOWN_COUNTRY.to_string();
    }
    if let Some(code) = COUNTRY_ALIASES.get(t.as_str()) {
        return (*code).to_string();
    }
    if t.len() == 2 && t.chars().all(|c| c.is_ascii_alphabetic()) {
        return t.to_uppercase();
    }
    // Multi-word inputs like "berlin, germany": any whole-word alias resolves.
    for token in t.split(|c: char| !c.is_alphanumeric()) {
        if let Some(code) = COUNTRY_ALIASES.get(token) {
            return (*code).to_string();
        }
    }
    UNKNOWN_COUNTRY.to_string()
}

/// Pulls a country code out of a free-form location string. The last
/// recognizable token wins ("Berlin, Germany" -> DE; "Remote - US" -> US).
pub fn extract_country_code(location: &str) -> String {
    let tokens: Vec<&str> = location
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    for token in tokens.iter().rev() {
        let t = token.to_lowercase();
        if let Some(code) = COUNTRY_ALIASES.get(t.as_str()) {
            return (*code).to_string();
        }
        if t.len() == 2 && t.chars().all(|c| c.is_ascii_alphabetic()) {
            return t.to_uppercase();
        }
    }
    UNKNOWN_COUNTRY.to_string()
}
