//! String cleaning shared by every agency: route long names, trip
//! headsigns and stop names all go through some ordered subset of these.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

/// Whole-word, case-insensitive `at`, keeping the characters around it.
pub fn clean_at(s: &str) -> String {
    static CLEAN_AT: OnceLock<Regex> = OnceLock::new();
    regex(&CLEAN_AT, r"(?i)(^|\W)(at)(\W|$)")
        .replace_all(s, "${1}/${3}")
        .into_owned()
}

/// Whole-word, case-insensitive `and`, keeping the characters around it.
pub fn clean_and(s: &str) -> String {
    static CLEAN_AND: OnceLock<Regex> = OnceLock::new();
    regex(&CLEAN_AND, r"(?i)(^|\W)(and)(\W|$)")
        .replace_all(s, "${1}&${3}")
        .into_owned()
}

pub fn clean_slashes(s: &str) -> String {
    static SLASHES: OnceLock<Regex> = OnceLock::new();
    regex(&SLASHES, r"\s*/\s*").replace_all(s, " / ").into_owned()
}

/// Removes "eastbound", "westbound"... prefixes and suffixes.
pub fn clean_bounds(s: &str) -> String {
    static BOUNDS: OnceLock<Regex> = OnceLock::new();
    regex(&BOUNDS, r"(?i)\b(east|west|north|south)bound\b")
        .replace_all(s, "")
        .into_owned()
}

/// Drops everything from " via " on, then keeps what follows the last " to ".
pub fn keep_to_and_remove_via(s: &str) -> String {
    static VIA: OnceLock<Regex> = OnceLock::new();
    static TO: OnceLock<Regex> = OnceLock::new();
    let s = regex(&VIA, r"(?i) via .*$").replace_all(s, "");
    regex(&TO, r"(?i)^.* to ").replace_all(&s, "").into_owned()
}

pub fn clean_numbers(s: &str) -> String {
    static ORDINAL_WORDS: OnceLock<Regex> = OnceLock::new();
    static ORDINAL_SUFFIX: OnceLock<Regex> = OnceLock::new();
    let s = regex(
        &ORDINAL_WORDS,
        r"(?i)\b(first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth)\b",
    )
    .replace_all(s, |caps: &Captures| {
        match caps[1].to_lowercase().as_str() {
            "first" => "1st",
            "second" => "2nd",
            "third" => "3rd",
            "fourth" => "4th",
            "fifth" => "5th",
            "sixth" => "6th",
            "seventh" => "7th",
            "eighth" => "8th",
            "ninth" => "9th",
            _ => "10th",
        }
        .to_string()
    });
    regex(&ORDINAL_SUFFIX, r"(?i)\b(\d+)(st|nd|rd|th)\b")
        .replace_all(&s, |caps: &Captures| format!("{}{}", &caps[1], caps[2].to_lowercase()))
        .into_owned()
}

const STREET_TYPES: &[(&str, &str)] = &[
    ("avenue", "Ave"),
    ("boulevard", "Blvd"),
    ("court", "Ct"),
    ("crescent", "Cres"),
    ("drive", "Dr"),
    ("highway", "Hwy"),
    ("lane", "Ln"),
    ("mount", "Mt"),
    ("parkway", "Pkwy"),
    ("place", "Pl"),
    ("point", "Pt"),
    ("road", "Rd"),
    ("square", "Sq"),
    ("street", "St"),
    ("terrace", "Terr"),
];

pub fn clean_street_types(s: &str) -> String {
    static STREET_TYPE: OnceLock<Regex> = OnceLock::new();
    let pattern = STREET_TYPE.get_or_init(|| {
        let words = STREET_TYPES.iter().map(|(word, _)| *word).collect::<Vec<_>>();
        Regex::new(&format!(r"(?i)\b({})\b", words.join("|"))).unwrap()
    });
    pattern
        .replace_all(s, |caps: &Captures| {
            let word = caps[1].to_lowercase();
            STREET_TYPES
                .iter()
                .find(|(long, _)| *long == word)
                .map(|(_, short)| short.to_string())
                .unwrap_or_else(|| caps[1].to_string())
        })
        .into_owned()
}

/// Final pass over any label: tidy spacing around parentheses and commas,
/// collapse whitespace, upper-case the first letter of each word.
pub fn clean_label(s: &str) -> String {
    static OPEN_PARENTHESIS: OnceLock<Regex> = OnceLock::new();
    static CLOSE_PARENTHESIS: OnceLock<Regex> = OnceLock::new();
    static BEFORE_COMMA: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();

    let s = regex(&OPEN_PARENTHESIS, r"\s*\(\s*").replace_all(s, " (");
    let s = regex(&CLOSE_PARENTHESIS, r"\s*\)\s*").replace_all(&s, ") ");
    let s = regex(&BEFORE_COMMA, r"\s+,").replace_all(&s, ",");
    let s = regex(&SPACES, r"\s+").replace_all(&s, " ");
    capitalize_words(s.trim())
}

fn capitalize_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = matches!(c, ' ' | '(' | '/' | '-' | '&');
    }
    out
}
