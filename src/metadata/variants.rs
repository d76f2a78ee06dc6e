//! Query-string variants for one catalog title.
//!
//! Variants are produced in a fixed order:
//! 1. the original-language title, when it differs from the display title;
//! 2. the display title, edition suffixes removed and connectives stripped;
//! 3. regional-spelling swaps of (2), one term at a time;
//! 4. the untouched display title, as a last resort.
//!
//! The list is deduplicated case-insensitively and capped.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::similarity::normalize;

/// Bidirectional regional spelling and terminology pairs.
const REGIONAL_PAIRS: &[(&str, &str)] = &[
    ("color", "colour"),
    ("theater", "theatre"),
    ("honor", "honour"),
    ("realize", "realise"),
    ("organize", "organise"),
    ("analyze", "analyse"),
    ("apologize", "apologise"),
    ("center", "centre"),
    ("meter", "metre"),
    ("defense", "defence"),
    ("offense", "offence"),
    ("traveling", "travelling"),
    ("jewelry", "jewellery"),
    ("catalog", "catalogue"),
    ("dialog", "dialogue"),
    ("practice", "practise"),
    ("license", "licence"),
    ("check", "cheque"),
    ("elevator", "lift"),
    ("truck", "lorry"),
    ("apartment", "flat"),
    ("cookie", "biscuit"),
    ("soccer", "football"),
    ("fall", "autumn"),
    ("diaper", "nappy"),
    ("flashlight", "torch"),
    ("garbage", "rubbish"),
    ("sneakers", "trainers"),
    ("vacation", "holiday"),
    ("hood", "bonnet"),
    ("trunk", "boot"),
    ("mail", "post"),
    ("zip code", "postcode"),
];

struct Swap {
    pattern: Regex,
    replacement: &'static str,
}

/// One whole-word, case-insensitive pattern per direction of every pair.
static SWAPS: LazyLock<Vec<Swap>> = LazyLock::new(|| {
    REGIONAL_PAIRS
        .iter()
        .flat_map(|&(a, b)| [(a, b), (b, a)])
        .filter_map(|(from, to)| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(from)))
                .ok()
                .map(|pattern| Swap {
                    pattern,
                    replacement: to,
                })
        })
        .collect()
});

static EDITION_SUFFIX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[(\[][^)\]]*?(director['’]?s cut|redux|restored|remastered)[^)\]]*?[)\]]|director['’]?s cut|\bredux\b|\[mv\]",
    )
    .ok()
});

static CONNECTIVES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\band\b|&").ok());

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove edition markers such as "(Director's Cut)", "Redux", or "[MV]".
pub fn clean_title(title: &str) -> String {
    match EDITION_SUFFIX.as_ref() {
        Some(re) => collapse_whitespace(&re.replace_all(title, " ")),
        None => collapse_whitespace(title),
    }
}

/// Remove filler connectives ("and", "&").
pub fn strip_connectives(title: &str) -> String {
    match CONNECTIVES.as_ref() {
        Some(re) => collapse_whitespace(&re.replace_all(title, " ")),
        None => collapse_whitespace(title),
    }
}

/// Render `replacement` in the letter case of `matched`.
fn match_case(matched: &str, replacement: &str) -> String {
    let has_letters = matched.chars().any(char::is_alphabetic);
    if has_letters && matched.chars().count() > 1 && !matched.chars().any(char::is_lowercase) {
        return replacement.to_uppercase();
    }
    match matched.chars().next() {
        Some(first) if first.is_uppercase() => {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        _ => replacement.to_string(),
    }
}

/// Titles with exactly one regional term swapped, at most `limit` of them.
pub fn regional_spellings(title: &str, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for swap in SWAPS.iter() {
        if out.len() >= limit {
            break;
        }
        if !swap.pattern.is_match(title) {
            continue;
        }
        let swapped = swap
            .pattern
            .replace_all(title, |caps: &Captures| match_case(&caps[0], swap.replacement))
            .into_owned();
        if !swapped.eq_ignore_ascii_case(title) && !out.contains(&swapped) {
            out.push(swapped);
        }
    }
    out
}

/// Ordered, deduplicated search strings for a catalog entry.
pub fn generate_variants(
    title: &str,
    original_title: Option<&str>,
    max_variants: usize,
    max_spelling_variants: usize,
) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    if let Some(original) = original_title.map(clean_title) {
        if normalize(&original) != normalize(title) {
            candidates.push(original);
        }
    }

    let base = strip_connectives(&clean_title(title));
    candidates.push(base.clone());
    candidates.extend(regional_spellings(&base, max_spelling_variants));
    candidates.push(collapse_whitespace(title));

    let mut seen: Vec<String> = Vec::new();
    let mut variants: Vec<String> = Vec::new();
    for candidate in candidates {
        let key = candidate.to_lowercase();
        if candidate.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        variants.push(candidate);
        if variants.len() >= max_variants {
            break;
        }
    }
    variants
}
